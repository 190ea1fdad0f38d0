//! Error types for dm-migrate

use dm_core::CoreError;
use dm_db::DbError;
use dm_sql::SqlError;
use thiserror::Error;

/// Migration engine errors. All of them abort the run.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Two or more scripts share a version (MG001)
    #[error("[MG001] Duplicate script version {version}: {}", .scripts.join(", "))]
    DuplicateVersion { version: i64, scripts: Vec<String> },

    /// A pending script is older than an applied one on a shared database (MG002)
    #[error(
        "[MG002] Not a developer database: scripts must be applied strictly in order, \
         but {script} (v{version}) is pending while {applied_script} (v{applied_version}) is already applied"
    )]
    OutOfOrder {
        script: String,
        version: i64,
        applied_script: String,
        applied_version: i64,
    },

    /// More than one script lacks a version marker (MG003)
    #[error("[MG003] More than one script lacks a version marker: {}", .scripts.join(", "))]
    AmbiguousVersion { scripts: Vec<String> },

    /// Script could not be split into batches (MG004)
    #[error("[MG004] Script {script} (v{version}) is not valid SQL: {source}")]
    Split {
        script: String,
        version: i64,
        source: SqlError,
    },

    /// A batch was rejected by the database (MG005)
    #[error("[MG005] Script {script} (v{version}) failed at batch {batch} (line {line}): {source}")]
    Execution {
        script: String,
        version: i64,
        batch: usize,
        line: usize,
        source: DbError,
    },

    /// The ledger holds the same script name more than once (MG006)
    #[error("[MG006] Ledger lists script {script} more than once")]
    DuplicateLedgerEntry { script: String },

    /// Ledger read or write failed (MG007)
    #[error("[MG007] Ledger operation failed: {0}")]
    Ledger(#[source] DbError),

    /// Transaction could not be opened or committed (MG008)
    #[error("[MG008] Transaction for script {script} failed: {source}")]
    Transaction { script: String, source: DbError },

    /// Scripts could not be loaded (MG009)
    #[error("[MG009] Failed to load scripts: {0}")]
    Source(#[from] CoreError),

    /// No version is left above the highest declared one (MG010)
    #[error("[MG010] Cannot assign a version to {script}: highest declared version {max_version} is the largest allowed")]
    VersionOverflow { script: String, max_version: i64 },
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;
