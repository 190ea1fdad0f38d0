//! Database trait definitions
//!
//! All operations are synchronous: a migration run is a strictly sequential
//! pass, and database round-trips block the calling thread.

use crate::error::DbResult;
use dm_core::LedgerEntry;

/// SQL execution capability with explicit transaction control.
pub trait DatabaseCore {
    /// Execute one batch of SQL, which may hold several statements
    fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Begin a transaction
    fn begin(&self) -> DbResult<()>;

    /// Commit the current transaction
    fn commit(&self) -> DbResult<()>;

    /// Roll back the current transaction
    fn rollback(&self) -> DbResult<()>;

    /// Catalog name of the connected database
    fn catalog_name(&self) -> &str;

    /// Database type identifier for logging
    fn db_type(&self) -> &'static str;
}

/// Storage for the two-column ledger of applied scripts.
pub trait LedgerStore {
    /// Whether the ledger table exists
    fn ledger_exists(&self) -> DbResult<bool>;

    /// Create the ledger table if it does not exist
    fn ensure_ledger(&self) -> DbResult<()>;

    /// Read every ledger row
    fn read_ledger(&self) -> DbResult<Vec<LedgerEntry>>;

    /// Record a newly applied script
    fn insert_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()>;

    /// Change the version of an existing entry, matched by script name
    fn update_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()>;
}

/// Everything the migration engine needs from a database.
pub trait Database: DatabaseCore + LedgerStore {}

impl<T: DatabaseCore + LedgerStore + ?Sized> Database for T {}
