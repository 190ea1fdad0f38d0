//! dm-core - Core library for dbmigrator
//!
//! This crate provides the shared types used across all dbmigrator
//! components: migration scripts and their version markers, ledger entries,
//! the script source abstraction, and configuration parsing.

pub mod config;
pub mod error;
pub mod ledger;
pub mod script;
pub mod source;

pub use config::{Config, DatabaseConfig, SqlDialectKind, TargetConfig};
pub use error::{CoreError, CoreResult};
pub use ledger::LedgerEntry;
pub use script::{extract_declared_version, with_version_marker, RawScript, Script, VersionOrigin};
pub use source::{DirectoryScriptSource, MemoryScriptSource, ScriptSource};
