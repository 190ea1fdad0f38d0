//! dm-db - Database abstraction layer for dbmigrator
//!
//! This crate provides the execution, transaction and ledger storage traits
//! the migration engine runs against, a scoped [`Transaction`] guard, and a
//! DuckDB implementation.

pub mod duckdb;
pub mod error;
pub mod traits;
pub mod transaction;

pub use duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, DatabaseCore, LedgerStore};
pub use transaction::Transaction;
