//! dm-sql - SQL layer for dbmigrator
//!
//! This crate splits migration scripts into independently executable batches
//! on `GO` separator lines and, optionally, validates each batch with a
//! sqlparser-rs dialect before it reaches the database.

pub mod dialect;
pub mod error;
pub mod splitter;

pub use dialect::SqlDialect;
pub use error::{SqlError, SqlResult};
pub use splitter::{split_batches, Batch, BatchSplitter};
