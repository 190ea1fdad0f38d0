//! dm-migrate - Migration engine for dbmigrator
//!
//! Loads versioned scripts into a [`ScriptCatalog`], checks them against the
//! persisted [`Ledger`], and applies every pending script exactly once, in
//! ascending version order, each inside its own transaction.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod ledger;
pub mod plan;
pub mod validator;

pub use catalog::ScriptCatalog;
pub use error::{MigrateError, MigrateResult};
pub use executor::{MigrationEvent, MigrationReport, Migrator, VersionChange};
pub use ledger::Ledger;
pub use plan::{PlanStep, PlannedAction};
pub use validator::validate;
