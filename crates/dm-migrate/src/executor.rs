//! Migration executor.
//!
//! Applies scripts in ascending version order. For each script:
//! - no ledger entry: split into batches, execute them in one transaction
//!   together with the ledger insert, and commit;
//! - ledger entry with another version: update the ledger version only;
//! - ledger entry with the same version: nothing.
//!
//! The first failure aborts the run. Scripts committed before it stay
//! committed.

use crate::catalog::ScriptCatalog;
use crate::error::{MigrateError, MigrateResult};
use crate::ledger::{self, Ledger};
use crate::plan::{action_for, plan_steps, PlanStep, PlannedAction};
use crate::validator::validate;
use dm_core::Script;
use dm_db::{Database, Transaction};
use dm_sql::{Batch, BatchSplitter};
use std::fmt;

/// Progress notification emitted as each script is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationEvent<'a> {
    /// Script executed and recorded
    Executed { script: &'a Script, batches: usize },
    /// Ledger version of an applied script updated
    VersionUpdated { script: &'a Script, from: i64 },
}

impl fmt::Display for MigrationEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationEvent::Executed { script, .. } => write!(f, "{} executed.", script.name),
            MigrationEvent::VersionUpdated { script, .. } => {
                write!(f, "{} DB version updated.", script.name)
            }
        }
    }
}

/// A ledger-only version change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub script: String,
    pub from: i64,
    pub to: i64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Scripts executed, in order
    pub executed: Vec<String>,
    /// Scripts whose ledger version changed
    pub version_updates: Vec<VersionChange>,
    /// Scripts already recorded at their current version
    pub up_to_date: usize,
}

impl MigrationReport {
    /// Whether the run changed nothing
    pub fn is_noop(&self) -> bool {
        self.executed.is_empty() && self.version_updates.is_empty()
    }
}

/// Applies a [`ScriptCatalog`] to a database.
pub struct Migrator<'a, D: Database + ?Sized> {
    db: &'a D,
    splitter: BatchSplitter,
    is_developer_database: bool,
}

impl<'a, D: Database + ?Sized> Migrator<'a, D> {
    /// Create a migrator with a tokenizer-only splitter
    pub fn new(db: &'a D, is_developer_database: bool) -> Self {
        Self {
            db,
            splitter: BatchSplitter::new(),
            is_developer_database,
        }
    }

    /// Use `splitter` (e.g. one with dialect validation) for batch splitting
    pub fn with_splitter(mut self, splitter: BatchSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    /// Whether relaxed ordering rules apply
    pub fn is_developer_database(&self) -> bool {
        self.is_developer_database
    }

    /// Validate and compute the plan without writing anything
    pub fn plan(&self, catalog: &ScriptCatalog) -> MigrateResult<Vec<PlanStep>> {
        let ledger = Ledger::load_existing(self.db)?;
        validate(catalog.scripts(), &ledger, self.is_developer_database)?;
        Ok(plan_steps(catalog.scripts(), &ledger))
    }

    /// Validate, then split every pending script to surface syntax errors.
    ///
    /// Returns the number of pending scripts checked. Nothing is executed.
    pub fn check(&self, catalog: &ScriptCatalog) -> MigrateResult<usize> {
        let ledger = Ledger::load_existing(self.db)?;
        validate(catalog.scripts(), &ledger, self.is_developer_database)?;
        let mut checked = 0;
        for script in catalog.scripts() {
            if action_for(script, &ledger) == PlannedAction::Apply {
                self.split(script)?;
                checked += 1;
            }
        }
        Ok(checked)
    }

    /// Run the migration, reporting progress to `on_event` as it happens
    pub fn run<F>(&self, catalog: &ScriptCatalog, mut on_event: F) -> MigrateResult<MigrationReport>
    where
        F: FnMut(&MigrationEvent<'_>),
    {
        let ledger = Ledger::load_existing(self.db)?;
        validate(catalog.scripts(), &ledger, self.is_developer_database)?;
        self.db.ensure_ledger().map_err(MigrateError::Ledger)?;
        log::info!(
            "Migrating {} ({}): {} script(s), {} ledger entries",
            self.db.catalog_name(),
            self.db.db_type(),
            catalog.len(),
            ledger.len()
        );

        let mut report = MigrationReport::default();
        for script in catalog.scripts() {
            match action_for(script, &ledger) {
                PlannedAction::Apply => {
                    let batches = self.apply(script)?;
                    report.executed.push(script.name.clone());
                    on_event(&MigrationEvent::Executed { script, batches });
                }
                PlannedAction::UpdateVersion { from } => {
                    ledger::record_version_change(self.db, script).map_err(MigrateError::Ledger)?;
                    log::info!(
                        "{}: ledger version {} -> {}",
                        script.name,
                        from,
                        script.version
                    );
                    report.version_updates.push(VersionChange {
                        script: script.name.clone(),
                        from,
                        to: script.version,
                    });
                    on_event(&MigrationEvent::VersionUpdated { script, from });
                }
                PlannedAction::UpToDate => report.up_to_date += 1,
            }
        }
        Ok(report)
    }

    fn split(&self, script: &Script) -> MigrateResult<Vec<Batch>> {
        self.splitter
            .split(&script.content)
            .map_err(|source| MigrateError::Split {
                script: script.name.clone(),
                version: script.version,
                source,
            })
    }

    /// Execute one script and record it, atomically. Returns the batch count.
    fn apply(&self, script: &Script) -> MigrateResult<usize> {
        let batches = self.split(script)?;
        let tx = Transaction::begin(self.db).map_err(|source| MigrateError::Transaction {
            script: script.name.clone(),
            source,
        })?;

        for (idx, batch) in batches.iter().enumerate() {
            log::debug!(
                "{}: batch {}/{} (line {})",
                script.name,
                idx + 1,
                batches.len(),
                batch.line
            );
            tx.db()
                .execute_batch(&batch.sql)
                .map_err(|source| MigrateError::Execution {
                    script: script.name.clone(),
                    version: script.version,
                    batch: idx + 1,
                    line: batch.line,
                    source,
                })?;
        }

        ledger::record_applied(tx.db(), script).map_err(MigrateError::Ledger)?;
        tx.commit().map_err(|source| MigrateError::Transaction {
            script: script.name.clone(),
            source,
        })?;
        Ok(batches.len())
    }
}

#[cfg(test)]
#[path = "executor_test.rs"]
mod tests;
