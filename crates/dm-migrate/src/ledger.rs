//! Ledger reader and writer.
//!
//! [`Ledger`] is a snapshot of the ledger table taken once per run, keyed by
//! script name. Writes go straight to the [`LedgerStore`].

use crate::error::{MigrateError, MigrateResult};
use dm_core::{LedgerEntry, Script};
use dm_db::{DbResult, LedgerStore};
use std::collections::BTreeMap;

/// Snapshot of applied scripts: script name to applied version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    entries: BTreeMap<String, i64>,
}

impl Ledger {
    /// Build a ledger from rows, rejecting repeated script names
    pub fn from_entries(entries: impl IntoIterator<Item = LedgerEntry>) -> MigrateResult<Self> {
        let mut map = BTreeMap::new();
        for entry in entries {
            if map.insert(entry.script_name.clone(), entry.version).is_some() {
                return Err(MigrateError::DuplicateLedgerEntry {
                    script: entry.script_name,
                });
            }
        }
        Ok(Self { entries: map })
    }

    /// Read the ledger without creating it; a missing table is an empty ledger
    pub fn load_existing<L: LedgerStore + ?Sized>(store: &L) -> MigrateResult<Self> {
        if !store.ledger_exists().map_err(MigrateError::Ledger)? {
            return Ok(Self::default());
        }
        Self::from_entries(store.read_ledger().map_err(MigrateError::Ledger)?)
    }

    /// Applied version of `script_name`, if it has been applied
    pub fn version_of(&self, script_name: &str) -> Option<i64> {
        self.entries.get(script_name).copied()
    }

    /// Whether `script_name` has a ledger entry
    pub fn contains(&self, script_name: &str) -> bool {
        self.entries.contains_key(script_name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in script-name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(name, version)| (name.as_str(), *version))
    }
}

/// Insert a ledger entry for a newly applied script
pub fn record_applied<L: LedgerStore + ?Sized>(store: &L, script: &Script) -> DbResult<()> {
    store.insert_ledger_entry(&LedgerEntry::new(script.name.clone(), script.version))
}

/// Set the ledger version of an already-applied script to its current version
pub fn record_version_change<L: LedgerStore + ?Sized>(store: &L, script: &Script) -> DbResult<()> {
    store.update_ledger_entry(&LedgerEntry::new(script.name.clone(), script.version))
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
