//! Ledger entry type.

use std::fmt;

/// A persisted record of an applied script.
///
/// Created on first successful application of a script; only `version`
/// changes afterwards. Entries are never deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Name of the applied script
    pub script_name: String,
    /// Version active in the ledger at last write
    pub version: i64,
}

impl LedgerEntry {
    /// Create a new ledger entry
    pub fn new(script_name: impl Into<String>, version: i64) -> Self {
        Self {
            script_name: script_name.into(),
            version,
        }
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ v{}", self.script_name, self.version)
    }
}
