//! Per-script actions computed from the catalog and the ledger.

use crate::ledger::Ledger;
use dm_core::{Script, VersionOrigin};
use serde::Serialize;
use std::fmt;

/// What a run will do with one script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlannedAction {
    /// No ledger entry: execute the script and record it
    Apply,
    /// Recorded under another version: update the ledger only
    UpdateVersion { from: i64 },
    /// Recorded under the current version: nothing to do
    UpToDate,
}

impl fmt::Display for PlannedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannedAction::Apply => write!(f, "pending"),
            PlannedAction::UpdateVersion { from } => write!(f, "renumber from v{from}"),
            PlannedAction::UpToDate => write!(f, "applied"),
        }
    }
}

/// One script's planned action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub script: String,
    pub version: i64,
    #[serde(serialize_with = "serialize_origin")]
    pub origin: VersionOrigin,
    #[serde(flatten)]
    pub action: PlannedAction,
}

fn serialize_origin<S: serde::Serializer>(origin: &VersionOrigin, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&origin.to_string())
}

/// Action for a single script given the ledger
pub fn action_for(script: &Script, ledger: &Ledger) -> PlannedAction {
    match ledger.version_of(&script.name) {
        None => PlannedAction::Apply,
        Some(applied) if applied != script.version => {
            PlannedAction::UpdateVersion { from: applied }
        }
        Some(_) => PlannedAction::UpToDate,
    }
}

/// Plan every script, in the order given
pub fn plan_steps(scripts: &[Script], ledger: &Ledger) -> Vec<PlanStep> {
    scripts
        .iter()
        .map(|script| PlanStep {
            script: script.name.clone(),
            version: script.version,
            origin: script.origin,
            action: action_for(script, ledger),
        })
        .collect()
}

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;
