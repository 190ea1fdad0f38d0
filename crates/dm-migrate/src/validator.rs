//! Consistency checks run before anything is executed.

use crate::error::{MigrateError, MigrateResult};
use crate::ledger::Ledger;
use dm_core::Script;
use std::collections::BTreeMap;

/// Validate `scripts` against `ledger`.
///
/// Duplicate versions are always rejected. Outside developer databases the
/// ledger must also show no gap: no pending script may be older than an
/// applied one.
pub fn validate(
    scripts: &[Script],
    ledger: &Ledger,
    is_developer_database: bool,
) -> MigrateResult<()> {
    check_duplicate_versions(scripts)?;
    if is_developer_database {
        log::debug!("Developer database: skipping sequential application check");
    } else {
        check_sequential_application(scripts, ledger)?;
    }
    Ok(())
}

/// Fail if two or more scripts share an effective version.
///
/// Reports the lowest conflicting version with every script that holds it.
pub fn check_duplicate_versions(scripts: &[Script]) -> MigrateResult<()> {
    let mut by_version: BTreeMap<i64, Vec<&str>> = BTreeMap::new();
    for script in scripts {
        by_version
            .entry(script.version)
            .or_default()
            .push(&script.name);
    }
    match by_version.into_iter().find(|(_, names)| names.len() > 1) {
        Some((version, mut names)) => {
            names.sort_unstable();
            Err(MigrateError::DuplicateVersion {
                version,
                scripts: names.into_iter().map(String::from).collect(),
            })
        }
        None => Ok(()),
    }
}

/// Fail if a pending script has a lower version than an applied one.
///
/// Walks scripts from newest to oldest; once an applied script has been seen,
/// every older script must be applied too.
pub fn check_sequential_application(scripts: &[Script], ledger: &Ledger) -> MigrateResult<()> {
    let mut newest_first: Vec<&Script> = scripts.iter().collect();
    newest_first.sort_by(|a, b| b.version.cmp(&a.version));

    let mut applied_above: Option<&Script> = None;
    for script in newest_first {
        if ledger.contains(&script.name) {
            applied_above = Some(script);
        } else if let Some(applied) = applied_above {
            return Err(MigrateError::OutOfOrder {
                script: script.name.clone(),
                version: script.version,
                applied_script: applied.name.clone(),
                applied_version: applied.version,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "validator_test.rs"]
mod tests;
