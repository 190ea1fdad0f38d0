//! Script catalog.
//!
//! Loads every script from a [`ScriptSource`], resolves each script's
//! effective version, and orders the scripts by it. At most one script may
//! lack a version marker; it receives `max(declared) + 1`.

use crate::error::{MigrateError, MigrateResult};
use dm_core::{with_version_marker, RawScript, Script, ScriptSource};

/// All scripts for one run, in ascending effective version order.
#[derive(Debug, Clone, Default)]
pub struct ScriptCatalog {
    scripts: Vec<Script>,
}

impl ScriptCatalog {
    /// Load scripts from `source`.
    ///
    /// When `persist_assigned_version` is set, an assigned version is also
    /// written back into the script as a `--N` marker. That write is
    /// best-effort: a failure is logged and the run continues with the
    /// in-memory assignment.
    pub fn load<S: ScriptSource + ?Sized>(
        source: &S,
        persist_assigned_version: bool,
    ) -> MigrateResult<Self> {
        let raw = source.list()?;
        log::debug!("Loaded {} script(s) from {}", raw.len(), source.describe());

        let (versioned, unversioned): (Vec<(RawScript, Option<i64>)>, Vec<_>) = raw
            .into_iter()
            .map(|script| {
                let version = script.declared_version();
                (script, version)
            })
            .partition(|(_, version)| version.is_some());

        if unversioned.len() > 1 {
            return Err(MigrateError::AmbiguousVersion {
                scripts: unversioned.into_iter().map(|(s, _)| s.name).collect(),
            });
        }

        let max_declared = versioned
            .iter()
            .filter_map(|(_, version)| *version)
            .max()
            .unwrap_or(0);

        let mut scripts: Vec<Script> = versioned
            .into_iter()
            .filter_map(|(raw, version)| {
                version.map(|v| Script::declared(raw.name, raw.content, v))
            })
            .collect();

        if let Some((raw, _)) = unversioned.into_iter().next() {
            let next_version = max_declared.checked_add(1).ok_or_else(|| {
                MigrateError::VersionOverflow {
                    script: raw.name.clone(),
                    max_version: max_declared,
                }
            })?;
            log::info!("Assigning version {} to {}", next_version, raw.name);
            if persist_assigned_version {
                let marked = with_version_marker(&raw.content, next_version);
                if let Err(e) = source.persist(&raw.name, &marked) {
                    log::warn!(
                        "Could not write version marker into {}: {}. Continuing with in-memory version {}",
                        raw.name,
                        e,
                        next_version
                    );
                }
            }
            scripts.push(Script::assigned(raw.name, raw.content, next_version));
        }

        Ok(Self::from_scripts(scripts))
    }

    /// Build a catalog from already-resolved scripts
    pub fn from_scripts(mut scripts: Vec<Script>) -> Self {
        scripts.sort_by(|a, b| a.version.cmp(&b.version).then_with(|| a.name.cmp(&b.name)));
        Self { scripts }
    }

    /// Scripts in ascending effective version order
    pub fn scripts(&self) -> &[Script] {
        &self.scripts
    }

    /// Look up a script by name
    pub fn get(&self, name: &str) -> Option<&Script> {
        self.scripts.iter().find(|s| s.name == name)
    }

    /// Number of scripts
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether the catalog holds no scripts
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}

#[cfg(test)]
#[path = "catalog_test.rs"]
mod tests;
