//! Script sources.
//!
//! A [`ScriptSource`] lists every migration script available to a run and
//! can write an updated script body back to its backing storage.

use crate::error::{CoreError, CoreResult};
use crate::script::RawScript;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Repository of migration scripts.
pub trait ScriptSource {
    /// List all scripts, ordered by name
    fn list(&self) -> CoreResult<Vec<RawScript>>;

    /// Replace the stored content of script `name`
    fn persist(&self, name: &str, content: &str) -> CoreResult<()>;

    /// Human-readable description for logging
    fn describe(&self) -> String;
}

/// Scripts discovered recursively as `*.sql` files under a directory.
///
/// A script's name is its path relative to the root, with `/` separators.
#[derive(Debug, Clone)]
pub struct DirectoryScriptSource {
    root: PathBuf,
}

impl DirectoryScriptSource {
    /// Create a source rooted at `root`, which must be an existing directory
    pub fn new(root: impl Into<PathBuf>) -> CoreResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CoreError::ScriptsDirNotFound {
                path: root.display().to_string(),
            });
        }
        Ok(Self { root })
    }

    /// Root directory of this source
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> PathBuf {
        name.split('/')
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    fn script_name(&self, path: &Path) -> CoreResult<String> {
        let relative = path
            .strip_prefix(&self.root)
            .map_err(|_| CoreError::InvalidScriptName {
                path: path.display().to_string(),
                reason: "path is outside the scripts directory".to_string(),
            })?;
        let mut parts = Vec::new();
        for component in relative.components() {
            let part = component
                .as_os_str()
                .to_str()
                .ok_or_else(|| CoreError::InvalidScriptName {
                    path: path.display().to_string(),
                    reason: "path is not valid UTF-8".to_string(),
                })?;
            parts.push(part);
        }
        Ok(parts.join("/"))
    }

    fn discover(&self, dir: &Path, scripts: &mut Vec<RawScript>) -> CoreResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::IoWithPath {
                path: dir.display().to_string(),
                source: e,
            })?;
            let path = entry.path();
            if path.is_dir() {
                self.discover(&path, scripts)?;
                continue;
            }
            if !path
                .extension()
                .is_some_and(|e| e.eq_ignore_ascii_case("sql"))
            {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| CoreError::IoWithPath {
                path: path.display().to_string(),
                source: e,
            })?;
            scripts.push(RawScript::new(self.script_name(&path)?, content));
        }
        Ok(())
    }
}

impl ScriptSource for DirectoryScriptSource {
    fn list(&self) -> CoreResult<Vec<RawScript>> {
        let mut scripts = Vec::new();
        self.discover(&self.root, &mut scripts)?;
        scripts.sort_by(|a, b| a.name.cmp(&b.name));
        log::debug!(
            "Discovered {} script(s) under {}",
            scripts.len(),
            self.root.display()
        );
        Ok(scripts)
    }

    fn persist(&self, name: &str, content: &str) -> CoreResult<()> {
        let path = self.path_for(name);
        if !path.is_file() {
            return Err(CoreError::ScriptNotFound {
                name: name.to_string(),
            });
        }
        std::fs::write(&path, content).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Scripts held in memory, keyed by name.
///
/// Useful for scripts embedded into a binary and for tests.
#[derive(Debug, Default)]
pub struct MemoryScriptSource {
    scripts: RefCell<BTreeMap<String, String>>,
}

impl MemoryScriptSource {
    /// Create an empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a script
    pub fn with_script(self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.scripts.borrow_mut().insert(name.into(), content.into());
        self
    }

    /// Current content of script `name`
    pub fn content(&self, name: &str) -> Option<String> {
        self.scripts.borrow().get(name).cloned()
    }
}

impl<N, C> FromIterator<(N, C)> for MemoryScriptSource
where
    N: Into<String>,
    C: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, C)>>(iter: I) -> Self {
        let scripts = iter
            .into_iter()
            .map(|(name, content)| (name.into(), content.into()))
            .collect();
        Self {
            scripts: RefCell::new(scripts),
        }
    }
}

impl ScriptSource for MemoryScriptSource {
    fn list(&self) -> CoreResult<Vec<RawScript>> {
        Ok(self
            .scripts
            .borrow()
            .iter()
            .map(|(name, content)| RawScript::new(name.clone(), content.clone()))
            .collect())
    }

    fn persist(&self, name: &str, content: &str) -> CoreResult<()> {
        let mut scripts = self.scripts.borrow_mut();
        let slot = scripts
            .get_mut(name)
            .ok_or_else(|| CoreError::ScriptNotFound {
                name: name.to_string(),
            })?;
        *slot = content.to_string();
        Ok(())
    }

    fn describe(&self) -> String {
        format!("<memory: {} script(s)>", self.scripts.borrow().len())
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
