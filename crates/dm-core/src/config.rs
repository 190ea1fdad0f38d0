//! Configuration types and parsing for dbmigrator.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable consulted when no `--target` flag is given.
pub const TARGET_ENV_VAR: &str = "DBM_TARGET";

/// Main project configuration from dbmigrator.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Directory containing migration scripts, relative to the project root
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Database connection configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Case-insensitive catalog name fragments that mark a developer database
    #[serde(default = "default_developer_markers")]
    pub developer_markers: Vec<String>,

    /// Explicit developer-database flag, overriding `developer_markers`
    #[serde(default)]
    pub developer_database: Option<bool>,

    /// Ledger table name, optionally schema-qualified
    #[serde(default = "default_ledger_table")]
    pub ledger_table: String,

    /// SQL dialect used to validate batches
    #[serde(default)]
    pub dialect: SqlDialectKind,

    /// Parse every batch with the dialect before executing it (opt-in)
    #[serde(default)]
    pub validate_sql: bool,

    /// Write the assigned `--N` marker back into an unversioned script
    #[serde(default = "default_true")]
    pub persist_assigned_versions: bool,

    /// Named target configurations (e.g., local, staging, prod)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Target-specific configuration overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database configuration override
    #[serde(default)]
    pub database: Option<DatabaseConfig>,

    /// Developer-database flag override
    #[serde(default)]
    pub developer_database: Option<bool>,
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or :memory:)
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Catalog name; defaults to the file stem of `path`
    #[serde(default)]
    pub catalog: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            catalog: None,
        }
    }
}

impl DatabaseConfig {
    /// Catalog name used for developer-database detection
    pub fn catalog_name(&self) -> String {
        if let Some(catalog) = &self.catalog {
            return catalog.clone();
        }
        if self.path == ":memory:" {
            return "memory".to_string();
        }
        Path::new(&self.path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&self.path)
            .to_string()
    }

    /// Database path resolved against a project root (`:memory:` untouched)
    pub fn path_absolute(&self, root: &Path) -> String {
        if self.path == ":memory:" || Path::new(&self.path).is_absolute() {
            self.path.clone()
        } else {
            root.join(&self.path).display().to_string()
        }
    }
}

/// SQL dialect used for batch validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialectKind {
    /// DuckDB SQL dialect
    #[default]
    DuckDb,
    /// Microsoft SQL Server (T-SQL) dialect
    MsSql,
    /// Dialect-neutral ANSI-ish parsing
    Generic,
}

impl SqlDialectKind {
    /// Configuration name of the dialect
    pub fn as_str(self) -> &'static str {
        match self {
            SqlDialectKind::DuckDb => "duckdb",
            SqlDialectKind::MsSql => "mssql",
            SqlDialectKind::Generic => "generic",
        }
    }
}

impl std::fmt::Display for SqlDialectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_scripts_dir() -> String {
    "scripts".to_string()
}

fn default_db_path() -> String {
    "dbmigrator.duckdb".to_string()
}

fn default_developer_markers() -> Vec<String> {
    vec!["local".to_string()]
}

fn default_ledger_table() -> String {
    "DbVersions".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            database: DatabaseConfig::default(),
            developer_markers: default_developer_markers(),
            developer_database: None,
            ledger_table: default_ledger_table(),
            dialect: SqlDialectKind::default(),
            validate_sql: false,
            persist_assigned_versions: true,
            targets: HashMap::new(),
        }
    }
}

impl Config {
    /// Load configuration from a file path
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a project directory
    /// Looks for dbmigrator.yml or dbmigrator.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        let yml_path = dir.join("dbmigrator.yml");
        let yaml_path = dir.join("dbmigrator.yaml");

        if yml_path.exists() {
            Self::load(&yml_path)
        } else if yaml_path.exists() {
            Self::load(&yaml_path)
        } else {
            Err(CoreError::ConfigNotFound {
                path: yml_path.display().to_string(),
            })
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> CoreResult<()> {
        if self.scripts_dir.trim().is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "scripts_dir cannot be empty".to_string(),
            });
        }

        if !is_valid_table_name(&self.ledger_table) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "ledger_table '{}' must be an identifier, optionally schema-qualified",
                    self.ledger_table
                ),
            });
        }

        if self.developer_markers.iter().any(|m| m.is_empty()) {
            return Err(CoreError::ConfigInvalid {
                message: "developer_markers cannot contain empty strings".to_string(),
            });
        }

        Ok(())
    }

    /// Absolute scripts directory relative to a project root
    pub fn scripts_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.scripts_dir)
    }

    /// Get target configuration by name
    pub fn get_target(&self, name: &str) -> CoreResult<&TargetConfig> {
        self.targets.get(name).ok_or_else(|| {
            let mut available: Vec<&str> = self.targets.keys().map(|k| k.as_str()).collect();
            available.sort_unstable();
            CoreError::ConfigInvalid {
                message: format!(
                    "Target '{}' not found. Available targets: {}",
                    name,
                    available.join(", ")
                ),
            }
        })
    }

    /// Get database configuration, optionally applying target overrides
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => Ok(self
                .get_target(name)?
                .database
                .clone()
                .unwrap_or_else(|| self.database.clone())),
            None => Ok(self.database.clone()),
        }
    }

    /// Whether the resolved target database is a developer database.
    ///
    /// Priority: target override > `developer_database` > catalog name
    /// containing one of `developer_markers` (case-insensitive).
    pub fn is_developer_database(&self, target: Option<&str>) -> CoreResult<bool> {
        if let Some(name) = target {
            if let Some(flag) = self.get_target(name)?.developer_database {
                return Ok(flag);
            }
        }
        if let Some(flag) = self.developer_database {
            return Ok(flag);
        }
        let catalog = self.get_database_config(target)?.catalog_name();
        Ok(is_developer_catalog(&catalog, &self.developer_markers))
    }

    /// Resolve target from CLI flag or DBM_TARGET environment variable
    ///
    /// Priority: CLI flag > DBM_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var(TARGET_ENV_VAR).ok())
            .filter(|t| !t.is_empty())
    }
}

/// Whether `catalog` contains any of `markers`, ignoring case
pub fn is_developer_catalog(catalog: &str, markers: &[String]) -> bool {
    let catalog = catalog.to_lowercase();
    markers
        .iter()
        .any(|marker| catalog.contains(&marker.to_lowercase()))
}

fn is_valid_table_name(name: &str) -> bool {
    let parts: Vec<&str> = name.split('.').collect();
    parts.len() <= 2
        && parts.iter().all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
