//! Error types for dm-core

use thiserror::Error;

/// Core error type for dbmigrator
#[derive(Error, Debug)]
pub enum CoreError {
    /// E001: Configuration file not found
    #[error("[E001] Config file not found: {path}")]
    ConfigNotFound { path: String },

    /// E002: Invalid configuration value
    #[error("[E002] Invalid config: {message}")]
    ConfigInvalid { message: String },

    /// E003: Scripts directory not found
    #[error("[E003] Scripts directory not found: {path}")]
    ScriptsDirNotFound { path: String },

    /// E004: Script path cannot be turned into a stable script name
    #[error("[E004] Invalid script name for '{path}': {reason}")]
    InvalidScriptName { path: String, reason: String },

    /// E005: Script not known to the source
    #[error("[E005] Script not found: {name}")]
    ScriptNotFound { name: String },

    /// E006: IO error with file path context
    #[error("[E006] Failed to access '{path}': {source}")]
    IoWithPath {
        path: String,
        source: std::io::Error,
    },

    /// YAML parsing error
    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),
}

/// Result type alias for CoreError
pub type CoreResult<T> = Result<T, CoreError>;
