//! Migration scripts and their version markers.
//!
//! A script declares its version with a literal first line of the form
//! `--<integer>`, e.g. `--42`. Only the first line is ever inspected.

use std::fmt;

/// Prefix of the version marker line.
pub const VERSION_MARKER_PREFIX: &str = "--";

/// A script as listed by a [`ScriptSource`](crate::ScriptSource), before any
/// version has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawScript {
    /// Stable, unique name used as the ledger key
    pub name: String,
    /// Raw script text
    pub content: String,
}

impl RawScript {
    /// Create a raw script from a name and its content
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// The version declared by this script's marker line, if any
    pub fn declared_version(&self) -> Option<i64> {
        extract_declared_version(&self.content)
    }
}

/// Where a script's effective version came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionOrigin {
    /// Parsed from the script's `--N` marker line
    Declared,
    /// Assigned by the catalog because the script had no marker
    Assigned,
}

impl fmt::Display for VersionOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionOrigin::Declared => write!(f, "declared"),
            VersionOrigin::Assigned => write!(f, "assigned"),
        }
    }
}

/// A migration script with its effective version resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Stable, unique name used as the ledger key
    pub name: String,
    /// Raw script text, possibly starting with a version marker
    pub content: String,
    /// Effective version: declared, or assigned by the catalog
    pub version: i64,
    /// Whether `version` was declared or assigned
    pub origin: VersionOrigin,
}

impl Script {
    /// Create a script whose version was declared by its marker line
    pub fn declared(name: impl Into<String>, content: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            version,
            origin: VersionOrigin::Declared,
        }
    }

    /// Create a script whose version was assigned for this run
    pub fn assigned(name: impl Into<String>, content: impl Into<String>, version: i64) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            version,
            origin: VersionOrigin::Assigned,
        }
    }
}

/// Extract the declared version from the first line of `content`.
///
/// The first line matches iff it is exactly `--` followed by one or more
/// ASCII digits forming a positive integer. A leading byte order mark and a
/// trailing `\r` are ignored. Anything else yields `None`.
pub fn extract_declared_version(content: &str) -> Option<i64> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let first_line = content.lines().next()?;
    let first_line = first_line.strip_suffix('\r').unwrap_or(first_line);
    let digits = first_line.strip_prefix(VERSION_MARKER_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<i64>().ok().filter(|v| *v > 0)
}

/// Prepend a `--N` marker line to `content`, using the content's own line
/// terminator style.
pub fn with_version_marker(content: &str, version: i64) -> String {
    let newline = if content.contains("\r\n") { "\r\n" } else { "\n" };
    let (bom, body) = match content.strip_prefix('\u{feff}') {
        Some(rest) => ("\u{feff}", rest),
        None => ("", content),
    };
    format!("{bom}{VERSION_MARKER_PREFIX}{version}{newline}{body}")
}

#[cfg(test)]
#[path = "script_test.rs"]
mod tests;
