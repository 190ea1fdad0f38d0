//! Error types for dm-sql

use thiserror::Error;

/// SQL splitting and validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// Malformed SQL (S001)
    #[error("[S001] SQL syntax error at line {line}, column {column}: {message}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    /// Split produced something other than a sequence of batches (S002)
    #[error("[S002] Unexpected SQL fragment at byte range {start}..{end}")]
    UnexpectedFragment { start: usize, end: usize },
}

impl SqlError {
    /// 1-based line/column of a syntax error
    pub fn location(&self) -> Option<(usize, usize)> {
        match self {
            SqlError::Syntax { line, column, .. } => Some((*line, *column)),
            SqlError::UnexpectedFragment { .. } => None,
        }
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
