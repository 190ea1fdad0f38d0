//! SQL dialect abstraction

use dm_core::SqlDialectKind;
use sqlparser::ast::Statement;
use sqlparser::dialect::{Dialect, DuckDbDialect, GenericDialect, MsSqlDialect};
use sqlparser::parser::Parser;

use crate::error::{SqlError, SqlResult};

/// A sqlparser dialect selected by [`SqlDialectKind`].
#[derive(Debug)]
pub struct SqlDialect {
    kind: SqlDialectKind,
    parser_dialect: Box<dyn Dialect + Send + Sync>,
}

impl SqlDialect {
    /// Build the dialect selected in configuration
    pub fn new(kind: SqlDialectKind) -> Self {
        let parser_dialect: Box<dyn Dialect + Send + Sync> = match kind {
            SqlDialectKind::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialectKind::MsSql => Box::new(MsSqlDialect {}),
            SqlDialectKind::Generic => Box::new(GenericDialect {}),
        };
        Self {
            kind,
            parser_dialect,
        }
    }

    /// Which dialect this is
    pub fn kind(&self) -> SqlDialectKind {
        self.kind
    }

    /// Get the dialect name
    pub fn name(&self) -> &'static str {
        self.kind.as_str()
    }

    /// Parse SQL into AST statements
    pub fn parse(&self, sql: &str) -> SqlResult<Vec<Statement>> {
        Parser::parse_sql(self.parser_dialect.as_ref(), sql).map_err(|e| {
            let message = e.to_string();
            let (line, column) = parse_location_from_error(&message);
            SqlError::Syntax {
                message,
                line,
                column,
            }
        })
    }
}

impl Default for SqlDialect {
    fn default() -> Self {
        Self::new(SqlDialectKind::default())
    }
}

/// Parse line and column from sqlparser error message.
///
/// `ParserError` carries no structured location, so "Line: N, Column: M" is
/// extracted from the message text. Returns `(0, 0)` when absent.
pub(crate) fn parse_location_from_error(msg: &str) -> (usize, usize) {
    let Some(line_idx) = msg.find("Line: ") else {
        return (0, 0);
    };
    let line_start = line_idx + 6;
    let Some(comma_idx) = msg[line_start..].find(',') else {
        return (0, 0);
    };
    let Ok(line) = msg[line_start..line_start + comma_idx]
        .trim()
        .parse::<usize>()
    else {
        return (0, 0);
    };
    let Some(col_idx) = msg.find("Column: ") else {
        return (0, 0);
    };
    let col_start = col_idx + 8;
    let col_end = msg[col_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map(|i| col_start + i)
        .unwrap_or(msg.len());
    let Ok(column) = msg[col_start..col_end].trim().parse::<usize>() else {
        return (0, 0);
    };
    (line, column)
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
