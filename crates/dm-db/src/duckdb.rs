//! DuckDB database backend implementation

use crate::error::{DbError, DbResult};
use crate::traits::{DatabaseCore, LedgerStore};
use dm_core::LedgerEntry;
use duckdb::Connection;
use std::path::Path;

/// Default ledger table name.
pub const DEFAULT_LEDGER_TABLE: &str = "DbVersions";

/// DuckDB database backend
///
/// Single-threaded: a migration run owns the connection for its duration.
pub struct DuckDbBackend {
    conn: Connection,
    catalog: String,
    ledger_table: String,
}

impl DuckDbBackend {
    /// Create a new in-memory DuckDB connection
    pub fn in_memory() -> DbResult<Self> {
        let conn =
            Connection::open_in_memory().map_err(|e| DbError::ConnectionError(e.to_string()))?;
        Ok(Self::from_connection(conn, "memory"))
    }

    /// Create a new DuckDB connection from a file path
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| DbError::ConnectionError(format!("{e}: {}", path.display())))?;
        let catalog = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("main")
            .to_string();
        Ok(Self::from_connection(conn, &catalog))
    }

    /// Create from path string (handles :memory: special case)
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    fn from_connection(conn: Connection, catalog: &str) -> Self {
        Self {
            conn,
            catalog: catalog.to_string(),
            ledger_table: quote_table_name(DEFAULT_LEDGER_TABLE),
        }
    }

    /// Override the catalog name reported to the migration engine
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = catalog.into();
        self
    }

    /// Use `table` (optionally schema-qualified) as the ledger table
    pub fn with_ledger_table(mut self, table: &str) -> Self {
        self.ledger_table = quote_table_name(table);
        self
    }

    /// Count rows returned by `sql`
    pub fn query_count(&self, sql: &str) -> DbResult<usize> {
        let count: i64 = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM ({sql})"), [], |row| {
                row.get(0)
            })
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count as usize)
    }

    /// Check if a table or view exists
    pub fn relation_exists(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM information_schema.tables WHERE lower(table_schema) = lower(?) AND lower(table_name) = lower(?)",
                duckdb::params![schema, table],
                |row| row.get(0),
            )
            .map_err(|e| DbError::ExecutionError(e.to_string()))?;
        Ok(count > 0)
    }

    fn ledger_schema(&self) -> Option<&str> {
        self.ledger_table
            .split_once("\".\"")
            .map(|(schema, _)| schema.trim_start_matches('"'))
    }

    /// Unquoted `[schema.]table` form of the ledger table name
    fn ledger_table_unquoted(&self) -> String {
        self.ledger_table.replace('"', "")
    }
}

/// Quote each dot-separated part of a table name as an identifier.
fn quote_table_name(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

impl DatabaseCore for DuckDbBackend {
    fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.conn.execute_batch(sql).map_err(DbError::from)
    }

    fn begin(&self) -> DbResult<()> {
        self.conn
            .execute_batch("BEGIN TRANSACTION")
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    fn commit(&self) -> DbResult<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    fn rollback(&self) -> DbResult<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| DbError::TransactionError(e.to_string()))
    }

    fn catalog_name(&self) -> &str {
        &self.catalog
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

impl LedgerStore for DuckDbBackend {
    fn ledger_exists(&self) -> DbResult<bool> {
        self.relation_exists(&self.ledger_table_unquoted())
            .map_err(|e| DbError::LedgerError(format!("failed to look up ledger table: {e}")))
    }

    fn ensure_ledger(&self) -> DbResult<()> {
        if let Some(schema) = self.ledger_schema() {
            self.conn
                .execute_batch(&format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""))
                .map_err(|e| DbError::LedgerError(format!("failed to create ledger schema: {e}")))?;
        }
        self.conn
            .execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                     \"ScriptName\" VARCHAR NOT NULL PRIMARY KEY,
                     \"DbVersion\"  BIGINT  NOT NULL
                 )",
                self.ledger_table
            ))
            .map_err(|e| DbError::LedgerError(format!("failed to create ledger table: {e}")))
    }

    fn read_ledger(&self) -> DbResult<Vec<LedgerEntry>> {
        let sql = format!(
            "SELECT \"ScriptName\", \"DbVersion\" FROM {} ORDER BY \"DbVersion\", \"ScriptName\"",
            self.ledger_table
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .map_err(|e| DbError::LedgerError(format!("failed to read ledger: {e}")))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(LedgerEntry::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(|e| DbError::LedgerError(format!("failed to read ledger: {e}")))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|e| DbError::LedgerError(format!("failed to read ledger row: {e}")))
    }

    fn insert_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()> {
        self.conn
            .execute(
                &format!(
                    "INSERT INTO {} (\"ScriptName\", \"DbVersion\") VALUES (?, ?)",
                    self.ledger_table
                ),
                duckdb::params![entry.script_name, entry.version],
            )
            .map_err(|e| {
                DbError::LedgerError(format!("failed to record {}: {e}", entry.script_name))
            })?;
        Ok(())
    }

    fn update_ledger_entry(&self, entry: &LedgerEntry) -> DbResult<()> {
        let updated = self
            .conn
            .execute(
                &format!(
                    "UPDATE {} SET \"DbVersion\" = ? WHERE \"ScriptName\" = ?",
                    self.ledger_table
                ),
                duckdb::params![entry.version, entry.script_name],
            )
            .map_err(|e| {
                DbError::LedgerError(format!("failed to update {}: {e}", entry.script_name))
            })?;
        if updated == 0 {
            return Err(DbError::LedgerError(format!(
                "no ledger entry for {}",
                entry.script_name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
