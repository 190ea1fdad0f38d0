//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dm_core::{Config, DatabaseConfig, DirectoryScriptSource};
use dm_db::DuckDbBackend;
use dm_migrate::{MigrateError, PlanStep, ScriptCatalog};
use dm_sql::{BatchSplitter, SqlDialect};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Control flow only; the failure was already reported.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// Print a migration failure and turn it into a non-zero exit.
pub(crate) fn migration_failed(err: MigrateError) -> anyhow::Error {
    eprintln!("Error: {err}");
    ExitCode(1).into()
}

/// Everything a command needs to know about the project and its target.
#[derive(Debug)]
pub(crate) struct ProjectContext {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
    pub(crate) target: Option<String>,
    pub(crate) database: DatabaseConfig,
    pub(crate) is_developer_database: bool,
    pub(crate) verbose: bool,
}

/// Load configuration and resolve the target from global arguments
pub(crate) fn load_context(global: &GlobalArgs) -> Result<ProjectContext> {
    let root = PathBuf::from(&global.project_dir);
    let config = match &global.config {
        Some(path) => Config::load(Path::new(path)),
        None => Config::load_from_dir(&root),
    }
    .context("Failed to load configuration")?;

    let target = Config::resolve_target(global.target.as_deref());
    let database = config
        .get_database_config(target.as_deref())
        .context("Failed to resolve target")?;
    let is_developer_database = config
        .is_developer_database(target.as_deref())
        .context("Failed to resolve target")?;

    let ctx = ProjectContext {
        root,
        config,
        target,
        database,
        is_developer_database,
        verbose: global.verbose,
    };
    ctx.verbose_line(&format!(
        "Target: {} | database: {} (catalog {}) | developer database: {}",
        ctx.target.as_deref().unwrap_or("default"),
        ctx.database.path,
        ctx.database.catalog_name(),
        if ctx.is_developer_database { "yes" } else { "no" }
    ));
    Ok(ctx)
}

impl ProjectContext {
    pub(crate) fn verbose_line(&self, message: &str) {
        if self.verbose {
            eprintln!("[verbose] {message}");
        }
    }

    pub(crate) fn scripts_dir(&self) -> PathBuf {
        self.config.scripts_dir_absolute(&self.root)
    }

    fn database_path(&self) -> String {
        self.database.path_absolute(&self.root)
    }

    fn configure(&self, db: DuckDbBackend) -> DuckDbBackend {
        db.with_catalog(self.database.catalog_name())
            .with_ledger_table(&self.config.ledger_table)
    }

    /// Open the target database, creating the file if needed
    pub(crate) fn open_database(&self) -> Result<DuckDbBackend> {
        let path = self.database_path();
        log::debug!("Opening database at {path}");
        let db = DuckDbBackend::new(&path)
            .with_context(|| format!("Failed to open database: {path}"))?;
        Ok(self.configure(db))
    }

    /// Open the target database for reading only.
    ///
    /// A database file that does not exist yet holds no ledger, so an empty
    /// in-memory stand-in is used instead of creating the file.
    pub(crate) fn open_database_for_read(&self) -> Result<DuckDbBackend> {
        let path = self.database_path();
        if path != ":memory:" && !Path::new(&path).exists() {
            self.verbose_line(&format!("{path} does not exist yet; treating ledger as empty"));
            let db = DuckDbBackend::in_memory().context("Failed to open in-memory database")?;
            return Ok(self.configure(db));
        }
        self.open_database()
    }

    /// Load every script, optionally writing an assigned version back
    pub(crate) fn load_catalog(&self, persist_assigned_version: bool) -> Result<ScriptCatalog> {
        let source = DirectoryScriptSource::new(self.scripts_dir())
            .context("Failed to open scripts directory")?;
        let catalog =
            ScriptCatalog::load(&source, persist_assigned_version).map_err(migration_failed)?;
        self.verbose_line(&format!(
            "Loaded {} script(s) from {}",
            catalog.len(),
            source.root().display()
        ));
        Ok(catalog)
    }

    /// Batch splitter honoring `dialect` and `validate_sql`
    pub(crate) fn splitter(&self, parse_sql: bool) -> BatchSplitter {
        if parse_sql && self.config.validate_sql {
            BatchSplitter::with_dialect(SqlDialect::new(self.config.dialect))
        } else {
            BatchSplitter::new()
        }
    }
}

/// Print a plan as an aligned table.
pub(crate) fn print_plan_table(steps: &[PlanStep]) {
    if steps.is_empty() {
        println!("No scripts found.");
        return;
    }

    let version_width = steps
        .iter()
        .map(|s| s.version.to_string().len())
        .max()
        .unwrap_or(7)
        .max(7);
    let script_width = steps
        .iter()
        .map(|s| s.script.len())
        .max()
        .unwrap_or(6)
        .max(6);
    let origin_width = 8;

    println!(
        "{:>version_width$}  {:<script_width$}  {:<origin_width$}  STATUS",
        "VERSION", "SCRIPT", "ORIGIN"
    );
    println!(
        "{:->version_width$}  {:-<script_width$}  {:-<origin_width$}  {}",
        "",
        "",
        "",
        "-".repeat(24)
    );
    for step in steps {
        println!(
            "{:>version_width$}  {:<script_width$}  {:<origin_width$}  {}",
            step.version,
            step.script,
            step.origin.to_string(),
            step.action
        );
    }
}

/// Print a plan as pretty JSON
pub(crate) fn print_plan_json(steps: &[PlanStep]) -> Result<()> {
    let json = serde_json::to_string_pretty(steps).context("Failed to serialize to JSON")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
