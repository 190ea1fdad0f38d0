//! Validate command implementation

use crate::cli::{GlobalArgs, ValidateArgs};
use crate::commands::common::{load_context, migration_failed};
use anyhow::Result;
use dm_migrate::Migrator;

/// Execute the validate command
pub(crate) fn execute(args: &ValidateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let catalog = ctx.load_catalog(false)?;
    let db = ctx.open_database_for_read()?;

    let splitter = ctx.splitter(!args.skip_sql_parse);
    match splitter.dialect_name() {
        Some(dialect) => ctx.verbose_line(&format!("Parsing batches as {dialect}")),
        None => ctx.verbose_line("Splitting batches without SQL parsing"),
    }

    let checked = Migrator::new(&db, ctx.is_developer_database)
        .with_splitter(splitter)
        .check(&catalog)
        .map_err(migration_failed)?;

    println!(
        "{} script(s) valid; {} pending script(s) checked",
        catalog.len(),
        checked
    );
    Ok(())
}
