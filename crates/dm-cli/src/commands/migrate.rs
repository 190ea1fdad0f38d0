//! Migrate command implementation

use crate::cli::{GlobalArgs, MigrateArgs};
use crate::commands::common::{self, load_context, migration_failed};
use anyhow::Result;
use dm_migrate::{MigrationReport, Migrator};

/// Execute the migrate command
pub(crate) fn execute(args: &MigrateArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let persist = ctx.config.persist_assigned_versions && !args.no_persist_versions && !args.dry_run;
    let catalog = ctx.load_catalog(persist)?;

    if args.dry_run {
        let db = ctx.open_database_for_read()?;
        let migrator = Migrator::new(&db, ctx.is_developer_database).with_splitter(ctx.splitter(true));
        migrator.check(&catalog).map_err(migration_failed)?;
        let steps = migrator.plan(&catalog).map_err(migration_failed)?;
        println!("Dry run: nothing will be executed\n");
        common::print_plan_table(&steps);
        return Ok(());
    }

    let db = ctx.open_database()?;
    let migrator = Migrator::new(&db, ctx.is_developer_database).with_splitter(ctx.splitter(true));
    let report = migrator
        .run(&catalog, |event| println!("{event}"))
        .map_err(migration_failed)?;

    print_summary(&report, ctx.verbose);
    Ok(())
}

fn print_summary(report: &MigrationReport, verbose: bool) {
    if report.is_noop() {
        println!("Database is up to date.");
        return;
    }
    if verbose {
        for change in &report.version_updates {
            eprintln!(
                "[verbose] {}: v{} -> v{}",
                change.script, change.from, change.to
            );
        }
    }
    println!(
        "\n{} executed, {} DB version(s) updated, {} up to date",
        report.executed.len(),
        report.version_updates.len(),
        report.up_to_date
    );
}

#[cfg(test)]
#[path = "migrate_test.rs"]
mod tests;
