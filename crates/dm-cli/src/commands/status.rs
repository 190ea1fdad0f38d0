//! Status command implementation

use crate::cli::{GlobalArgs, StatusArgs, StatusOutput};
use crate::commands::common::{self, load_context, migration_failed};
use anyhow::Result;
use dm_migrate::{Migrator, PlannedAction};

/// Execute the status command
pub(crate) fn execute(args: &StatusArgs, global: &GlobalArgs) -> Result<()> {
    let ctx = load_context(global)?;
    let catalog = ctx.load_catalog(false)?;
    let db = ctx.open_database_for_read()?;
    let steps = Migrator::new(&db, ctx.is_developer_database)
        .plan(&catalog)
        .map_err(migration_failed)?;

    match args.output {
        StatusOutput::Json => common::print_plan_json(&steps)?,
        StatusOutput::Table => {
            common::print_plan_table(&steps);
            let pending = steps
                .iter()
                .filter(|s| s.action == PlannedAction::Apply)
                .count();
            let renumbered = steps
                .iter()
                .filter(|s| matches!(s.action, PlannedAction::UpdateVersion { .. }))
                .count();
            println!();
            println!(
                "{} script(s): {} pending, {} renumbered",
                steps.len(),
                pending,
                renumbered
            );
        }
    }
    Ok(())
}
