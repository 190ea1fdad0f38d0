//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};

/// dbmigrator - apply versioned SQL scripts exactly once, in order
#[derive(Parser, Debug)]
#[command(name = "dbm")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to project directory
    #[arg(short = 'p', long, global = true, default_value = ".")]
    pub project_dir: String,

    /// Override config file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Override target (database connection)
    #[arg(short, long, global = true)]
    pub target: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply pending scripts and update renumbered ledger entries
    Migrate(MigrateArgs),

    /// Show what a migration would do for every script
    Status(StatusArgs),

    /// Check script versions and SQL syntax without executing anything
    Validate(ValidateArgs),
}

/// Arguments for the migrate command
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Validate and print the plan without executing or writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Do not write an assigned version marker back into the script file
    #[arg(long)]
    pub no_persist_versions: bool,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: StatusOutput,
}

/// Status output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutput {
    /// Table format
    Table,
    /// JSON output
    Json,
}

/// Arguments for the validate command
#[derive(Args, Debug, Default)]
pub struct ValidateArgs {
    /// Split scripts without parsing batches with the configured dialect
    #[arg(long)]
    pub skip_sql_parse: bool,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
