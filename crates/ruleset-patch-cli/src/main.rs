//! ruleset-patch CLI tool.
//!
//! Usage:
//! ```bash
//! ruleset-patch [apply] [--dry-run] [PATH]
//! ruleset-patch verify [PATH]
//! ruleset-patch list-rules
//! ruleset-patch init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod plan_source;

/// Patches a Wazuh/OSSEC rule XML file: removes an obsolete rule, repairs the
/// reference to it, inserts new rules, and validates the result
#[derive(Parser)]
#[command(name = "ruleset-patch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to plan file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Back up, patch, and validate the ruleset (default)
    Apply {
        /// Ruleset file (default: the plan's target)
        path: Option<PathBuf>,

        /// Compute the edits without backing up or writing
        #[arg(long)]
        dry_run: bool,
    },

    /// Only check that a ruleset is already patched
    Verify {
        /// Ruleset file (default: the plan's target)
        path: Option<PathBuf>,
    },

    /// List the rules the plan removes, repairs, anchors on, and inserts
    ListRules,

    /// Write a default plan file
    Init {
        /// Overwrite existing plan
        #[arg(long)]
        force: bool,
    },
}

/// Output format for run reports.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let command = cli.command.unwrap_or(Commands::Apply {
        path: None,
        dry_run: false,
    });

    match command {
        Commands::Apply { path, dry_run } => {
            let plan = commands::load_plan(cli.config.as_deref(), path)?;
            commands::apply::run(plan, dry_run, cli.format)
        }
        Commands::Verify { path } => {
            let plan = commands::load_plan(cli.config.as_deref(), path)?;
            commands::verify::run(&plan, cli.format)
        }
        Commands::ListRules => {
            let plan = commands::load_plan(cli.config.as_deref(), None)?;
            commands::list_rules::run(&plan, cli.format)
        }
        Commands::Init { force } => commands::init::run(force),
    }
}
