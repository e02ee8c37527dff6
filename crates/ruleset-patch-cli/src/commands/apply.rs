//! Apply command implementation.

use anyhow::Result;
use ruleset_patch_core::{PatchPlan, Patcher};

use crate::OutputFormat;

/// Runs the apply command.
///
/// Exits with status 1 on any patch failure after printing its diagnostic
/// (a JSON error object with `--format json`).
pub fn run(plan: PatchPlan, dry_run: bool, format: OutputFormat) -> Result<()> {
    tracing::info!(
        "Patching {} (remove {}, repair {}, insert after {})",
        plan.target.display(),
        plan.remove_rule,
        plan.reference_rule,
        plan.anchor_rule
    );

    let patcher = Patcher::new(plan).dry_run(dry_run);

    match patcher.run() {
        Ok(report) => {
            super::output::print_report(&report, format)?;
            if !dry_run && matches!(format, OutputFormat::Text) {
                println!("\nChanges applied successfully!");
            }
            Ok(())
        }
        Err(err) => {
            super::output::print_error(err, format)?;
            std::process::exit(1);
        }
    }
}
