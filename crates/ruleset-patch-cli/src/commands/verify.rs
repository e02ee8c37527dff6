//! Verify command implementation.

use anyhow::Result;
use ruleset_patch_core::{PatchError, PatchPlan};

use crate::OutputFormat;

/// Runs the verify command.
pub fn run(plan: &PatchPlan, format: OutputFormat) -> Result<()> {
    match ruleset_patch_core::verify(&plan.target, plan) {
        Ok(report) => super::output::print_validation(&report, format),
        Err(err) => {
            if let (PatchError::Validation { report, .. }, OutputFormat::Text) = (&err, format) {
                super::output::print_validation(report, format)?;
            }
            super::output::print_error(err, format)?;
            std::process::exit(1);
        }
    }
}
