//! Subcommand implementations.

pub mod apply;
pub mod init;
pub mod list_rules;
pub mod output;
pub mod verify;

use anyhow::{Context, Result};
use ruleset_patch_core::PatchPlan;
use std::path::{Path, PathBuf};

use crate::plan_source::PlanSource;

/// Loads the plan for this run; `target` overrides its path.
pub fn load_plan(flag: Option<&Path>, target: Option<PathBuf>) -> Result<PatchPlan> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    let plan = PlanSource::locate(&cwd, flag).load()?;

    Ok(match target {
        Some(path) => plan.with_target(path),
        None => plan,
    })
}
