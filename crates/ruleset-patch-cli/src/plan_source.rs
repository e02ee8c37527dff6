//! Where the patch plan comes from.
//!
//! A `--config` path wins. Otherwise a `ruleset-patch.toml` in the working
//! directory is used if present, and the built-in Cisco ASA IDS plan if not.

use anyhow::{Context, Result};
use ruleset_patch_core::PatchPlan;
use std::path::{Path, PathBuf};

/// Plan file looked up in the working directory; also written by `init`.
pub const PLAN_FILE_NAME: &str = "ruleset-patch.toml";

/// Origin of the plan used for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    /// Given with `--config`; must exist.
    Flag(PathBuf),
    /// `ruleset-patch.toml` found in the working directory.
    WorkingDir(PathBuf),
    /// No plan file; the compiled-in defaults apply.
    BuiltIn,
}

impl PlanSource {
    /// Picks the plan source for a run started in `cwd`.
    #[must_use]
    pub fn locate(cwd: &Path, flag: Option<&Path>) -> Self {
        if let Some(path) = flag {
            return Self::Flag(path.to_path_buf());
        }
        let candidate = cwd.join(PLAN_FILE_NAME);
        if candidate.is_file() {
            Self::WorkingDir(candidate)
        } else {
            Self::BuiltIn
        }
    }

    /// Loads the plan this source points at.
    pub fn load(&self) -> Result<PatchPlan> {
        match self {
            Self::BuiltIn => {
                tracing::debug!("No plan file, using built-in plan");
                Ok(PatchPlan::default())
            }
            Self::Flag(path) | Self::WorkingDir(path) => {
                tracing::debug!("Using plan: {}", path.display());
                PatchPlan::from_file(path)
                    .with_context(|| format!("Failed to load plan: {}", path.display()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn flag_wins_over_working_dir_plan() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PLAN_FILE_NAME), "").unwrap();
        let flag = tmp.path().join("other.toml");

        let source = PlanSource::locate(tmp.path(), Some(&flag));
        assert_eq!(source, PlanSource::Flag(flag));
    }

    #[test]
    fn working_dir_plan_is_picked_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(PLAN_FILE_NAME), "anchor_rule = \"100\"\n").unwrap();

        let source = PlanSource::locate(tmp.path(), None);
        assert_eq!(source, PlanSource::WorkingDir(tmp.path().join(PLAN_FILE_NAME)));
        assert_eq!(source.load().unwrap().anchor_rule.as_str(), "100");
    }

    #[test]
    fn empty_dir_falls_back_to_builtin() {
        let tmp = TempDir::new().unwrap();
        let source = PlanSource::locate(tmp.path(), None);
        assert_eq!(source, PlanSource::BuiltIn);
        assert_eq!(source.load().unwrap(), PatchPlan::default());
    }

    #[test]
    fn missing_flag_plan_fails_to_load() {
        let tmp = TempDir::new().unwrap();
        let source = PlanSource::locate(tmp.path(), Some(&tmp.path().join("absent.toml")));
        let err = source.load().unwrap_err();
        assert!(err.to_string().starts_with("Failed to load plan:"));
    }
}
