//! Orchestrates one patch run: preflight, backup, passes, persist, validate.

use miette::Diagnostic;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::buffer::LineBuffer;
use crate::fs_safe;
use crate::passes::{self, Insertion, PassError, ReferenceRepair, Removal};
use crate::plan::PatchPlan;
use crate::validate::{self, ValidationReport};

/// Errors that end a patch run.
#[derive(Debug, Error, Diagnostic)]
pub enum PatchError {
    /// The target file does not exist.
    #[error("The file {path} was not found")]
    #[diagnostic(
        code(ruleset_patch::missing_file),
        help("pass the ruleset path explicitly or set `target` in the plan file")
    )]
    MissingFile {
        /// Configured target path.
        path: PathBuf,
    },

    /// The backup copy could not be made; nothing was changed.
    #[error("Failed to back up {path}: {source}")]
    #[diagnostic(code(ruleset_patch::backup))]
    Backup {
        /// Target path being copied.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the target failed.
    #[error("I/O error during {context}: {source}")]
    #[diagnostic(code(ruleset_patch::io))]
    Io {
        /// What was being done.
        context: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// An edit pass failed; the target on disk is unchanged.
    #[error("{0}")]
    #[diagnostic(
        code(ruleset_patch::pass),
        help("the file on disk was not modified")
    )]
    Pass(#[from] PassError),

    /// The written file failed its checks. It stays on disk as written.
    #[error("Validation failed for {path}: {report}")]
    #[diagnostic(
        code(ruleset_patch::validation),
        help("check the file manually; the original is kept next to it with a .bak suffix")
    )]
    Validation {
        /// Checked file.
        path: PathBuf,
        /// Per-check results.
        report: ValidationReport,
    },
}

impl PatchError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Buffer produced by the three passes, with what each pass did.
#[derive(Debug, Clone)]
pub struct Edited {
    /// Final lines.
    pub buffer: LineBuffer,
    /// Block removal result.
    pub removal: Removal,
    /// Cross-reference repair result.
    pub reference: ReferenceRepair,
    /// Payload insertion result.
    pub insertion: Insertion,
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize)]
pub struct PatchReport {
    /// Patched file.
    pub target: PathBuf,
    /// Backup copy, absent on dry runs.
    pub backup: Option<PathBuf>,
    /// True if nothing was written.
    pub dry_run: bool,
    /// Block removal result.
    pub removal: Removal,
    /// Cross-reference repair result.
    pub reference: ReferenceRepair,
    /// Payload insertion result.
    pub insertion: Insertion,
    /// Post-write checks, absent on dry runs.
    pub validation: Option<ValidationReport>,
}

/// Runs the remove, repair and insert passes over a loaded buffer.
///
/// # Errors
///
/// Returns [`PassError`] if the removed block or the anchor is unterminated,
/// or the anchor is missing.
pub fn apply_passes(loaded: &LineBuffer, plan: &PatchPlan) -> Result<Edited, PassError> {
    let (removed, removal) = passes::remove_block(loaded, &plan.remove_rule)?;
    if removal.found() {
        info!(
            "Removed rule {} ({} lines from line {})",
            plan.remove_rule,
            removal.lines_removed,
            removal.start_line.unwrap_or_default()
        );
    } else {
        info!("Rule {} not present, nothing to remove", plan.remove_rule);
    }

    let (repaired, reference) = passes::repair_reference(
        &removed,
        &plan.reference_rule,
        &plan.reference_tag,
        &plan.remove_rule,
    );
    match &reference {
        ReferenceRepair::Repaired { line, after, .. } => {
            info!(
                "Dropped {} from <{}> of rule {} at line {}: {}",
                plan.remove_rule,
                plan.reference_tag,
                plan.reference_rule,
                line,
                after.trim()
            );
        }
        ReferenceRepair::TokenAbsent { line } => debug!(
            "<{}> at line {} does not mention {}",
            plan.reference_tag, line, plan.remove_rule
        ),
        ReferenceRepair::TagNotFound => warn!(
            "No <{}> found after rule {}",
            plan.reference_tag, plan.reference_rule
        ),
        ReferenceRepair::RuleNotFound => {
            warn!("Rule {} not found, reference left as is", plan.reference_rule);
        }
    }

    let (buffer, insertion) = passes::insert_after(&repaired, &plan.anchor_rule, &plan.payload)?;
    info!(
        "Added {} rule(s) after rule {} (line {})",
        insertion.rules, plan.anchor_rule, insertion.after_line
    );

    Ok(Edited {
        buffer,
        removal,
        reference,
        insertion,
    })
}

/// Reads `path` and checks it against the plan's removal and payload.
///
/// # Errors
///
/// Returns [`PatchError::MissingFile`], [`PatchError::Io`], or
/// [`PatchError::Validation`] if a check fails.
pub fn verify(path: &Path, plan: &PatchPlan) -> Result<ValidationReport, PatchError> {
    preflight(path)?;
    let content = std::fs::read_to_string(path)
        .map_err(|e| PatchError::io(format!("reading {}", path.display()), e))?;

    let report = validate::validate(&content, &plan.remove_rule, &plan.payload);
    log_checks(&report);

    if report.passed() {
        Ok(report)
    } else {
        Err(PatchError::Validation {
            path: path.to_path_buf(),
            report,
        })
    }
}

fn preflight(path: &Path) -> Result<(), PatchError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PatchError::MissingFile {
            path: path.to_path_buf(),
        })
    }
}

fn log_checks(report: &ValidationReport) {
    if report.removal_passed() {
        info!("Rule {} was successfully removed", report.removed_rule);
    } else {
        error!(
            "Rule {} still present at line(s) {:?}",
            report.removed_rule, report.leftover_lines
        );
    }
    if report.insertion_passed() {
        info!("Rules {} are present", report.present_rules.join(", "));
    } else {
        error!(
            "Rules not found in the file: {}",
            report.missing_rules.join(", ")
        );
    }
}

/// Applies a [`PatchPlan`] to its target file.
#[derive(Debug, Clone)]
pub struct Patcher {
    plan: PatchPlan,
    dry_run: bool,
}

impl Patcher {
    /// Creates a patcher for `plan`.
    #[must_use]
    pub fn new(plan: PatchPlan) -> Self {
        Self {
            plan,
            dry_run: false,
        }
    }

    /// Sets whether to stop before the backup and write (default: false).
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs the patch.
    ///
    /// Order: preflight, backup, load, passes, atomic write, re-read and
    /// validate. A failing pass leaves the target untouched; a failing
    /// validation leaves the written file in place next to its backup.
    ///
    /// # Errors
    ///
    /// Returns a [`PatchError`] for the first step that fails.
    pub fn run(&self) -> Result<PatchReport, PatchError> {
        let path = self.plan.target.as_path();
        preflight(path)?;

        let backup = if self.dry_run {
            None
        } else {
            let dest = fs_safe::backup(path).map_err(|e| PatchError::Backup {
                path: path.to_path_buf(),
                source: e,
            })?;
            info!("Backup written to {}", dest.display());
            Some(dest)
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| PatchError::io(format!("reading {}", path.display()), e))?;
        let loaded = LineBuffer::parse(&content);
        debug!("Loaded {} line(s) from {}", loaded.len(), path.display());

        let edited = apply_passes(&loaded, &self.plan)?;

        let mut report = PatchReport {
            target: path.to_path_buf(),
            backup,
            dry_run: self.dry_run,
            removal: edited.removal,
            reference: edited.reference,
            insertion: edited.insertion,
            validation: None,
        };

        if self.dry_run {
            info!("Dry run: {} left unchanged", path.display());
            return Ok(report);
        }

        fs_safe::atomic_write(path, edited.buffer.to_content().as_bytes())
            .map_err(|e| PatchError::io(format!("writing {}", path.display()), e))?;
        debug!("Wrote {} line(s) to {}", edited.buffer.len(), path.display());

        report.validation = Some(verify(path, &self.plan)?);
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::Payload;
    use std::fs;
    use tempfile::TempDir;

    const RULES: &str = r#"<group name="cisco-asa,">
  <rule id="64016" level="8">
    <if_sid>64004</if_sid>
  </rule>
  <rule id="64017" level="10">
    <if_sid>64012, 64016, 64033</if_sid>
  </rule>
  <rule id="64033" level="8">
    <if_sid>64004</if_sid>
  </rule>
</group>
"#;

    fn plan_for(path: &Path) -> PatchPlan {
        PatchPlan::new()
            .with_target(path)
            .with_payload(Payload::new("  <rule id=\"70001\">\n  </rule>"))
    }

    #[test]
    fn run_patches_and_validates() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("rules.xml");
        fs::write(&target, RULES).unwrap();

        let report = Patcher::new(plan_for(&target)).run().unwrap();

        assert_eq!(report.backup, Some(fs_safe::backup_path(&target)));
        assert_eq!(report.removal.lines_removed, 3);
        assert!(report.validation.as_ref().is_some_and(ValidationReport::passed));

        let written = fs::read_to_string(&target).unwrap();
        assert!(!written.contains("64016"));
        assert!(written.contains("<if_sid>64012, 64033</if_sid>"));
        assert_eq!(
            fs::read_to_string(fs_safe::backup_path(&target)).unwrap(),
            RULES
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("rules.xml");
        fs::write(&target, RULES).unwrap();

        let report = Patcher::new(plan_for(&target)).dry_run(true).run().unwrap();

        assert!(report.dry_run);
        assert!(report.backup.is_none());
        assert!(report.validation.is_none());
        assert_eq!(report.insertion.after_line, 7);
        assert_eq!(fs::read_to_string(&target).unwrap(), RULES);
        assert!(!fs_safe::backup_path(&target).exists());
    }

    #[test]
    fn verify_reports_unpatched_file() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("rules.xml");
        fs::write(&target, RULES).unwrap();

        let err = verify(&target, &plan_for(&target)).unwrap_err();
        let report = match err {
            PatchError::Validation { report, .. } => report,
            other => panic!("expected validation error, got {other:?}"),
        };
        assert_eq!(report.leftover_lines, [2, 6]);
        assert_eq!(report.missing_rules, ["70001"]);
    }

    #[test]
    fn apply_passes_is_pure() {
        let loaded = LineBuffer::parse(RULES);
        let plan = plan_for(Path::new("unused.xml"));
        let edited = apply_passes(&loaded, &plan).unwrap();

        assert_eq!(loaded.to_content(), RULES);
        assert_eq!(edited.buffer.len(), loaded.len() - 3 + 1);
        assert!(matches!(
            edited.reference,
            ReferenceRepair::Repaired { line: 3, .. }
        ));
    }

    #[test]
    fn missing_file_diagnostic() {
        let err = Patcher::new(plan_for(Path::new("/nonexistent/rules.xml")))
            .run()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The file /nonexistent/rules.xml was not found"
        );
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("ruleset_patch::missing_file")
        );
    }
}
