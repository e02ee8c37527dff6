//! Shared output formatting for run reports.

use anyhow::Result;
use miette::Diagnostic;
use ruleset_patch_core::{PatchError, PatchReport, ReferenceRepair, ValidationReport};
use serde::Serialize;

use crate::OutputFormat;

const OK: &str = "\x1b[32mok\x1b[0m";
const FAILED: &str = "\x1b[31mFAILED\x1b[0m";

/// Print a patch report in the specified format.
pub fn print_report(report: &PatchReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_report_text(report),
        OutputFormat::Json => return print_json(report),
    }
    Ok(())
}

/// Print validation results in the specified format.
pub fn print_validation(report: &ValidationReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print_validation_text(report),
        OutputFormat::Json => return print_json(report),
    }
    Ok(())
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

/// Print a failed run: a miette report on stderr, or a JSON object on stdout.
pub fn print_error(err: PatchError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => eprintln!("{:?}", miette::Report::new(err)),
        OutputFormat::Json => return print_json(&error_json(&err)),
    }
    Ok(())
}

/// JSON shape of a failed run: message, diagnostic code, and the validation
/// report when the checks failed.
#[must_use]
pub fn error_json(err: &PatchError) -> serde_json::Value {
    let validation = match err {
        PatchError::Validation { report, .. } => Some(report),
        _ => None,
    };
    serde_json::json!({
        "error": err.to_string(),
        "code": err.code().map(|c| c.to_string()),
        "validation": validation,
    })
}

fn print_report_text(report: &PatchReport) {
    println!("Target: {}", report.target.display());
    if let Some(backup) = &report.backup {
        println!("Backup: {}", backup.display());
    }

    match report.removal.start_line {
        Some(line) => println!(
            "  remove     {} line(s) dropped from line {}",
            report.removal.lines_removed, line
        ),
        None => println!("  remove     rule not present, skipped"),
    }

    println!("  reference  {}", describe_reference(&report.reference));

    println!(
        "  insert     {} rule(s) after line {}",
        report.insertion.rules, report.insertion.after_line
    );

    if report.dry_run {
        println!("\nDry run: no changes written.");
    }
    if let Some(validation) = &report.validation {
        println!();
        print_validation_text(validation);
    }
}

fn print_validation_text(report: &ValidationReport) {
    let removal = if report.removal_passed() { OK } else { FAILED };
    println!("  check      rule {} removed ... {}", report.removed_rule, removal);

    let insertion = if report.insertion_passed() { OK } else { FAILED };
    println!(
        "  check      {} new rule(s) present ... {}",
        report.present_rules.len(),
        insertion
    );
    if !report.insertion_passed() {
        println!("             missing: {}", report.missing_rules.join(", "));
    }
}

/// One-line description of a reference repair outcome.
#[must_use]
pub fn describe_reference(repair: &ReferenceRepair) -> String {
    match repair {
        ReferenceRepair::Repaired { line, after, .. } => {
            format!("line {line} now reads {}", after.trim())
        }
        ReferenceRepair::TokenAbsent { line } => format!("line {line} already clean"),
        ReferenceRepair::TagNotFound => "no reference tag found, skipped".to_string(),
        ReferenceRepair::RuleNotFound => "reference rule not found, skipped".to_string(),
    }
}
