//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

use crate::plan_source::PLAN_FILE_NAME;

const DEFAULT_PLAN: &str = r#"# ruleset-patch plan
# Every key is optional; omitted keys use the built-in Cisco ASA IDS plan.

# Rule file to patch. A backup is written next to it as <target>.bak
target = "/var/ossec/ruleset/rules/0625-cisco-asa_rules.xml"

# Rule block removed from the file
remove_rule = "64016"

# Rule whose cross-reference list drops the removed id
reference_rule = "64017"
reference_tag = "if_sid"

# New rules are inserted right after this rule's </rule>
anchor_rule = "64033"

# Replace the built-in rules 64034-64040 with your own text
# (set at most one of these)
# payload_file = "new-rules.xml"
# payload = """
#   <rule id="64041" level="5">
#   </rule>
# """
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    let plan_path = Path::new(PLAN_FILE_NAME);
    write_default(plan_path, force)?;

    println!("Created {}", plan_path.display());
    println!("\nNext steps:");
    println!("  1. Edit {} to adjust target and rule ids", plan_path.display());
    println!("  2. Run: ruleset-patch apply --dry-run");

    Ok(())
}

fn write_default(plan_path: &Path, force: bool) -> Result<()> {
    if plan_path.exists() && !force {
        bail!(
            "Plan file already exists at {}. Use --force to overwrite.",
            plan_path.display()
        );
    }

    std::fs::write(plan_path, DEFAULT_PLAN)?;
    Ok(())
}
