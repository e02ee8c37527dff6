//! List rules command implementation.

use anyhow::Result;
use ruleset_patch_core::PatchPlan;
use serde::Serialize;

use crate::OutputFormat;

#[derive(Serialize)]
struct RuleListing<'a> {
    target: &'a std::path::Path,
    remove: &'a str,
    reference: &'a str,
    reference_tag: &'a str,
    anchor: &'a str,
    insert: Vec<InsertedRule<'a>>,
}

#[derive(Serialize)]
struct InsertedRule<'a> {
    id: &'a str,
    description: Option<&'a str>,
}

/// Runs the list-rules command.
pub fn run(plan: &PatchPlan, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => super::output::print_json(&listing(plan)),
        OutputFormat::Text => {
            print_text(plan);
            Ok(())
        }
    }
}

fn listing(plan: &PatchPlan) -> RuleListing<'_> {
    RuleListing {
        target: &plan.target,
        remove: plan.remove_rule.as_str(),
        reference: plan.reference_rule.as_str(),
        reference_tag: plan.reference_tag.as_str(),
        anchor: plan.anchor_rule.as_str(),
        insert: plan
            .payload
            .rules()
            .iter()
            .map(|r| InsertedRule {
                id: r.id.as_str(),
                description: r.description.as_deref(),
            })
            .collect(),
    }
}

fn print_text(plan: &PatchPlan) {
    println!("Target: {}\n", plan.target.display());
    println!("  remove     {}", plan.remove_rule);
    println!(
        "  reference  {} <{}>",
        plan.reference_rule, plan.reference_tag
    );
    println!("  anchor     {}", plan.anchor_rule);

    println!("\nRules inserted:\n");
    println!("{:<10} Description", "Id");
    println!("{}", "-".repeat(80));

    for rule in plan.payload.rules() {
        println!(
            "{:<10} {}",
            rule.id,
            rule.description.as_deref().unwrap_or("-")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_reflects_builtin_plan() {
        let plan = PatchPlan::default();
        let listing = listing(&plan);
        assert_eq!(listing.remove, "64016");
        assert_eq!(listing.reference_tag, "if_sid");
        assert_eq!(listing.insert.len(), 7);
        assert_eq!(listing.insert[0].id, "64034");
        assert_eq!(
            listing.insert[6].description,
            Some("ASA: Unusual event detected.")
        );
    }
}
