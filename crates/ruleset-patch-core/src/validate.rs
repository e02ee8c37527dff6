//! Post-write checks on the patched file content.

use serde::Serialize;
use std::fmt;

use crate::model::RuleId;
use crate::payload::Payload;

/// Outcome of checking file content after a patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Id that must no longer appear anywhere.
    pub removed_rule: String,
    /// 1-indexed lines still mentioning the removed id.
    pub leftover_lines: Vec<usize>,
    /// Payload rule ids whose opening tag is present.
    pub present_rules: Vec<String>,
    /// Payload rule ids whose opening tag is missing.
    pub missing_rules: Vec<String>,
}

impl ValidationReport {
    /// True if the removed id is gone.
    #[must_use]
    pub fn removal_passed(&self) -> bool {
        self.leftover_lines.is_empty()
    }

    /// True if every payload rule is present.
    #[must_use]
    pub fn insertion_passed(&self) -> bool {
        self.missing_rules.is_empty()
    }

    /// True if both checks passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.removal_passed() && self.insertion_passed()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut problems = Vec::new();
        if !self.removal_passed() {
            let lines: Vec<String> = self.leftover_lines.iter().map(ToString::to_string).collect();
            problems.push(format!(
                "rule {} still referenced at line(s) {}",
                self.removed_rule,
                lines.join(", ")
            ));
        }
        if !self.insertion_passed() {
            problems.push(format!(
                "rules not found in the file: {}",
                self.missing_rules.join(", ")
            ));
        }
        if problems.is_empty() {
            write!(f, "all checks passed")
        } else {
            write!(f, "{}", problems.join("; "))
        }
    }
}

/// Checks that `removed` is gone and every payload rule is present.
///
/// The removal check looks for the bare id string, so it covers both the
/// dropped block and any cross-reference still naming it.
#[must_use]
pub fn validate(content: &str, removed: &RuleId, payload: &Payload) -> ValidationReport {
    let leftover_lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(removed.as_str()))
        .map(|(i, _)| i + 1)
        .collect();

    let (present, missing): (Vec<_>, Vec<_>) = payload
        .rules()
        .iter()
        .partition(|rule| content.contains(&rule.id.signature()));

    ValidationReport {
        removed_rule: removed.to_string(),
        leftover_lines,
        present_rules: present.iter().map(|r| r.id.to_string()).collect(),
        missing_rules: missing.iter().map(|r| r.id.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> Payload {
        Payload::new("<rule id=\"10\">\n</rule>\n<rule id=\"11\" level=\"3\">\n</rule>\n")
    }

    fn removed() -> RuleId {
        RuleId::new("64016").unwrap()
    }

    #[test]
    fn passes_when_clean() {
        let content = "<rule id=\"10\">\n</rule>\n<rule id=\"11\" level=\"3\">\n</rule>\n";
        let report = validate(content, &removed(), &payload());
        assert!(report.passed());
        assert_eq!(report.present_rules, ["10", "11"]);
        assert_eq!(report.to_string(), "all checks passed");
    }

    #[test]
    fn leftover_reference_fails_removal() {
        let content =
            "<rule id=\"10\">\n<if_sid>64016</if_sid>\n</rule>\n<rule id=\"11\">\n</rule>\n";
        let report = validate(content, &removed(), &payload());
        assert!(!report.removal_passed());
        assert!(report.insertion_passed());
        assert_eq!(report.leftover_lines, [2]);
        assert_eq!(
            report.to_string(),
            "rule 64016 still referenced at line(s) 2"
        );
    }

    #[test]
    fn missing_rule_fails_insertion() {
        let content = "<rule id=\"10\">\n</rule>\n";
        let report = validate(content, &removed(), &payload());
        assert!(report.removal_passed());
        assert!(!report.passed());
        assert_eq!(report.missing_rules, ["11"]);
        assert_eq!(report.to_string(), "rules not found in the file: 11");
    }
}
