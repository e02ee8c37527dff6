//! The three edit passes over a [`LineBuffer`].
//!
//! Each pass takes an immutable snapshot and returns a new one together with
//! a record of what it did, so the pipeline reads as
//! `loaded -> removed -> repaired -> inserted`.

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::buffer::LineBuffer;
use crate::model::{RuleId, TagName, RULE_CLOSE};
use crate::payload::Payload;

/// Errors raised by an edit pass. Nothing has been written when they occur.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    /// The insertion anchor rule does not exist in the file.
    #[error("could not locate <rule id=\"{id}\"> to add rules")]
    MissingAnchor {
        /// Anchor rule id.
        id: RuleId,
    },

    /// A rule block opens but no `</rule>` follows before end of file.
    #[error("<rule id=\"{id}\"> opened at line {line} is never closed")]
    UnterminatedBlock {
        /// Rule id of the open block.
        id: RuleId,
        /// 1-indexed line of the opening tag.
        line: usize,
    },
}

/// Result of [`remove_block`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Removal {
    /// 1-indexed line where the first removed block started.
    pub start_line: Option<usize>,
    /// Number of lines dropped.
    pub lines_removed: usize,
}

impl Removal {
    /// Returns true if a block was found and dropped.
    #[must_use]
    pub fn found(&self) -> bool {
        self.start_line.is_some()
    }
}

/// Result of [`repair_reference`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferenceRepair {
    /// The token was removed from the tag line.
    Repaired {
        /// 1-indexed line that was rewritten.
        line: usize,
        /// Line content before the edit, without terminator.
        before: String,
        /// Line content after the edit, without terminator.
        after: String,
    },
    /// The tag line exists but does not mention the removed id.
    TokenAbsent {
        /// 1-indexed tag line.
        line: usize,
    },
    /// No tag line follows the reference rule.
    TagNotFound,
    /// The reference rule does not exist.
    RuleNotFound,
}

/// Result of [`insert_after`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Insertion {
    /// 1-indexed line of the anchor's `</rule>`; the payload follows it.
    pub after_line: usize,
    /// Number of rules the payload declares.
    pub rules: usize,
}

/// Drops the block opened by `id` through its next `</rule>` line.
///
/// A missing block is not an error; the returned [`Removal`] reports it.
///
/// # Errors
///
/// Returns [`PassError::UnterminatedBlock`] if the block never closes.
pub fn remove_block(buf: &LineBuffer, id: &RuleId) -> Result<(LineBuffer, Removal), PassError> {
    let signature = id.signature();
    let mut kept = Vec::with_capacity(buf.len());
    let mut removal = Removal::default();
    let mut open_at: Option<usize> = None;

    for (i, line) in buf.lines().iter().enumerate() {
        if open_at.is_none() && line.contains(&signature) {
            open_at = Some(i);
            if removal.start_line.is_none() {
                removal.start_line = Some(i + 1);
            }
        }
        if open_at.is_some() {
            removal.lines_removed += 1;
            if line.contains(RULE_CLOSE) {
                open_at = None;
            }
            continue;
        }
        kept.push(line.clone());
    }

    if let Some(i) = open_at {
        return Err(PassError::UnterminatedBlock {
            id: id.clone(),
            line: i + 1,
        });
    }

    debug!(
        "Removal of rule {} dropped {} line(s)",
        id, removal.lines_removed
    );
    Ok((LineBuffer::from_lines(kept), removal))
}

/// Removes `removed` from the first `<tag>` line at or after rule `rule`.
///
/// Only that one line is inspected and changed.
#[must_use]
pub fn repair_reference(
    buf: &LineBuffer,
    rule: &RuleId,
    tag: &TagName,
    removed: &RuleId,
) -> (LineBuffer, ReferenceRepair) {
    let Some(rule_idx) = buf.find(&rule.signature()) else {
        return (buf.clone(), ReferenceRepair::RuleNotFound);
    };
    let Some(tag_idx) = buf.find_from(rule_idx, &tag.open_tag()) else {
        return (buf.clone(), ReferenceRepair::TagNotFound);
    };

    let original = &buf.lines()[tag_idx];
    let Some(rewritten) = remove_token(original, removed.as_str()) else {
        return (buf.clone(), ReferenceRepair::TokenAbsent { line: tag_idx + 1 });
    };

    let repair = ReferenceRepair::Repaired {
        line: tag_idx + 1,
        before: original.trim_end_matches(['\r', '\n']).to_string(),
        after: rewritten.trim_end_matches(['\r', '\n']).to_string(),
    };
    let mut lines = buf.lines().to_vec();
    lines[tag_idx] = rewritten;
    (LineBuffer::from_lines(lines), repair)
}

/// Removes one occurrence of `id` from a comma-separated list in `line`.
///
/// Tries `", id"`, then `"id,"`, then bare `"id"`; the first form present
/// wins and only its first occurrence is removed.
#[must_use]
pub fn remove_token(line: &str, id: &str) -> Option<String> {
    let forms = [format!(", {id}"), format!("{id},"), id.to_string()];
    forms
        .iter()
        .find(|form| line.contains(form.as_str()))
        .map(|form| line.replacen(form.as_str(), "", 1))
}

/// Inserts the payload as one element right after the anchor's `</rule>` line.
///
/// The closing line is the first one, starting at the anchor's opening line,
/// whose trimmed content ends with `</rule>`.
///
/// # Errors
///
/// Returns [`PassError::MissingAnchor`] if the anchor rule is absent, or
/// [`PassError::UnterminatedBlock`] if it never closes.
pub fn insert_after(
    buf: &LineBuffer,
    anchor: &RuleId,
    payload: &Payload,
) -> Result<(LineBuffer, Insertion), PassError> {
    let start = buf
        .find(&anchor.signature())
        .ok_or_else(|| PassError::MissingAnchor { id: anchor.clone() })?;

    let close = buf
        .lines()
        .iter()
        .enumerate()
        .skip(start)
        .find(|(_, line)| line.trim().ends_with(RULE_CLOSE))
        .map(|(i, _)| i)
        .ok_or_else(|| PassError::UnterminatedBlock {
            id: anchor.clone(),
            line: start + 1,
        })?;

    let mut lines = buf.lines().to_vec();
    lines.insert(close + 1, payload.as_insertion());

    Ok((
        LineBuffer::from_lines(lines),
        Insertion {
            after_line: close + 1,
            rules: payload.rules().len(),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> RuleId {
        RuleId::new(s).unwrap()
    }

    fn if_sid() -> TagName {
        TagName::new("if_sid").unwrap()
    }

    const SAMPLE: &str = r#"<group name="cisco-asa,">
  <rule id="64015" level="8">
    <if_sid>64004</if_sid>
  </rule>
  <rule id="64016" level="8">
    <if_sid>64004</if_sid>
  </rule>
  <rule id="64017" level="10" frequency="8">
    <if_sid>64012, 64016, 64033</if_sid>
  </rule>
  <rule id="64033" level="8">
    <if_sid>64004</if_sid>
  </rule>
</group>
"#;

    #[test]
    fn remove_block_drops_open_through_close() {
        let buf = LineBuffer::parse(SAMPLE);
        let (out, removal) = remove_block(&buf, &id("64016")).unwrap();

        assert_eq!(removal.start_line, Some(5));
        assert_eq!(removal.lines_removed, 3);
        assert_eq!(out.len(), buf.len() - 3);
        assert!(!out.contains(r#"<rule id="64016""#));
        assert!(out.contains(r#"<rule id="64015""#));
        assert!(out.contains(r#"<rule id="64017""#));
    }

    #[test]
    fn remove_block_missing_rule_is_noop() {
        let buf = LineBuffer::parse(SAMPLE);
        let (out, removal) = remove_block(&buf, &id("99999")).unwrap();
        assert!(!removal.found());
        assert_eq!(removal.lines_removed, 0);
        assert_eq!(out, buf);
    }

    #[test]
    fn remove_block_single_line_rule() {
        let buf = LineBuffer::parse("a\n<rule id=\"7\"></rule>\nb\n");
        let (out, removal) = remove_block(&buf, &id("7")).unwrap();
        assert_eq!(removal.lines_removed, 1);
        assert_eq!(out.to_content(), "a\nb\n");
    }

    #[test]
    fn remove_block_unterminated_fails() {
        let buf = LineBuffer::parse("a\n<rule id=\"7\">\n  <if_sid>1</if_sid>\n");
        let err = remove_block(&buf, &id("7")).unwrap_err();
        assert_eq!(
            err,
            PassError::UnterminatedBlock {
                id: id("7"),
                line: 2
            }
        );
    }

    #[test]
    fn repair_removes_middle_token() {
        let buf = LineBuffer::parse(SAMPLE);
        let (out, repair) = repair_reference(&buf, &id("64017"), &if_sid(), &id("64016"));

        assert_eq!(out.lines()[8], "    <if_sid>64012, 64033</if_sid>\n");
        assert_eq!(
            repair,
            ReferenceRepair::Repaired {
                line: 9,
                before: "    <if_sid>64012, 64016, 64033</if_sid>".to_string(),
                after: "    <if_sid>64012, 64033</if_sid>".to_string(),
            }
        );
    }

    #[test]
    fn repair_touches_only_first_tag_line() {
        let buf = LineBuffer::parse(
            "<rule id=\"2\">\n<if_sid>1, 9</if_sid>\n<if_sid>9</if_sid>\n</rule>\n",
        );
        let (out, _) = repair_reference(&buf, &id("2"), &if_sid(), &id("9"));
        assert_eq!(out.lines()[1], "<if_sid>1</if_sid>\n");
        assert_eq!(out.lines()[2], "<if_sid>9</if_sid>\n");
    }

    #[test]
    fn repair_reports_missing_pieces() {
        let buf = LineBuffer::parse(SAMPLE);
        let (_, repair) = repair_reference(&buf, &id("11111"), &if_sid(), &id("64016"));
        assert_eq!(repair, ReferenceRepair::RuleNotFound);

        let (_, repair) = repair_reference(&buf, &id("64017"), &if_sid(), &id("55555"));
        assert_eq!(repair, ReferenceRepair::TokenAbsent { line: 9 });

        let no_tag = LineBuffer::parse("<rule id=\"2\">\n</rule>\n");
        let (out, repair) = repair_reference(&no_tag, &id("2"), &if_sid(), &id("9"));
        assert_eq!(repair, ReferenceRepair::TagNotFound);
        assert_eq!(out, no_tag);
    }

    #[test]
    fn remove_token_forms() {
        assert_eq!(
            remove_token("<if_sid>1, 9, 3</if_sid>", "9").as_deref(),
            Some("<if_sid>1, 3</if_sid>")
        );
        assert_eq!(
            remove_token("<if_sid>1, 9</if_sid>", "9").as_deref(),
            Some("<if_sid>1</if_sid>")
        );
        assert_eq!(
            remove_token("<if_sid>9,3</if_sid>", "9").as_deref(),
            Some("<if_sid>3</if_sid>")
        );
        assert_eq!(
            remove_token("<if_sid>9</if_sid>", "9").as_deref(),
            Some("<if_sid></if_sid>")
        );
        assert_eq!(remove_token("<if_sid>1</if_sid>", "9"), None);
    }

    #[test]
    fn insert_after_anchor_close() {
        let buf = LineBuffer::parse(SAMPLE);
        let payload = Payload::new("  <rule id=\"70000\">\n  </rule>");
        let (out, insertion) = insert_after(&buf, &id("64033"), &payload).unwrap();

        assert_eq!(insertion.after_line, 13);
        assert_eq!(insertion.rules, 1);
        assert_eq!(out.len(), buf.len() + 1);
        assert_eq!(out.lines()[12], "  </rule>\n");
        assert_eq!(out.lines()[13], "  <rule id=\"70000\">\n  </rule>\n");
        assert_eq!(out.lines()[14], "</group>\n");
    }

    #[test]
    fn insert_after_missing_anchor() {
        let buf = LineBuffer::parse("<rule id=\"1\">\n</rule>\n");
        let err = insert_after(&buf, &id("64033"), &Payload::default()).unwrap_err();
        assert_eq!(err, PassError::MissingAnchor { id: id("64033") });
        assert_eq!(
            err.to_string(),
            "could not locate <rule id=\"64033\"> to add rules"
        );
    }

    #[test]
    fn insert_after_unclosed_anchor() {
        let buf = LineBuffer::parse("<rule id=\"5\">\n  <if_sid>1</if_sid>\n");
        let err = insert_after(&buf, &id("5"), &Payload::default()).unwrap_err();
        assert!(matches!(err, PassError::UnterminatedBlock { line: 1, .. }));
    }
}
