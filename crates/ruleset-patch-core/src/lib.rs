//! # ruleset-patch-core
//!
//! Line-oriented patching of rule XML files (Wazuh/OSSEC rulesets).
//!
//! The file is handled as flat text lines, not as an XML tree. A run:
//!
//! - backs the file up to `<path>.bak`
//! - removes one rule block ([`passes::remove_block`])
//! - drops that rule's id from another rule's cross-reference tag
//!   ([`passes::repair_reference`])
//! - inserts a payload of new rules after an anchor rule
//!   ([`passes::insert_after`])
//! - writes the file atomically and re-reads it to validate
//!   ([`validate::validate`])
//!
//! ## Example
//!
//! ```ignore
//! use ruleset_patch_core::{PatchPlan, Patcher};
//!
//! let plan = PatchPlan::new().with_target("rules.xml");
//! let report = Patcher::new(plan).run()?;
//! println!("removed {} line(s)", report.removal.lines_removed);
//! ```
//!
//! Running twice is not idempotent: the second run finds nothing to remove
//! but inserts the payload again.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod model;
mod patcher;
mod plan;

/// Atomic write and backup helpers.
pub mod fs_safe;
/// Edit passes over a [`LineBuffer`].
pub mod passes;
/// New-rule payload text.
pub mod payload;
/// Post-write checks.
pub mod validate;

pub use buffer::LineBuffer;
pub use model::{ModelError, RuleId, TagName, RULE_CLOSE};
pub use passes::{Insertion, PassError, ReferenceRepair, Removal};
pub use patcher::{apply_passes, verify, Edited, PatchError, PatchReport, Patcher};
pub use payload::{Payload, PayloadRule, DEFAULT_PAYLOAD};
pub use plan::{
    PatchPlan, PlanDto, PlanError, DEFAULT_ANCHOR_RULE, DEFAULT_REFERENCE_RULE,
    DEFAULT_REFERENCE_TAG, DEFAULT_REMOVE_RULE, DEFAULT_TARGET,
};
pub use validate::ValidationReport;
