//! Patch plan: which file to edit and which rules to remove, repair, insert.
//!
//! The plan file is TOML. Every key is optional and falls back to the
//! built-in Cisco ASA IDS plan:
//!
//! ```toml
//! target = "/var/ossec/ruleset/rules/0625-cisco-asa_rules.xml"
//! remove_rule = "64016"
//! reference_rule = "64017"
//! reference_tag = "if_sid"
//! anchor_rule = "64033"
//! # payload = "..."          # inline rule text
//! # payload_file = "new.xml" # relative to the plan file
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::model::{ModelError, RuleId, TagName};
use crate::payload::Payload;

/// Ruleset file edited when no target is configured.
pub const DEFAULT_TARGET: &str = "/var/ossec/ruleset/rules/0625-cisco-asa_rules.xml";
/// Rule removed by default.
pub const DEFAULT_REMOVE_RULE: &str = "64016";
/// Rule whose cross-reference is repaired by default.
pub const DEFAULT_REFERENCE_RULE: &str = "64017";
/// Cross-reference tag repaired by default.
pub const DEFAULT_REFERENCE_TAG: &str = "if_sid";
/// Rule after which the payload goes by default.
pub const DEFAULT_ANCHOR_RULE: &str = "64033";

/// Raw plan as read from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanDto {
    /// Path of the rule file to patch.
    #[serde(default)]
    pub target: Option<PathBuf>,
    /// Rule id whose block is removed.
    #[serde(default)]
    pub remove_rule: Option<String>,
    /// Rule id whose cross-reference is repaired.
    #[serde(default)]
    pub reference_rule: Option<String>,
    /// Tag holding the cross-reference list.
    #[serde(default)]
    pub reference_tag: Option<String>,
    /// Rule id after which the payload is inserted.
    #[serde(default)]
    pub anchor_rule: Option<String>,
    /// Inline payload text.
    #[serde(default)]
    pub payload: Option<String>,
    /// File holding the payload text.
    #[serde(default)]
    pub payload_file: Option<PathBuf>,
}

/// Validated patch plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchPlan {
    /// Path of the rule file to patch.
    pub target: PathBuf,
    /// Rule whose block is removed.
    pub remove_rule: RuleId,
    /// Rule whose cross-reference is repaired.
    pub reference_rule: RuleId,
    /// Tag holding the cross-reference list.
    pub reference_tag: TagName,
    /// Rule after which the payload is inserted.
    pub anchor_rule: RuleId,
    /// Text inserted after the anchor.
    pub payload: Payload,
}

impl Default for PatchPlan {
    fn default() -> Self {
        Self {
            target: PathBuf::from(DEFAULT_TARGET),
            remove_rule: RuleId::from_static(DEFAULT_REMOVE_RULE),
            reference_rule: RuleId::from_static(DEFAULT_REFERENCE_RULE),
            reference_tag: TagName::from_static(DEFAULT_REFERENCE_TAG),
            anchor_rule: RuleId::from_static(DEFAULT_ANCHOR_RULE),
            payload: Payload::default(),
        }
    }
}

impl PatchPlan {
    /// Creates the built-in plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the plan with a different target path.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<PathBuf>) -> Self {
        self.target = target.into();
        self
    }

    /// Returns the plan with a different payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Loads a plan from a TOML file.
    ///
    /// A relative `payload_file` is resolved against the plan file's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn from_file(path: &Path) -> Result<Self, PlanError> {
        let content = std::fs::read_to_string(path).map_err(|e| PlanError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse_with_base(&content, base)
    }

    /// Parses a plan from a TOML string.
    ///
    /// A relative `payload_file` is resolved against the current directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or a field fails validation.
    pub fn parse(content: &str) -> Result<Self, PlanError> {
        Self::parse_with_base(content, Path::new("."))
    }

    fn parse_with_base(content: &str, base: &Path) -> Result<Self, PlanError> {
        let dto: PlanDto = toml::from_str(content).map_err(|e| PlanError::Parse {
            message: e.to_string(),
        })?;
        Self::from_dto(dto, base)
    }

    /// Converts a DTO into a validated plan, filling defaults.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an I/O error for `payload_file`.
    pub fn from_dto(dto: PlanDto, base: &Path) -> Result<Self, PlanError> {
        let mut plan = Self::default();

        if let Some(target) = dto.target {
            plan.target = target;
        }
        if let Some(id) = dto.remove_rule {
            plan.remove_rule = field_id("remove_rule", &id)?;
        }
        if let Some(id) = dto.reference_rule {
            plan.reference_rule = field_id("reference_rule", &id)?;
        }
        if let Some(tag) = dto.reference_tag {
            plan.reference_tag = TagName::new(&tag).map_err(|e| PlanError::Validation {
                field: "reference_tag",
                source: e,
            })?;
        }
        if let Some(id) = dto.anchor_rule {
            plan.anchor_rule = field_id("anchor_rule", &id)?;
        }

        match (dto.payload, dto.payload_file) {
            (Some(_), Some(_)) => return Err(PlanError::AmbiguousPayload),
            (Some(text), None) => plan.payload = Payload::new(text),
            (None, Some(file)) => {
                let path = base.join(file);
                let text = std::fs::read_to_string(&path)
                    .map_err(|e| PlanError::Io { path, source: e })?;
                plan.payload = Payload::new(text);
            }
            (None, None) => {}
        }

        if plan.payload.rules().is_empty() {
            return Err(PlanError::EmptyPayload);
        }

        Ok(plan)
    }
}

fn field_id(field: &'static str, value: &str) -> Result<RuleId, PlanError> {
    RuleId::new(value).map_err(|e| PlanError::Validation { field, source: e })
}

/// Plan loading errors.
#[derive(Debug, thiserror::Error)]
pub enum PlanError {
    /// IO error reading the plan or payload file.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// TOML syntax or schema error.
    #[error("Failed to parse plan: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A field holds an invalid value.
    #[error("{field}: {source}")]
    Validation {
        /// Offending field.
        field: &'static str,
        /// Underlying model error.
        source: ModelError,
    },

    /// Both `payload` and `payload_file` were given.
    #[error("exactly one of `payload` or `payload_file` may be set")]
    AmbiguousPayload,

    /// The payload declares no `<rule id="...">` block.
    #[error("payload declares no rules")]
    EmptyPayload,
}
