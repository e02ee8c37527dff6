//! Validated newtypes for rule identifiers and tag names.
//!
//! No I/O and no serde here; invariants are enforced at construction time.

use std::fmt;

/// Closing marker of every rule block.
pub const RULE_CLOSE: &str = "</rule>";

/// A rule identifier (non-empty, ASCII digits only), e.g. `64016`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleId(String);

impl RuleId {
    /// Creates a new rule id.
    ///
    /// # Errors
    ///
    /// Returns error if the id is empty or contains anything but digits.
    pub fn new(id: &str) -> Result<Self, ModelError> {
        if id.is_empty() {
            return Err(ModelError::EmptyRuleId);
        }
        if !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ModelError::InvalidRuleId { id: id.to_string() });
        }
        Ok(Self(id.to_string()))
    }

    /// Wraps a built-in constant id.
    pub(crate) fn from_static(id: &'static str) -> Self {
        debug_assert!(Self::new(id).is_ok(), "invalid built-in rule id {id}");
        Self(id.to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opening-tag signature of this rule, e.g. `<rule id="64016"`.
    ///
    /// The signature stops before the attribute list so it matches
    /// `<rule id="64016" level="12">` as well as `<rule id="64016">`.
    #[must_use]
    pub fn signature(&self) -> String {
        format!("<rule id=\"{}\"", self.0)
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Name of the cross-reference tag, e.g. `if_sid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagName(String);

impl TagName {
    /// Creates a new tag name.
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or is not `[A-Za-z0-9_-]`.
    pub fn new(name: &str) -> Result<Self, ModelError> {
        if name.is_empty() {
            return Err(ModelError::EmptyTagName);
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(ModelError::InvalidTagName {
                name: name.to_string(),
            });
        }
        Ok(Self(name.to_string()))
    }

    pub(crate) fn from_static(name: &'static str) -> Self {
        debug_assert!(Self::new(name).is_ok(), "invalid built-in tag {name}");
        Self(name.to_string())
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Opening tag, e.g. `<if_sid>`.
    #[must_use]
    pub fn open_tag(&self) -> String {
        format!("<{}>", self.0)
    }
}

impl fmt::Display for TagName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validation errors for model newtypes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Rule id is empty.
    #[error("rule id must not be empty")]
    EmptyRuleId,

    /// Rule id contains non-digit characters.
    #[error("invalid rule id `{id}`: only digits are allowed")]
    InvalidRuleId {
        /// The invalid id.
        id: String,
    },

    /// Tag name is empty.
    #[error("tag name must not be empty")]
    EmptyTagName,

    /// Tag name contains characters outside `[A-Za-z0-9_-]`.
    #[error("invalid tag name `{name}`")]
    InvalidTagName {
        /// The invalid name.
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_id_accepts_digits() {
        let id = RuleId::new("64016").unwrap();
        assert_eq!(id.as_str(), "64016");
        assert_eq!(id.to_string(), "64016");
    }

    #[test]
    fn rule_id_rejects_empty_and_non_digits() {
        assert_eq!(RuleId::new(""), Err(ModelError::EmptyRuleId));
        assert!(matches!(
            RuleId::new("64a16"),
            Err(ModelError::InvalidRuleId { .. })
        ));
        assert!(RuleId::new(" 64016").is_err());
    }

    #[test]
    fn signature_omits_closing_bracket() {
        let id = RuleId::new("64033").unwrap();
        assert_eq!(id.signature(), r#"<rule id="64033""#);
        assert!(r#"  <rule id="64033" level="10">"#.contains(&id.signature()));
    }

    #[test]
    fn tag_name_open_tag() {
        let tag = TagName::new("if_sid").unwrap();
        assert_eq!(tag.open_tag(), "<if_sid>");
        assert!(TagName::new("if sid").is_err());
        assert_eq!(TagName::new(""), Err(ModelError::EmptyTagName));
    }
}
