//! New-rule payload: the rule text spliced in after the anchor rule.

use crate::model::{RuleId, RULE_CLOSE};

/// Rules `64034`–`64040` for the Cisco ASA IDS syslog messages `4-4000nn`.
///
/// Inserted verbatim; the leading and trailing newlines are part of the text.
pub const DEFAULT_PAYLOAD: &str = r#"
  <rule id="64034" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400026|^4-400027|^4-400028</id>
    <description>ASA: TCP protocol manipulation Attack in progress detected.</description>
    <mitre>
      <id>T1071.001</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64035" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400029|^4-400030</id>
    <description>ASA: FTP Improper Address or Port attack in progress detected.</description>
    <mitre>
      <id>T1071.002</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64036" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400008</id>
    <description>ASA: IP impossible packet attack in progress detected.</description>
    <mitre>
      <id>T1090</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64037" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400050</id>
    <description>ASA: Buffer Overflow attack in progress detected.</description>
    <mitre>
      <id>T1203</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64038" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400007|^4-400009|^4-400023|^4-400024|^4-400025|^4-400031|^4-400032|^4-400033</id>
    <description>ASA: Network DoS attack in progress detected.</description>
    <mitre>
      <id>T1498</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64039" level="12">
    <if_sid>64004</if_sid>
    <id>^4-400041</id>
    <description>ASA: Proxied RPC Request attack in progress detected.</description>
    <mitre>
      <id>T1573</id>
    </mitre>
    <group>ids,</group>
  </rule>

  <rule id="64040" level="3">
    <if_sid>64004</if_sid>
    <id>^4-4000(\d\d)</id>
    <description>ASA: Unusual event detected.</description>
    <group>ids,</group>
  </rule>
"#;

const RULE_OPEN_PREFIX: &str = "<rule id=\"";

/// One rule declared in a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadRule {
    /// Rule id taken from the opening tag.
    pub id: RuleId,
    /// Text of the `<description>` element, if the block has one.
    pub description: Option<String>,
}

/// Pre-authored rule text with the rules it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    text: String,
    rules: Vec<PayloadRule>,
}

impl Payload {
    /// Wraps payload text, extracting the rules it declares in authored order.
    ///
    /// Opening tags whose id is not a valid [`RuleId`] are skipped.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let rules = scan_rules(&text);
        Self { text, rules }
    }

    /// Returns the raw payload text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the rules declared in the payload.
    #[must_use]
    pub fn rules(&self) -> &[PayloadRule] {
        &self.rules
    }

    /// The sequence element inserted into the file: text plus a newline.
    #[must_use]
    pub fn as_insertion(&self) -> String {
        format!("{}\n", self.text)
    }
}

impl Default for Payload {
    fn default() -> Self {
        Self::new(DEFAULT_PAYLOAD)
    }
}

fn scan_rules(text: &str) -> Vec<PayloadRule> {
    let mut rules: Vec<PayloadRule> = Vec::new();
    let mut open = false;

    for line in text.lines() {
        if let Some(id) = opening_id(line) {
            rules.push(PayloadRule {
                id,
                description: None,
            });
            open = true;
        }
        if open {
            if let (Some(desc), Some(rule)) = (element_text(line, "description"), rules.last_mut())
            {
                if rule.description.is_none() {
                    rule.description = Some(desc.to_string());
                }
            }
        }
        if line.contains(RULE_CLOSE) {
            open = false;
        }
    }

    rules
}

fn opening_id(line: &str) -> Option<RuleId> {
    let start = line.find(RULE_OPEN_PREFIX)? + RULE_OPEN_PREFIX.len();
    let rest = &line[start..];
    let end = rest.find('"')?;
    RuleId::new(&rest[..end]).ok()
}

fn element_text<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let open = format!("<{name}>");
    let close = format!("</{name}>");
    let start = line.find(&open)? + open.len();
    let end = line[start..].find(&close)? + start;
    Some(&line[start..end])
}
