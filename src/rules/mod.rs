pub mod catalog;
pub mod filter;
pub mod result;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use catalog::{RuleCatalog, RuleGroup, RuleToggles};
pub use filter::{FilterKind, RuleFilter};
pub use result::{EngineSummary, RecombinedRuleResults, RuleResult, RuleViolation, Severity};

/// A single analysis rule as published by an engine.
///
/// `(engine, name)` identifies a rule uniquely within a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Engine that owns and executes this rule.
    pub engine: String,
    /// Rule name, unique within its engine.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Categories the rule is tagged with (e.g. "Best Practices").
    #[serde(default)]
    pub categories: Vec<String>,
    /// Rulesets the rule belongs to.
    #[serde(default)]
    pub rulesets: Vec<String>,
    /// Languages the rule applies to.
    #[serde(default)]
    pub languages: Vec<String>,
    /// Whether the rule runs when no explicit selection enables it.
    pub default_enabled: bool,
    /// Engine-native severity, 1 being the most severe.
    pub severity: u8,
    /// Documentation link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Engine-specific metadata, opaque to the catalog.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
}

impl Rule {
    /// `engine:name`, the key used by `[rules]` toggles and log output.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.engine, self.name)
    }
}

#[cfg(test)]
pub(crate) fn test_rule(engine: &str, name: &str) -> Rule {
    Rule {
        engine: engine.into(),
        name: name.into(),
        description: format!("{name} description"),
        categories: vec![],
        rulesets: vec![],
        languages: vec![],
        default_enabled: true,
        severity: 3,
        url: None,
        metadata: BTreeMap::new(),
    }
}
