//! Rule selection predicates.
//!
//! Each `RuleFilter` constrains one dimension of a rule. Filters of the same
//! kind are OR-ed together, filters of different kinds are AND-ed.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::Rule;

/// The dimension a filter constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Category,
    Ruleset,
    Engine,
    Language,
}

impl std::fmt::Display for FilterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => write!(f, "category"),
            Self::Ruleset => write!(f, "ruleset"),
            Self::Engine => write!(f, "engine"),
            Self::Language => write!(f, "language"),
        }
    }
}

/// A set of accepted values for one dimension. Values compare
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleFilter {
    Category(BTreeSet<String>),
    Ruleset(BTreeSet<String>),
    Engine(BTreeSet<String>),
    Language(BTreeSet<String>),
}

impl RuleFilter {
    pub fn new<I, S>(kind: FilterKind, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: BTreeSet<String> = values
            .into_iter()
            .map(|v| normalize(v.as_ref()))
            .filter(|v| !v.is_empty())
            .collect();
        match kind {
            FilterKind::Category => Self::Category(values),
            FilterKind::Ruleset => Self::Ruleset(values),
            FilterKind::Engine => Self::Engine(values),
            FilterKind::Language => Self::Language(values),
        }
    }

    pub fn category<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(FilterKind::Category, values)
    }

    pub fn ruleset<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(FilterKind::Ruleset, values)
    }

    pub fn engine<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(FilterKind::Engine, values)
    }

    pub fn language<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(FilterKind::Language, values)
    }

    pub fn kind(&self) -> FilterKind {
        match self {
            Self::Category(_) => FilterKind::Category,
            Self::Ruleset(_) => FilterKind::Ruleset,
            Self::Engine(_) => FilterKind::Engine,
            Self::Language(_) => FilterKind::Language,
        }
    }

    pub fn values(&self) -> &BTreeSet<String> {
        match self {
            Self::Category(v) | Self::Ruleset(v) | Self::Engine(v) | Self::Language(v) => v,
        }
    }

    /// Whether the rule carries any accepted value in this filter's dimension.
    /// A filter with no values matches nothing.
    pub fn matches(&self, rule: &Rule) -> bool {
        let accepted = self.values();
        let has = |candidates: &[String]| candidates.iter().any(|c| accepted.contains(&normalize(c)));
        match self {
            Self::Category(_) => has(&rule.categories),
            Self::Ruleset(_) => has(&rule.rulesets),
            Self::Language(_) => has(&rule.languages),
            Self::Engine(_) => accepted.contains(&normalize(&rule.engine)),
        }
    }
}

impl std::fmt::Display for RuleFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let values: Vec<&str> = self.values().iter().map(String::as_str).collect();
        write!(f, "{}=[{}]", self.kind(), values.join(","))
    }
}

/// Evaluate a whole filter list against one rule: OR within a kind, AND
/// across kinds. An empty list matches every rule.
pub fn matches_all(filters: &[RuleFilter], rule: &Rule) -> bool {
    let mut by_kind: BTreeMap<FilterKind, Vec<&RuleFilter>> = BTreeMap::new();
    for filter in filters {
        by_kind.entry(filter.kind()).or_default().push(filter);
    }
    by_kind
        .values()
        .all(|group| group.iter().any(|filter| filter.matches(rule)))
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
