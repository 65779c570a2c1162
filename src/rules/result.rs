use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Common severity scale that engine-native severities normalize onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "info" | "5" => Some(Self::Info),
            "low" | "4" => Some(Self::Low),
            "medium" | "med" | "moderate" | "3" => Some(Self::Medium),
            "high" | "2" => Some(Self::High),
            "critical" | "crit" | "1" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Default mapping from a 1-based engine severity (1 = most severe).
    pub fn from_engine_level(level: u8) -> Self {
        match level {
            0 | 1 => Self::Critical,
            2 => Self::High,
            3 => Self::Medium,
            4 => Self::Low,
            _ => Self::Info,
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// One rule violation reported by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleViolation {
    pub rule_name: String,
    pub message: String,
    pub line: usize,
    pub column: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<usize>,
    /// Engine-native severity, 1 being the most severe.
    pub severity: u8,
    /// Filled in when the run asked for normalized severities.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_severity: Option<Severity>,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl RuleViolation {
    /// Severity as shown in reports: the normalized name when present,
    /// otherwise the engine-native number.
    pub fn severity_label(&self) -> String {
        match self.normalized_severity {
            Some(sev) => sev.to_string(),
            None => self.severity.to_string(),
        }
    }
}

/// Violations found by one engine in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleResult {
    pub engine: String,
    pub file_name: String,
    pub violations: Vec<RuleViolation>,
}

/// Per-engine counters for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSummary {
    pub file_count: usize,
    pub violation_count: usize,
}

/// Aggregate output of a run across every engine that was invoked.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecombinedRuleResults {
    /// The formatted payload; empty when nothing was found.
    pub results: String,
    pub rule_results: Vec<RuleResult>,
    pub summary: BTreeMap<String, EngineSummary>,
}

impl RecombinedRuleResults {
    /// Merge per-engine results in the given order. File entries without
    /// violations are dropped.
    pub fn recombine(per_engine: Vec<(String, Vec<RuleResult>)>) -> Self {
        let mut rule_results = Vec::new();
        let mut summary = BTreeMap::new();

        for (engine, results) in per_engine {
            let entry: &mut EngineSummary = summary.entry(engine).or_default();
            for result in results {
                if result.violations.is_empty() {
                    continue;
                }
                entry.file_count += 1;
                entry.violation_count += result.violations.len();
                rule_results.push(result);
            }
        }

        Self {
            results: String::new(),
            rule_results,
            summary,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rule_results.is_empty()
    }

    pub fn violation_count(&self) -> usize {
        self.rule_results.iter().map(|r| r.violations.len()).sum()
    }

    /// Most severe normalized severity across all violations, if any were
    /// normalized.
    pub fn highest_severity(&self) -> Option<Severity> {
        self.rule_results
            .iter()
            .flat_map(|r| &r.violations)
            .filter_map(|v| v.normalized_severity)
            .max()
    }

    /// Whether any normalized violation is at or above `threshold`.
    pub fn exceeds_threshold(&self, threshold: Severity) -> bool {
        self.highest_severity().is_some_and(|sev| sev >= threshold)
    }
}
