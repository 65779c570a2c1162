pub mod csv;
pub mod html;
pub mod json;
pub mod junit;
pub mod sarif;
pub mod table;
pub mod xml;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rules::{RuleResult, Severity};

/// Output format selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Html,
    Json,
    Junit,
    Sarif,
    #[default]
    Table,
    Xml,
}

impl OutputFormat {
    pub fn from_str_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "html" | "htm" => Some(Self::Html),
            "json" => Some(Self::Json),
            "junit" => Some(Self::Junit),
            "sarif" => Some(Self::Sarif),
            "table" | "text" | "console" => Some(Self::Table),
            "xml" => Some(Self::Xml),
            _ => None,
        }
    }

    /// Guess a format from an output file name.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = std::path::Path::new(name).extension()?.to_string_lossy().to_lowercase();
        match ext.as_str() {
            "sarif" => Some(Self::Sarif),
            "xml" => Some(Self::Xml),
            "txt" => Some(Self::Table),
            other => Self::from_str_lenient(other),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Csv => "csv",
            Self::Html => "html",
            Self::Json => "json",
            Self::Junit => "junit",
            Self::Sarif => "sarif",
            Self::Table => "table",
            Self::Xml => "xml",
        };
        f.write_str(name)
    }
}

/// Render rule results into the specified format.
pub fn render(results: &[RuleResult], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Csv => Ok(csv::render(results)),
        OutputFormat::Html => Ok(html::render(results)),
        OutputFormat::Json => json::render(results),
        OutputFormat::Junit => Ok(junit::render(results)),
        OutputFormat::Sarif => sarif::render(results),
        OutputFormat::Table => Ok(table::render(results)),
        OutputFormat::Xml => Ok(xml::render(results)),
    }
}

/// Escape text for XML and HTML bodies and attribute values.
pub(crate) fn escape_markup(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Severity used for level mapping: normalized if present, otherwise derived
/// from the engine-native level.
pub(crate) fn effective_severity(v: &crate::rules::RuleViolation) -> Severity {
    v.normalized_severity
        .unwrap_or_else(|| Severity::from_engine_level(v.severity))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::rules::{RuleResult, RuleViolation};

    pub fn violation(rule: &str, line: usize, message: &str) -> RuleViolation {
        RuleViolation {
            rule_name: rule.into(),
            message: message.into(),
            line,
            column: 5,
            end_line: Some(line),
            end_column: Some(10),
            severity: 2,
            normalized_severity: None,
            category: "Security".into(),
            url: None,
        }
    }

    pub fn sample() -> Vec<RuleResult> {
        vec![
            RuleResult {
                engine: "regex".into(),
                file_name: "src/app.js".into(),
                violations: vec![
                    violation("no-eval", 12, "eval() executes <arbitrary> code"),
                    violation("no-debugger", 3, "Remove debugger statement"),
                ],
            },
            RuleResult {
                engine: "secrets".into(),
                file_name: "config/settings.yaml".into(),
                violations: vec![violation("generic-secret", 7, "Hard-coded \"credential\"")],
            },
        ]
    }
}
