use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::PatternRule;
use crate::error::Result;
use crate::rules::RuleToggles;

/// Default config file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".codeanalyzer.toml";

/// Top-level configuration from `.codeanalyzer.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Per-engine settings keyed by engine name.
    #[serde(default)]
    pub engines: BTreeMap<String, EngineConfig>,
    #[serde(default)]
    pub rules: RuleToggles,
}

/// `[engines.<name>]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Remove the engine from the registry entirely.
    #[serde(default)]
    pub disabled: bool,
    /// Replaces the engine's default file-acceptance patterns.
    #[serde(default)]
    pub target_patterns: Option<Vec<String>>,
    /// Extra regex rules for pattern-based engines.
    #[serde(default)]
    pub custom_rules: Vec<PatternRule>,
}

impl Config {
    /// Load config from a TOML file. Returns default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Generate a starter config file.
    pub fn starter_toml() -> &'static str {
        r#"# codeanalyzer configuration

# Per-engine settings. Built-in engines: "regex", "secrets".
[engines.regex]
disabled = false
# Replace the engine's default file patterns ("!" excludes).
# target_patterns = ["**/*.js", "**/*.ts", "!**/node_modules/**"]

# Extra regex rules for the engine.
# [[engines.regex.custom_rules]]
# name = "no-alert"
# pattern = '\balert\s*\('
# message = "Avoid alert()"
# categories = ["Best Practices"]
# languages = ["javascript"]
# severity = 3

[engines.secrets]
disabled = false

[rules]
# Rules to turn on although they are disabled by default (engine:rule).
# enable = ["regex:no-console"]
# Rules to turn off.
# disable = ["secrets:generic-secret"]
"#
    }
}
