//! Line-oriented regex engine.
//!
//! Both built-in engines are `PatternEngine`s over different rule packs and
//! default target patterns. Custom rules from config are compiled alongside
//! the built-in ones.

use std::collections::{BTreeMap, HashSet};
use std::fs;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{Engine, EngineContext, FileFilter, Language};
use crate::config::EngineConfig;
use crate::error::{Result, ScanError};
use crate::rules::{Rule, RuleResult, RuleViolation};
use crate::target::RuleTarget;

/// Files above this size are skipped.
const MAX_FILE_BYTES: u64 = 1_048_576;

/// Definition of a regex rule, either built in or declared in config under
/// `[[engines.<name>.custom_rules]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternRule {
    pub name: String,
    /// Regex matched against each line.
    pub pattern: String,
    /// Violation message.
    pub message: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub rulesets: Vec<String>,
    /// Languages the rule applies to; empty means every file.
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default = "default_severity")]
    pub severity: u8,
    #[serde(default = "default_enabled")]
    pub default_enabled: bool,
    #[serde(default)]
    pub url: Option<String>,
}

fn default_severity() -> u8 {
    3
}

fn default_enabled() -> bool {
    true
}

impl PatternRule {
    pub fn new(name: &str, pattern: &str, message: &str) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            message: message.into(),
            description: message.into(),
            categories: vec![],
            rulesets: vec![],
            languages: vec![],
            severity: default_severity(),
            default_enabled: true,
            url: None,
        }
    }

    pub fn description(mut self, description: &str) -> Self {
        self.description = description.into();
        self
    }

    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn rulesets(mut self, rulesets: &[&str]) -> Self {
        self.rulesets = rulesets.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn languages(mut self, languages: &[&str]) -> Self {
        self.languages = languages.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn severity(mut self, severity: u8) -> Self {
        self.severity = severity;
        self
    }

    pub fn disabled_by_default(mut self) -> Self {
        self.default_enabled = false;
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn to_rule(&self, engine: &str) -> Rule {
        let mut metadata = BTreeMap::new();
        metadata.insert("pattern".to_string(), self.pattern.clone());
        Rule {
            engine: engine.into(),
            name: self.name.clone(),
            description: self.description.clone(),
            categories: self.categories.clone(),
            rulesets: self.rulesets.clone(),
            languages: self.languages.clone(),
            default_enabled: self.default_enabled,
            severity: self.severity,
            url: self.url.clone(),
            metadata,
        }
    }

    fn applies_to(&self, language: Language) -> bool {
        self.languages.is_empty()
            || self
                .languages
                .iter()
                .any(|l| l.eq_ignore_ascii_case(language.as_str()))
    }
}

struct CompiledRule {
    def: PatternRule,
    regex: Regex,
}

/// Engine that reports one violation per regex match per line.
pub struct PatternEngine {
    name: &'static str,
    builtin: &'static [PatternRule],
    default_target_patterns: &'static [&'static str],
    filter: FileFilter,
    compiled: Vec<CompiledRule>,
}

impl PatternEngine {
    pub fn new(
        name: &'static str,
        builtin: &'static [PatternRule],
        default_target_patterns: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            builtin,
            default_target_patterns,
            filter: FileFilter::new(default_target_patterns),
            compiled: Vec::new(),
        }
    }

    fn compile(&self, def: &PatternRule) -> Result<CompiledRule> {
        let regex = Regex::new(&def.pattern).map_err(|e| ScanError::EngineInit {
            engine: self.name.into(),
            message: format!("rule '{}' has an invalid pattern: {}", def.name, e),
        })?;
        Ok(CompiledRule {
            def: def.clone(),
            regex,
        })
    }

    fn execution_error(&self, path: &str, err: std::io::Error) -> ScanError {
        ScanError::EngineExecution {
            engine: self.name.into(),
            message: format!("cannot read {path}: {err}"),
        }
    }

    fn scan_file(&self, path: &str, rules: &[&CompiledRule]) -> Result<Vec<RuleViolation>> {
        let language = Language::from_path(path);
        let applicable: Vec<&CompiledRule> = rules
            .iter()
            .copied()
            .filter(|c| c.def.applies_to(language))
            .collect();
        if applicable.is_empty() {
            trace!(engine = self.name, file = %path, %language, "no rules apply");
            return Ok(Vec::new());
        }

        let metadata = fs::metadata(path).map_err(|e| self.execution_error(path, e))?;
        if metadata.len() > MAX_FILE_BYTES {
            debug!(engine = self.name, file = %path, size = metadata.len(), "skipping large file");
            return Ok(Vec::new());
        }
        let bytes = fs::read(path).map_err(|e| self.execution_error(path, e))?;
        let Ok(content) = String::from_utf8(bytes) else {
            debug!(engine = self.name, file = %path, "skipping non-UTF-8 file");
            return Ok(Vec::new());
        };

        let mut violations = Vec::new();
        for (idx, line) in content.lines().enumerate() {
            for rule in &applicable {
                for m in rule.regex.find_iter(line).filter(|m| !m.as_str().is_empty()) {
                    let column = line[..m.start()].chars().count() + 1;
                    violations.push(RuleViolation {
                        rule_name: rule.def.name.clone(),
                        message: rule.def.message.clone(),
                        line: idx + 1,
                        column,
                        end_line: Some(idx + 1),
                        end_column: Some(column + m.as_str().chars().count()),
                        severity: rule.def.severity,
                        normalized_severity: None,
                        category: rule.def.categories.first().cloned().unwrap_or_default(),
                        url: rule.def.url.clone(),
                    });
                }
            }
        }
        violations.sort_by_key(|v| (v.line, v.column));
        Ok(violations)
    }
}

impl Engine for PatternEngine {
    fn name(&self) -> &str {
        self.name
    }

    fn init(&mut self, config: &EngineConfig) -> Result<()> {
        self.filter = match &config.target_patterns {
            Some(patterns) => FileFilter::new(patterns),
            None => FileFilter::new(self.default_target_patterns),
        };

        let mut compiled: Vec<CompiledRule> = Vec::new();
        for def in self.builtin.iter().chain(&config.custom_rules) {
            if compiled.iter().any(|c| c.def.name == def.name) {
                return Err(ScanError::EngineInit {
                    engine: self.name.into(),
                    message: format!("duplicate rule name '{}'", def.name),
                });
            }
            compiled.push(self.compile(def)?);
        }

        debug!(
            engine = self.name,
            rules = compiled.len(),
            custom = config.custom_rules.len(),
            "engine initialized"
        );
        self.compiled = compiled;
        Ok(())
    }

    fn rules(&self) -> Vec<Rule> {
        self.compiled
            .iter()
            .map(|c| c.def.to_rule(self.name))
            .collect()
    }

    fn matches_file(&self, path: &str) -> bool {
        self.filter.accepts(path)
    }

    fn run(
        &self,
        targets: &[RuleTarget],
        rules: &[&Rule],
        context: &EngineContext<'_>,
    ) -> Result<Vec<RuleResult>> {
        let selected: Vec<&CompiledRule> = self
            .compiled
            .iter()
            .filter(|c| {
                rules
                    .iter()
                    .any(|r| r.engine == self.name && r.name == c.def.name)
            })
            .collect();
        debug!(
            engine = self.name,
            rules = selected.len(),
            targets = targets.len(),
            dfa = context.run_dfa,
            options = context.engine_options.len(),
            "running pattern rules"
        );
        if selected.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut results = Vec::new();
        for path in targets.iter().flat_map(|t| &t.paths) {
            if !seen.insert(path.as_str()) {
                continue;
            }
            let violations = self.scan_file(path, &selected)?;
            if !violations.is_empty() {
                results.push(RuleResult {
                    engine: self.name.to_string(),
                    file_name: path.clone(),
                    violations,
                });
            }
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineOptions;
    use crate::target::normalize_path;
    use once_cell::sync::Lazy;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    static TEST_RULES: Lazy<Vec<PatternRule>> = Lazy::new(|| {
        vec![
            PatternRule::new("no-eval", r"\beval\s*\(", "Avoid eval()")
                .categories(&["Security"])
                .languages(&["javascript"])
                .severity(1),
            PatternRule::new("py-print", r"\bprint\s*\(", "Remove print()")
                .categories(&["Best Practices"])
                .languages(&["python"])
                .disabled_by_default(),
        ]
    });

    const JS_ONLY: &[&str] = &["**/*.js", "**/*.py"];

    fn engine() -> PatternEngine {
        let mut engine = PatternEngine::new("test", TEST_RULES.as_slice(), JS_ONLY);
        engine.init(&EngineConfig::default()).unwrap();
        engine
    }

    fn write(dir: &TempDir, rel: &str, content: &str) -> String {
        let path = dir.path().join(rel);
        std::fs::write(&path, content).unwrap();
        normalize_path(&path)
    }

    fn run(engine: &PatternEngine, paths: Vec<String>, rule_names: &[&str]) -> Vec<RuleResult> {
        let rules: Vec<Rule> = engine
            .rules()
            .into_iter()
            .filter(|r| rule_names.contains(&r.name.as_str()))
            .collect();
        let rule_refs: Vec<&Rule> = rules.iter().collect();
        let options = EngineOptions::new();
        let context = EngineContext {
            engine_options: &options,
            run_dfa: false,
            sfdx_version: None,
        };
        let targets = vec![RuleTarget {
            target: "t".into(),
            is_directory: false,
            paths,
        }];
        engine.run(&targets, &rule_refs, &context).unwrap()
    }

    #[test]
    fn reports_line_and_column() {
        let dir = TempDir::new().unwrap();
        let file = write(&dir, "a.js", "const x = 1;\n  eval(input);\n");
        let results = run(&engine(), vec![file.clone()], &["no-eval"]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_name, file);
        let v = &results[0].violations[0];
        assert_eq!((v.line, v.column), (2, 3));
        assert_eq!(v.end_column, Some(8));
        assert_eq!(v.severity, 1);
        assert_eq!(v.category, "Security");
    }

    #[test]
    fn rules_apply_only_to_their_languages() {
        let dir = TempDir::new().unwrap();
        let js = write(&dir, "a.js", "print(1)\n");
        let py = write(&dir, "b.py", "eval('1')\nprint(1)\n");
        let results = run(&engine(), vec![js, py.clone()], &["no-eval", "py-print"]);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].file_name, py);
        assert_eq!(results[0].violations.len(), 1);
        assert_eq!(results[0].violations[0].rule_name, "py-print");
    }

    #[test]
    fn only_requested_rules_run() {
        let dir = TempDir::new().unwrap();
        let py = write(&dir, "b.py", "print(1)\n");
        assert!(run(&engine(), vec![py], &["no-eval"]).is_empty());
    }

    #[test]
    fn files_shared_by_targets_are_scanned_once() {
        let dir = TempDir::new().unwrap();
        let js = write(&dir, "a.js", "eval(x)\n");
        let results = run(&engine(), vec![js.clone(), js], &["no-eval"]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn unreadable_file_is_execution_error() {
        let engine = engine();
        let options = EngineOptions::new();
        let context = EngineContext {
            engine_options: &options,
            run_dfa: false,
            sfdx_version: None,
        };
        let rules = engine.rules();
        let rule_refs: Vec<&Rule> = rules.iter().collect();
        let targets = vec![RuleTarget {
            target: "gone.js".into(),
            is_directory: false,
            paths: vec!["definitely/not/here/gone.js".into()],
        }];
        let err = engine.run(&targets, &rule_refs, &context).unwrap_err();
        assert!(matches!(err, ScanError::EngineExecution { .. }));
    }

    #[test]
    fn custom_rules_join_the_catalog() {
        let mut engine = PatternEngine::new("test", TEST_RULES.as_slice(), JS_ONLY);
        let config = EngineConfig {
            custom_rules: vec![PatternRule::new("no-alert", r"\balert\(", "Avoid alert()")],
            ..Default::default()
        };
        engine.init(&config).unwrap();
        let names: Vec<String> = engine.rules().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["no-eval", "py-print", "no-alert"]);
        assert_eq!(engine.rules()[2].metadata["pattern"], r"\balert\(");
    }

    #[test]
    fn invalid_custom_pattern_fails_init() {
        let mut engine = PatternEngine::new("test", TEST_RULES.as_slice(), JS_ONLY);
        let config = EngineConfig {
            custom_rules: vec![PatternRule::new("broken", r"(unclosed", "x")],
            ..Default::default()
        };
        let err = engine.init(&config).unwrap_err();
        assert!(matches!(err, ScanError::EngineInit { .. }));
    }

    #[test]
    fn duplicate_custom_name_fails_init() {
        let mut engine = PatternEngine::new("test", TEST_RULES.as_slice(), JS_ONLY);
        let config = EngineConfig {
            custom_rules: vec![PatternRule::new("no-eval", r"eval", "x")],
            ..Default::default()
        };
        assert!(engine.init(&config).is_err());
    }

    #[test]
    fn target_patterns_override_defaults() {
        let mut engine = PatternEngine::new("test", TEST_RULES.as_slice(), JS_ONLY);
        assert!(engine.matches_file("src/a.js"));
        engine
            .init(&EngineConfig {
                target_patterns: Some(vec!["**/*.py".into()]),
                ..Default::default()
            })
            .unwrap();
        assert!(!engine.matches_file("src/a.js"));
        assert!(engine.matches_file("src/a.py"));
    }
}
