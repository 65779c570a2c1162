pub mod builtin;
pub mod file_filter;
pub mod language;
pub mod pattern;

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::{Config, EngineConfig};
use crate::error::Result;
use crate::rules::{Rule, RuleResult, Severity};
use crate::target::RuleTarget;

pub use file_filter::FileFilter;
pub use language::Language;
pub use pattern::{PatternEngine, PatternRule};

/// Opaque `name -> value` options passed through to every invoked engine.
pub type EngineOptions = BTreeMap<String, String>;

/// Per-run settings handed to an engine invocation.
#[derive(Debug, Clone, Copy)]
pub struct EngineContext<'a> {
    pub engine_options: &'a EngineOptions,
    /// Data-flow analysis mode, for engines that support it.
    pub run_dfa: bool,
    /// Host CLI version, for engines that care.
    pub sfdx_version: Option<&'a str>,
}

/// An analysis engine: publishes rules, decides which files it analyzes, and
/// runs a rule subset over resolved targets.
pub trait Engine: Send + Sync {
    /// Unique engine name, used as the rule grouping key.
    fn name(&self) -> &str;

    /// Prepare the engine before any other call.
    fn init(&mut self, config: &EngineConfig) -> Result<()>;

    /// Every rule this engine can run.
    fn rules(&self) -> Vec<Rule>;

    /// Whether this engine would ever analyze the given normalized path.
    fn matches_file(&self, path: &str) -> bool;

    /// Run `rules` over the files in `targets`.
    fn run(
        &self,
        targets: &[RuleTarget],
        rules: &[&Rule],
        context: &EngineContext<'_>,
    ) -> Result<Vec<RuleResult>>;

    /// Map an engine-native severity onto the common scale.
    fn normalize_severity(&self, severity: u8) -> Severity {
        Severity::from_engine_level(severity)
    }

    /// Whether this engine performs data-flow analysis.
    fn is_dfa(&self) -> bool {
        false
    }
}

/// The initialized engines available to a run, in registration order.
pub struct EngineRegistry {
    engines: Vec<Box<dyn Engine>>,
}

impl EngineRegistry {
    /// Wrap engines that are already initialized.
    pub fn new(engines: Vec<Box<dyn Engine>>) -> Self {
        Self { engines }
    }

    /// Instantiate the built-in engines, skipping the ones disabled in config
    /// and initializing the rest.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut engines = Vec::new();

        for mut engine in builtin::all_engines() {
            let engine_config = config
                .engines
                .get(engine.name())
                .cloned()
                .unwrap_or_default();
            if engine_config.disabled {
                debug!(engine = %engine.name(), "engine disabled by config");
                continue;
            }
            engine.init(&engine_config)?;
            engines.push(engine);
        }

        for name in config.engines.keys() {
            let known = engines.iter().any(|e| e.name() == name.as_str());
            if !known && !config.engines[name].disabled {
                warn!(engine = %name, "config names an unknown engine");
            }
        }

        Ok(Self { engines })
    }

    pub fn engines(&self) -> &[Box<dyn Engine>] {
        &self.engines
    }

    pub fn get(&self, name: &str) -> Option<&dyn Engine> {
        self.engines
            .iter()
            .find(|e| e.name() == name)
            .map(|e| &**e)
    }

    pub fn names(&self) -> Vec<&str> {
        self.engines.iter().map(|e| e.name()).collect()
    }
}

impl std::fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineRegistry")
            .field("engines", &self.names())
            .finish()
    }
}
