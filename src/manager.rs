//! Orchestration: rule selection, per-engine target resolution, engine
//! dispatch and result recombination.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Config;
use crate::engine::{EngineContext, EngineRegistry};
use crate::error::{Result, ScanError};
use crate::events::{unmatched_targets_message, EventListener, LoggingListener, TelemetryEvent};
use crate::output::{self, OutputFormat};
use crate::rules::{RecombinedRuleResults, Rule, RuleCatalog, RuleFilter, RuleGroup, RuleResult};
use crate::target::{unpack_targets, MatchedTargets};

pub use crate::engine::EngineOptions;

/// Options for one `run_rules_matching_criteria` call.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub format: OutputFormat,
    /// Fill `normalized_severity` on every violation.
    pub normalize_severity: bool,
    /// Data-flow analysis mode, passed through to engines.
    pub run_dfa: bool,
    /// Host CLI version, passed through to engines.
    pub sfdx_version: Option<String>,
}

/// Entry point for rule queries and analysis runs.
pub struct RuleManager {
    catalog: RuleCatalog,
    engines: EngineRegistry,
    listener: Arc<dyn EventListener>,
}

impl RuleManager {
    /// Build a manager over initialized engines and a populated catalog.
    pub fn new(engines: EngineRegistry, catalog: RuleCatalog) -> Self {
        Self {
            catalog,
            engines,
            listener: Arc::new(LoggingListener),
        }
    }

    /// Register the built-in engines per `config` and build the catalog
    /// from their rules.
    pub fn from_config(config: &Config) -> Result<Self> {
        let engines = EngineRegistry::from_config(config)?;
        let catalog = RuleCatalog::init(&engines, &config.rules);
        debug!(
            engines = ?engines.names(),
            rules = catalog.len(),
            "rule manager ready"
        );
        Ok(Self::new(engines, catalog))
    }

    /// Replace the warning and telemetry listener.
    pub fn with_listener(mut self, listener: Arc<dyn EventListener>) -> Self {
        self.listener = listener;
        self
    }

    pub fn catalog(&self) -> &RuleCatalog {
        &self.catalog
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn get_rules_matching_criteria(&self, filters: &[RuleFilter]) -> Vec<&Rule> {
        self.catalog.get_rules_matching_criteria(filters)
    }

    pub fn get_rules_matching_only_explicit_criteria(&self, filters: &[RuleFilter]) -> Vec<&Rule> {
        self.catalog.get_rules_matching_only_explicit_criteria(filters)
    }

    pub fn describe_rule(&self, engine: &str, name: &str) -> Result<&Rule> {
        self.catalog.get_rule(engine, name)
    }

    /// Run every default-enabled rule matching `filters` against `targets`.
    ///
    /// Engines with no matching rules, or whose resolution leaves no files,
    /// are never invoked. Raw targets that no engine resolved are reported
    /// through a single warning. Any engine or filesystem failure aborts the
    /// whole call and nothing is emitted to telemetry.
    pub fn run_rules_matching_criteria(
        &self,
        filters: &[RuleFilter],
        targets: &[String],
        options: &RunOptions,
        engine_options: &EngineOptions,
    ) -> Result<RecombinedRuleResults> {
        let started = Instant::now();
        let groups = self.catalog.get_rule_groups_matching_filters(filters, true);
        let rule_count: usize = groups.iter().map(|g| g.rules.len()).sum();
        debug!(groups = groups.len(), rules = rule_count, "selected rules");

        let matched = MatchedTargets::new();
        let context = EngineContext {
            engine_options,
            run_dfa: options.run_dfa,
            sfdx_version: options.sfdx_version.as_deref(),
        };

        let per_engine: Vec<(String, Vec<RuleResult>)> = groups
            .par_iter()
            .map(|group| self.run_group(group, targets, &matched, &context, options))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .flatten()
            .collect();
        let invoked: Vec<String> = per_engine.iter().map(|(name, _)| name.clone()).collect();

        let unmatched = matched.unmatched(targets);
        if let Some(message) = unmatched_targets_message(&unmatched) {
            self.listener.on_warning(&message);
        }

        let mut recombined = RecombinedRuleResults::recombine(per_engine);
        if !recombined.is_empty() {
            recombined.results = output::render(&recombined.rule_results, options.format)?;
        }

        let event = TelemetryEvent {
            command: "run".into(),
            engines: invoked,
            rule_count,
            target_count: targets.len(),
            violation_count: recombined.violation_count(),
            duration_ms: started.elapsed().as_millis() as u64,
            timestamp: Utc::now(),
        };
        info!(
            engines = event.engines.len(),
            violations = event.violation_count,
            "analysis finished"
        );
        self.listener.on_telemetry(&event);

        Ok(recombined)
    }

    /// Resolve targets for one engine and run it. `None` when the engine had
    /// nothing to analyze.
    fn run_group(
        &self,
        group: &RuleGroup<'_>,
        targets: &[String],
        matched: &MatchedTargets,
        context: &EngineContext<'_>,
        options: &RunOptions,
    ) -> Result<Option<(String, Vec<RuleResult>)>> {
        let engine = self
            .engines
            .get(group.engine)
            .ok_or_else(|| ScanError::UnknownEngine(group.engine.to_string()))?;

        let rule_targets = unpack_targets(targets, |path| engine.matches_file(path), matched)?;
        if rule_targets.is_empty() {
            debug!(engine = %group.engine, "no files for engine, skipping");
            return Ok(None);
        }

        debug!(
            engine = %group.engine,
            rules = group.rules.len(),
            targets = rule_targets.len(),
            "invoking engine"
        );
        let mut results = engine.run(&rule_targets, &group.rules, context)?;

        if options.normalize_severity {
            for violation in results.iter_mut().flat_map(|r| r.violations.iter_mut()) {
                violation.normalized_severity = Some(engine.normalize_severity(violation.severity));
            }
        }

        Ok(Some((group.engine.to_string(), results)))
    }
}

impl std::fmt::Debug for RuleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleManager")
            .field("engines", &self.engines)
            .field("rules", &self.catalog.len())
            .finish()
    }
}
