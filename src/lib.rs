//! codeanalyzer: static-analysis orchestrator.
//!
//! Selects rules from a catalog by category, ruleset, engine and language,
//! resolves file, directory and glob targets (including `!` negative globs)
//! into per-engine file lists, runs the engines and recombines their
//! violations into one result set.
//!
//! # Quick Start
//!
//! ```no_run
//! use codeanalyzer::{Config, EngineOptions, RuleFilter, RuleManager, RunOptions};
//!
//! let manager = RuleManager::from_config(&Config::default()).unwrap();
//! let filters = [RuleFilter::category(["Security"])];
//! let targets = vec!["src".to_string(), "!**/generated/**".to_string()];
//! let results = manager
//!     .run_rules_matching_criteria(&filters, &targets, &RunOptions::default(), &EngineOptions::new())
//!     .unwrap();
//! println!("{}", results.results);
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod manager;
pub mod output;
pub mod rules;
pub mod target;

pub use config::Config;
pub use error::{Result, ScanError};
pub use events::{EventListener, LoggingListener, TelemetryEvent};
pub use manager::{EngineOptions, RuleManager, RunOptions};
pub use output::OutputFormat;
pub use rules::{FilterKind, RecombinedRuleResults, Rule, RuleFilter, Severity};
pub use target::{unpack_targets, MatchedTargets, RuleTarget};
