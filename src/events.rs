//! Warning and telemetry channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Completion record emitted once per successful run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub command: String,
    /// Engines that were invoked.
    pub engines: Vec<String>,
    pub rule_count: usize,
    pub target_count: usize,
    pub violation_count: usize,
    pub duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

/// Receives the notifications a run produces.
pub trait EventListener: Send + Sync {
    fn on_warning(&self, message: &str);

    fn on_telemetry(&self, event: &TelemetryEvent);
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingListener;

impl EventListener for LoggingListener {
    fn on_warning(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn on_telemetry(&self, event: &TelemetryEvent) {
        tracing::info!(
            command = %event.command,
            engines = ?event.engines,
            rules = event.rule_count,
            targets = event.target_count,
            violations = event.violation_count,
            duration_ms = event.duration_ms,
            "run complete"
        );
    }
}

/// Warning text for targets no engine processed, or `None` if there are none.
pub fn unmatched_targets_message(unmatched: &[String]) -> Option<String> {
    match unmatched {
        [] => None,
        [single] => Some(format!(
            "The following target wasn't processed by any engine: {single}."
        )),
        many => Some(format!(
            "The following targets weren't processed by any engine: {}.",
            many.join(", ")
        )),
    }
}
