//! Target resolution: turning raw user targets into per-engine file lists.

pub mod resolver;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

pub use resolver::{unpack_targets, NegativeGlobs};

/// One raw target after resolution for one engine. `paths` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTarget {
    /// The raw target string as supplied.
    pub target: String,
    pub is_directory: bool,
    /// Resolved files, forward-slash normalized, deduplicated.
    pub paths: Vec<String>,
}

/// Raw targets that produced at least one `RuleTarget` for any engine.
///
/// Shared by every engine's resolution pass within a single run.
#[derive(Debug, Default)]
pub struct MatchedTargets {
    inner: Mutex<BTreeSet<String>>,
}

impl MatchedTargets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, target: &str) {
        let mut set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.insert(target.to_string());
    }

    pub fn contains(&self, target: &str) -> bool {
        let set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        set.contains(target)
    }

    /// Positive raw targets that no engine matched, deduplicated, in the
    /// order they were supplied. Negative globs are never reported.
    pub fn unmatched(&self, raw_targets: &[String]) -> Vec<String> {
        let set = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let mut seen = BTreeSet::new();
        raw_targets
            .iter()
            .filter(|t| !is_negative(t))
            .filter(|t| !set.contains(t.as_str()))
            .filter(|t| seen.insert(t.to_string()))
            .cloned()
            .collect()
    }
}

/// Render a path with forward slashes regardless of host separator.
pub fn normalize_path(path: &Path) -> String {
    normalize_str(&path.to_string_lossy())
}

pub(crate) fn normalize_str(path: &str) -> String {
    if std::path::MAIN_SEPARATOR == '/' {
        path.to_string()
    } else {
        path.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

pub(crate) fn is_negative(target: &str) -> bool {
    target.starts_with('!')
}

/// Whether a target string uses glob syntax.
pub fn is_glob(target: &str) -> bool {
    target.contains(&['*', '?', '['][..])
}

/// `{a,b}` alternation, which glob matching treats as literal text.
pub(crate) fn uses_brace_alternation(target: &str) -> bool {
    target
        .find('{')
        .is_some_and(|open| target[open..].contains(','))
        && target.contains('}')
}
