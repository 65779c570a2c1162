use glob::Pattern;

use crate::target::resolver::{compile_pattern, MATCH_OPTIONS};
use crate::target::NegativeGlobs;

/// An engine's file-acceptance predicate, built from target patterns in the
/// same syntax as user targets: plain globs include, `!` globs exclude.
///
/// With no include patterns every path not excluded is accepted.
#[derive(Debug, Clone, Default)]
pub struct FileFilter {
    includes: Vec<Pattern>,
    excludes: NegativeGlobs,
}

impl FileFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        let includes = patterns
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| !p.starts_with('!'))
            .filter_map(compile_pattern)
            .collect();
        Self {
            includes,
            excludes: NegativeGlobs::from_targets(patterns),
        }
    }

    pub fn accepts(&self, path: &str) -> bool {
        let path = path.strip_prefix("./").unwrap_or(path);
        let included = self.includes.is_empty()
            || self
                .includes
                .iter()
                .any(|p| p.matches_with(path, MATCH_OPTIONS));
        included && !self.excludes.excludes(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_patterns_match_at_any_depth() {
        let filter = FileFilter::new(&["**/*.js", "**/*.ts"]);
        assert!(filter.accepts("a.js"));
        assert!(filter.accepts("./src/deep/b.ts"));
        assert!(filter.accepts("/abs/path/c.js"));
        assert!(!filter.accepts("src/style.css"));
    }

    #[test]
    fn exclusions_apply_after_inclusions() {
        let filter = FileFilter::new(&["**/*.js", "!**/node_modules/**"]);
        assert!(filter.accepts("src/index.js"));
        assert!(!filter.accepts("node_modules/lib/index.js"));
        assert!(!filter.accepts("/repo/node_modules/lib/index.js"));
    }

    #[test]
    fn exclusions_only_accept_everything_else() {
        let filter = FileFilter::new(&["!**/*.png"]);
        assert!(filter.accepts("README.md"));
        assert!(!filter.accepts("img/logo.png"));
    }
}
