use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use glob::{MatchOptions, Pattern};
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use super::{
    is_glob, is_negative, normalize_path, normalize_str, uses_brace_alternation, MatchedTargets,
    RuleTarget,
};
use crate::error::{Result, ScanError};

/// `*` never crosses a path separator; `**` does.
pub(crate) const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// The `!`-prefixed entries of a target list, compiled once and applied to
/// every positive entry.
#[derive(Debug, Clone, Default)]
pub struct NegativeGlobs {
    patterns: Vec<Pattern>,
}

impl NegativeGlobs {
    pub fn from_targets<S: AsRef<str>>(raw_targets: &[S]) -> Self {
        let patterns = raw_targets
            .iter()
            .filter_map(|t| t.as_ref().strip_prefix('!'))
            .filter_map(compile_pattern)
            .collect();
        Self { patterns }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Whether a normalized path is excluded by any pattern.
    pub fn excludes(&self, path: &str) -> bool {
        let path = strip_dot_slash(path);
        self.patterns
            .iter()
            .any(|p| p.matches_with(path, MATCH_OPTIONS))
    }
}

/// Compile one glob. Empty patterns match nothing and yield `None`; invalid
/// patterns are logged and also yield `None`.
pub(crate) fn compile_pattern(raw: &str) -> Option<Pattern> {
    let normalized = normalize_str(raw.trim());
    let pattern = strip_dot_slash(&normalized);
    if pattern.is_empty() {
        return None;
    }
    match Pattern::new(pattern) {
        Ok(p) => Some(p),
        Err(err) => {
            warn!(pattern = %raw, error = %err, "ignoring invalid glob pattern");
            None
        }
    }
}

fn strip_dot_slash(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Resolve raw targets into `RuleTarget`s for one engine.
///
/// `accepts` is the engine's file-acceptance predicate, called with
/// forward-slash normalized paths. Every positive target that yields at least
/// one file is recorded in `matched`. Targets resolving to nothing are
/// dropped. Missing paths and empty globs are not errors. Any other I/O
/// failure while resolving a target (a symlink loop, a permission error)
/// aborts resolution with `ScanError::FilesystemAccess`.
pub fn unpack_targets<F>(
    raw_targets: &[String],
    accepts: F,
    matched: &MatchedTargets,
) -> Result<Vec<RuleTarget>>
where
    F: Fn(&str) -> bool,
{
    let negatives = NegativeGlobs::from_targets(raw_targets);
    let mut resolved = Vec::new();

    for raw in raw_targets.iter().filter(|t| !is_negative(t)) {
        let (is_directory, candidates) = candidates_for(raw)?;
        let found = candidates.len();

        let mut seen = HashSet::new();
        let paths: Vec<String> = candidates
            .into_iter()
            .filter(|p| accepts(p.as_str()))
            .filter(|p| !negatives.excludes(p))
            .filter(|p| seen.insert(p.clone()))
            .collect();

        if paths.is_empty() {
            trace!(target = %raw, candidates = found, "target resolved to no files");
            continue;
        }

        matched.record(raw);
        resolved.push(RuleTarget {
            target: raw.clone(),
            is_directory,
            paths,
        });
    }

    debug!(targets = resolved.len(), "unpacked targets");
    Ok(resolved)
}

fn candidates_for(raw: &str) -> Result<(bool, Vec<String>)> {
    let path = Path::new(raw);
    match fs::metadata(path) {
        Ok(meta) if meta.is_dir() => Ok((true, walk_directory(path)?)),
        Ok(meta) if meta.is_file() => Ok((false, vec![normalize_path(path)])),
        Ok(_) => Ok((false, Vec::new())),
        Err(err) if is_glob(raw) || is_absent(&err) => {
            if uses_brace_alternation(raw) {
                warn!(
                    target = %raw,
                    "brace alternation is not supported; list each alternative as its own target"
                );
            }
            if is_glob(raw) {
                Ok((false, expand_glob(raw)?))
            } else {
                Ok((false, Vec::new()))
            }
        }
        Err(source) => Err(ScanError::FilesystemAccess {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn walk_directory(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) if err.io_error().is_some_and(is_absent) => continue,
            Err(err) => {
                let path = err.path().unwrap_or(dir).to_path_buf();
                return Err(ScanError::FilesystemAccess {
                    path,
                    source: err.into(),
                });
            }
        };
        let is_file = if entry.path_is_symlink() {
            is_regular_file(entry.path())?
        } else {
            entry.file_type().is_file()
        };
        if is_file {
            files.push(normalize_path(entry.path()));
        }
    }
    Ok(files)
}

fn expand_glob(pattern: &str) -> Result<Vec<String>> {
    let entries = match glob::glob_with(pattern, MATCH_OPTIONS) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(target = %pattern, error = %err, "invalid glob target");
            return Ok(Vec::new());
        }
    };

    let mut files = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => {
                if is_regular_file(&path)? {
                    files.push(normalize_path(&path));
                }
            }
            Err(err) if is_absent(err.error()) => continue,
            Err(err) => {
                let path = err.path().to_path_buf();
                return Err(ScanError::FilesystemAccess {
                    path,
                    source: err.into_error(),
                });
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Follows symlinks. A dangling link is not a file; any other stat failure
/// is an access error.
fn is_regular_file(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.is_file()),
        Err(err) if is_absent(&err) => Ok(false),
        Err(source) => Err(ScanError::FilesystemAccess {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Not-found, or a path component that is not a directory (`a.js/x`).
fn is_absent(err: &io::Error) -> bool {
    const ENOTDIR: i32 = 20;
    err.kind() == io::ErrorKind::NotFound
        || (cfg!(unix) && err.raw_os_error() == Some(ENOTDIR))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for rel in files {
            let path = dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "// content\n").unwrap();
        }
        dir
    }

    fn raw(dir: &TempDir, rel: &str) -> String {
        normalize_path(&dir.path().join(rel))
    }

    fn js_only(path: &str) -> bool {
        path.ends_with(".js")
    }

    #[test]
    fn negative_glob_excludes_matching_target() {
        let dir = tree(&["a.js", "dir/b/f.js"]);
        let targets = vec![
            raw(&dir, "a.js"),
            "!**/b/**/*".to_string(),
            raw(&dir, "dir/b/f.js"),
        ];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert_eq!(
            resolved,
            vec![RuleTarget {
                target: raw(&dir, "a.js"),
                is_directory: false,
                paths: vec![raw(&dir, "a.js")],
            }]
        );
        assert!(matched.contains(&raw(&dir, "a.js")));
        assert!(!matched.contains(&raw(&dir, "dir/b/f.js")));
    }

    #[test]
    fn directory_walks_recursively_in_name_order() {
        let dir = tree(&["src/z.js", "src/a.js", "src/nested/m.js", "src/readme.md"]);
        let targets = vec![raw(&dir, "src")];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].is_directory);
        assert_eq!(
            resolved[0].paths,
            vec![
                raw(&dir, "src/a.js"),
                raw(&dir, "src/nested/m.js"),
                raw(&dir, "src/z.js"),
            ]
        );
    }

    #[test]
    fn glob_expands_and_filters() {
        let dir = tree(&["lib/one.js", "lib/deep/two.js", "lib/three.ts"]);
        let targets = vec![format!("{}/**/*.js", normalize_path(dir.path()))];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, |_| true, &matched).unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(!resolved[0].is_directory);
        assert_eq!(
            resolved[0].paths,
            vec![raw(&dir, "lib/deep/two.js"), raw(&dir, "lib/one.js")]
        );
        assert!(matched.contains(&targets[0]));
    }

    #[test]
    fn glob_matching_nothing_is_dropped() {
        let dir = tree(&["a.js"]);
        let targets = vec![format!("{}/**/*.py", normalize_path(dir.path()))];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, |_| true, &matched).unwrap();

        assert!(resolved.is_empty());
        assert_eq!(matched.unmatched(&targets), targets);
    }

    #[test]
    fn missing_paths_are_not_errors() {
        let dir = tree(&[]);
        let targets = vec![raw(&dir, "does-not-exist.js"), raw(&dir, "no-such-dir/")];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, |_| true, &matched).unwrap();

        assert!(resolved.is_empty());
        assert_eq!(matched.unmatched(&targets).len(), 2);
    }

    #[test]
    fn engine_rejection_drops_target() {
        let dir = tree(&["styles.css"]);
        let targets = vec![raw(&dir, "styles.css")];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert!(resolved.is_empty());
        assert!(!matched.contains(&targets[0]));
    }

    #[test]
    fn directory_fully_excluded_is_dropped() {
        let dir = tree(&["gen/a.js", "gen/b.js"]);
        let targets = vec![raw(&dir, "gen"), "!**/gen/**".to_string()];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert!(resolved.is_empty());
        assert_eq!(matched.unmatched(&targets), vec![raw(&dir, "gen")]);
    }

    #[test]
    fn negative_position_is_irrelevant() {
        let dir = tree(&["src/a.js", "src/test/a.test.js", "src/b.js"]);
        let exclusion = "!**/test/**".to_string();
        let orders = [
            vec![exclusion.clone(), raw(&dir, "src")],
            vec![raw(&dir, "src"), exclusion.clone()],
        ];

        let results: Vec<Vec<RuleTarget>> = orders
            .iter()
            .map(|targets| unpack_targets(targets, js_only, &MatchedTargets::new()).unwrap())
            .collect();

        assert_eq!(results[0], results[1]);
        assert_eq!(
            results[0][0].paths,
            vec![raw(&dir, "src/a.js"), raw(&dir, "src/b.js")]
        );
    }

    #[test]
    fn degenerate_negative_glob_is_inert() {
        let dir = tree(&["a.js"]);
        let targets = vec!["!".to_string(), raw(&dir, "a.js"), "!   ".to_string()];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert_eq!(resolved.len(), 1);
        assert!(NegativeGlobs::from_targets(&["!"]).is_empty());
    }

    #[test]
    fn resolution_is_idempotent() {
        let dir = tree(&["a/x.js", "a/y.js", "b/z.js"]);
        let targets = vec![
            raw(&dir, "a"),
            format!("{}/b/*.js", normalize_path(dir.path())),
        ];

        let first = unpack_targets(&targets, js_only, &MatchedTargets::new()).unwrap();
        let second = unpack_targets(&targets, js_only, &MatchedTargets::new()).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn output_follows_raw_target_order() {
        let dir = tree(&["b.js", "a.js"]);
        let targets = vec![raw(&dir, "b.js"), raw(&dir, "a.js")];

        let resolved = unpack_targets(&targets, js_only, &MatchedTargets::new()).unwrap();

        let names: Vec<&str> = resolved.iter().map(|t| t.target.as_str()).collect();
        assert_eq!(names, vec![targets[0].as_str(), targets[1].as_str()]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_target_is_an_access_error() {
        let dir = tree(&[]);
        let looped = dir.path().join("loop");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let targets = vec![normalize_path(&looped)];
        let matched = MatchedTargets::new();

        let err = unpack_targets(&targets, |_| true, &matched).unwrap_err();

        match err {
            ScanError::FilesystemAccess { path, .. } => assert_eq!(path, looped),
            other => panic!("expected FilesystemAccess, got {other:?}"),
        }
        assert!(!matched.contains(&targets[0]));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_inside_walked_directory_is_an_access_error() {
        let dir = tree(&["src/a.js"]);
        let looped = dir.path().join("src/loop");
        std::os::unix::fs::symlink(&looped, &looped).unwrap();
        let targets = vec![raw(&dir, "src")];

        let err = unpack_targets(&targets, |_| true, &MatchedTargets::new()).unwrap_err();

        assert!(matches!(err, ScanError::FilesystemAccess { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_skipped() {
        let dir = tree(&["src/a.js"]);
        std::os::unix::fs::symlink(dir.path().join("gone.js"), dir.path().join("src/b.js")).unwrap();
        let targets = vec![raw(&dir, "src"), raw(&dir, "src/b.js")];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, js_only, &matched).unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].paths, vec![raw(&dir, "src/a.js")]);
        assert_eq!(matched.unmatched(&targets), vec![raw(&dir, "src/b.js")]);
    }

    #[test]
    fn path_through_a_file_is_missing() {
        let dir = tree(&["a.js"]);
        let targets = vec![raw(&dir, "a.js/inner.js")];

        let resolved = unpack_targets(&targets, |_| true, &MatchedTargets::new()).unwrap();

        assert!(resolved.is_empty());
    }

    #[test]
    fn brace_alternation_matches_nothing() {
        let dir = tree(&["src/a.js", "src/b.ts"]);
        let targets = vec![format!("{}/src/*.{{js,ts}}", normalize_path(dir.path()))];
        let matched = MatchedTargets::new();

        let resolved = unpack_targets(&targets, |_| true, &matched).unwrap();

        assert!(resolved.is_empty());
        assert_eq!(matched.unmatched(&targets), targets);
    }

    #[test]
    fn negative_glob_matches_relative_paths() {
        let negatives = NegativeGlobs::from_targets(&["!./dir/b/*.js"]);
        assert!(negatives.excludes("dir/b/f.js"));
        assert!(negatives.excludes("./dir/b/f.js"));
        assert!(!negatives.excludes("dir/b/nested/f.js"));
    }
}
