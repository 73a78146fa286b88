//! Glob matching for checkout-relative paths
//!
//! Preserve rules and content excludes share the same semantics: patterns
//! are matched against paths relative to the checkout root, `*` and `?`
//! stay within one path component, `**` spans directories.

use std::path::Path;

use glob::{MatchOptions, Pattern};

use crate::{Error, Result};

/// A compiled set of glob patterns.
///
/// A path matches the set if it matches any one pattern.
#[derive(Debug, Clone, Default)]
pub struct PathMatcher {
    patterns: Vec<Pattern>,
}

impl PathMatcher {
    /// Compile a set of glob patterns.
    ///
    /// Fails with a configuration error on the first malformed pattern.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                Pattern::new(p.as_ref())
                    .map_err(|e| Error::Config(format!("Invalid glob pattern '{}': {}", p.as_ref(), e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Whether the set contains no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Match a checkout-relative path against the set.
    pub fn matches(&self, relative: &Path) -> bool {
        let options = Self::options();
        self.patterns
            .iter()
            .any(|p| p.matches_path_with(relative, options))
    }

    fn options() -> MatchOptions {
        MatchOptions {
            case_sensitive: true,
            // `*` and `?` must not cross directory boundaries; `**` does
            require_literal_separator: true,
            // dotfiles like .nojekyll are matchable by wildcards
            require_literal_leading_dot: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn matcher(patterns: &[&str]) -> PathMatcher {
        PathMatcher::new(patterns).unwrap()
    }

    #[test]
    fn test_empty_set_matches_nothing() {
        let m = PathMatcher::new(Vec::<String>::new()).unwrap();
        assert!(m.is_empty());
        assert!(!m.matches(Path::new("anything.txt")));
    }

    #[test]
    fn test_double_star_spans_directories() {
        let m = matcher(&["**/.nojekyll"]);
        assert!(m.matches(Path::new(".nojekyll")));
        assert!(m.matches(Path::new("docs/.nojekyll")));
        assert!(m.matches(Path::new("a/b/c/.nojekyll")));
        assert!(!m.matches(Path::new("nojekyll")));
    }

    #[test]
    fn test_single_star_stays_in_component() {
        let m = matcher(&["*.log"]);
        assert!(m.matches(Path::new("tmp.log")));
        assert!(!m.matches(Path::new("sub/tmp.log")));
    }

    #[test]
    fn test_directory_subtree_pattern() {
        let m = matcher(&["docs/**"]);
        assert!(m.matches(Path::new("docs/index.html")));
        assert!(m.matches(Path::new("docs/api/types.html")));
        assert!(!m.matches(Path::new("other/index.html")));
    }

    #[test]
    fn test_question_mark_single_char() {
        let m = matcher(&["v?.txt"]);
        assert!(m.matches(Path::new("v1.txt")));
        assert!(!m.matches(Path::new("v12.txt")));
    }

    #[test]
    fn test_any_pattern_matches() {
        let m = matcher(&["*.log", "CNAME"]);
        assert!(m.matches(Path::new("CNAME")));
        assert!(m.matches(Path::new("build.log")));
        assert!(!m.matches(Path::new("index.html")));
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let result = PathMatcher::new(["[unclosed"]);
        assert!(matches!(result, Err(crate::Error::Config(_))));
    }
}
