//! Artifact path patterns used by `remove`.
//!
//! Patterns are matched against `/`-separated paths relative to the project
//! root. `*` and `?` stay within one path segment; `**/` spans any number of
//! directories (including none).

use std::path::{Component, Path};

use regex::Regex;

use crate::error::PatternError;

#[derive(Debug, Clone)]
pub enum ArtifactPattern {
    /// Plain relative path, removed directly without walking the tree.
    Literal(String),
    Glob { source: String, regex: Regex },
}

impl ArtifactPattern {
    /// Parse a pattern. Empty, absolute and `..` paths are rejected so a
    /// removal can never reach outside the project root.
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let normalized = normalize(pattern);
        if !stays_inside_root(&normalized) {
            return Err(PatternError::OutsideRoot);
        }
        if !normalized.contains(['*', '?']) {
            return Ok(ArtifactPattern::Literal(normalized));
        }
        let regex = Regex::new(&glob_to_regex(&normalized))?;
        Ok(ArtifactPattern::Glob {
            source: normalized,
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            ArtifactPattern::Literal(path) => path,
            ArtifactPattern::Glob { source, .. } => source,
        }
    }

    /// True if the relative path `rel` is matched.
    pub fn matches(&self, rel: &str) -> bool {
        match self {
            ArtifactPattern::Literal(path) => path == rel,
            ArtifactPattern::Glob { regex, .. } => regex.is_match(rel),
        }
    }
}

fn stays_inside_root(pattern: &str) -> bool {
    let path = Path::new(pattern);
    !pattern.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
}

fn normalize(pattern: &str) -> String {
    let trimmed = pattern.trim().replace('\\', "/");
    let trimmed = trimmed.strip_prefix("./").unwrap_or(&trimmed);
    trimmed.trim_end_matches('/').to_string()
}

fn glob_to_regex(glob: &str) -> String {
    let mut out = String::from("^");
    let chars: Vec<char> = glob.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            '*' if chars.get(i + 1) == Some(&'*') => {
                if chars.get(i + 2) == Some(&'/') {
                    out.push_str("(?:.*/)?");
                    i += 3;
                } else {
                    out.push_str(".*");
                    i += 2;
                }
                continue;
            }
            '*' => out.push_str("[^/]*"),
            '?' => out.push_str("[^/]"),
            c => out.push_str(&regex::escape(&c.to_string())),
        }
        i += 1;
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glob(pattern: &str) -> ArtifactPattern {
        ArtifactPattern::parse(pattern).expect("pattern")
    }

    #[test]
    fn plain_paths_are_literal() {
        assert!(matches!(glob("./build/"), ArtifactPattern::Literal(path) if path == "build"));
        assert!(glob(".venv").matches(".venv"));
        assert!(!glob(".venv").matches("src/.venv"));
    }

    #[test]
    fn paths_outside_root_are_rejected() {
        for pattern in ["", ".", "./", "/tmp/x", "../sibling", "build/../../x"] {
            assert!(
                matches!(ArtifactPattern::parse(pattern), Err(PatternError::OutsideRoot)),
                "{pattern:?} should be rejected"
            );
        }
    }

    #[test]
    fn star_stays_in_one_segment() {
        let pattern = glob("*.egg-info");
        assert!(pattern.matches("contriboo.egg-info"));
        assert!(!pattern.matches("src/contriboo.egg-info"));
    }

    #[test]
    fn double_star_spans_directories() {
        let pattern = glob("**/__pycache__");
        assert!(pattern.matches("__pycache__"));
        assert!(pattern.matches("src/contriboo/__pycache__"));
        assert!(!pattern.matches("src/__pycache__x"));

        let pyc = glob("**/*.pyc");
        assert!(pyc.matches("tests/test_settings.cpython-312.pyc"));
        assert!(!pyc.matches("tests/test_settings.py"));
    }

    #[test]
    fn regex_metacharacters_are_escaped() {
        let pattern = glob("cov(?).[ch]*");
        assert!(pattern.matches("cov(1).[ch]tml"));
        assert!(!pattern.matches("cov1.c"));
    }
}
