// Copyright 2026 the Tendril Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path patterns.
//!
//! A pattern is literal text with `:name` segments. Literal text matches
//! itself; a `:name` segment matches one or more characters up to the next
//! `/` and captures them under `name`. Matching is always anchored at the
//! start of the path. An *exact* pattern must also consume the whole path;
//! otherwise it matches any path it is a prefix of, and the rest is handed to
//! child routes.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use regex::Regex;

use crate::error::PatternError;

/// Captured parameters by name.
pub type Params = BTreeMap<String, String>;

/// A successful prefix match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathMatch {
    /// Bytes of the path consumed by the pattern.
    pub consumed: usize,
    /// Captured parameters.
    pub params: Params,
}

/// A compiled path pattern.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    exact: bool,
    regex: Regex,
    params: Vec<String>,
}

impl Pattern {
    /// Compiles `path`. Parameter names must be identifiers and unique.
    pub fn compile(path: &str, exact: bool) -> Result<Self, PatternError> {
        Self::build(path, exact, false)
    }

    /// Compiles the fully-qualified pattern for a route whose ancestors'
    /// patterns concatenate to `prefix`. It is exact if `own` is.
    ///
    /// Ancestors may reuse a child's parameter names; only the trailing
    /// groups belonging to `own` are reported by
    /// [`match_own`](Self::match_own).
    pub(crate) fn qualified(prefix: &str, own: &Self) -> Result<Self, PatternError> {
        let mut path = String::with_capacity(prefix.len() + own.source.len());
        path.push_str(prefix);
        path.push_str(&own.source);
        Self::build(&path, own.exact, true)
    }

    fn build(path: &str, exact: bool, allow_repeats: bool) -> Result<Self, PatternError> {
        let mut expr = String::from("^");
        let mut params: Vec<String> = Vec::new();
        let mut rest = path;
        while let Some(colon) = rest.find(':') {
            expr.push_str(&regex::escape(&rest[..colon]));
            let after = &rest[colon + 1..];
            let end = after.find('/').unwrap_or(after.len());
            let name = &after[..end];
            if !is_identifier(name) {
                return Err(PatternError::InvalidParam {
                    path: path.to_owned(),
                    name: name.to_owned(),
                });
            }
            if !allow_repeats && params.iter().any(|p| p == name) {
                return Err(PatternError::DuplicateParam {
                    path: path.to_owned(),
                    name: name.to_owned(),
                });
            }
            expr.push_str("([^/]+)");
            params.push(name.to_owned());
            rest = &after[end..];
        }
        expr.push_str(&regex::escape(rest));
        if exact {
            expr.push('$');
        }
        let regex = Regex::new(&expr).map_err(|e| PatternError::Regex(e.to_string()))?;
        Ok(Self {
            source: path.to_owned(),
            exact,
            regex,
            params,
        })
    }

    /// Returns the pattern text as written.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns whether the pattern must consume the whole path.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.exact
    }

    /// Returns the parameter names, in order of appearance.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Returns the generated regular expression (for diagnostics).
    #[must_use]
    pub fn expression(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches the start of `path`.
    #[must_use]
    pub fn match_prefix(&self, path: &str) -> Option<PathMatch> {
        self.match_tail(path, self.params.len())
    }

    /// Matches the start of `path`, reporting only the last `own` parameters.
    #[must_use]
    pub(crate) fn match_own(&self, path: &str, own: usize) -> Option<PathMatch> {
        self.match_tail(path, own)
    }

    fn match_tail(&self, path: &str, keep: usize) -> Option<PathMatch> {
        let caps = self.regex.captures(path)?;
        let consumed = caps.get(0).map_or(0, |m| m.end());
        let skip = self.params.len().saturating_sub(keep);
        let params = self
            .params
            .iter()
            .enumerate()
            .skip(skip)
            .filter_map(|(i, name)| {
                caps.get(i + 1)
                    .map(|m| (name.clone(), m.as_str().to_owned()))
            })
            .collect();
        Some(PathMatch { consumed, params })
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl std::fmt::Display for Pattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)?;
        if self.exact {
            f.write_char('$')?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn exact_user_pattern() {
        let p = Pattern::compile("/users/:id", true).unwrap();
        let m = p.match_prefix("/users/42").expect("should match");
        assert_eq!(m.params, params(&[("id", "42")]));
        assert_eq!(m.consumed, "/users/42".len());
        assert!(p.match_prefix("/users").is_none(), "missing segment");
        assert!(p.match_prefix("/users/42/edit").is_none(), "trailing segment");
    }

    #[test]
    fn prefix_match_leaves_the_rest() {
        let p = Pattern::compile("/pages", false).unwrap();
        let m = p.match_prefix("/pages/2").unwrap();
        assert_eq!(&"/pages/2"[m.consumed..], "/2");
        assert!(m.params.is_empty());
        assert!(p.match_prefix("/about").is_none());
    }

    #[test]
    fn empty_pattern_matches_everything() {
        let p = Pattern::compile("", false).unwrap();
        assert_eq!(p.match_prefix("/x/y").unwrap().consumed, 0);
        assert_eq!(p.match_prefix("").unwrap().consumed, 0);
        let exact = Pattern::compile("", true).unwrap();
        assert!(exact.match_prefix("").is_some());
        assert!(exact.match_prefix("/").is_none());
    }

    #[test]
    fn literal_text_is_escaped() {
        let p = Pattern::compile("/a.b+(c)", true).unwrap();
        assert!(p.match_prefix("/a.b+(c)").is_some());
        assert!(p.match_prefix("/axbb(c)").is_none());
    }

    #[test]
    fn several_params() {
        let p = Pattern::compile("/:org/repos/:repo", false).unwrap();
        let m = p.match_prefix("/linebender/repos/vello/issues").unwrap();
        assert_eq!(m.params, params(&[("org", "linebender"), ("repo", "vello")]));
        assert_eq!(p.params(), ["org", "repo"]);
    }

    #[test]
    fn invalid_names_are_rejected() {
        assert!(matches!(
            Pattern::compile("/users/:", true),
            Err(PatternError::InvalidParam { .. })
        ));
        assert!(matches!(
            Pattern::compile("/users/:1st", true),
            Err(PatternError::InvalidParam { .. })
        ));
        assert!(matches!(
            Pattern::compile("/:id/:id", true),
            Err(PatternError::DuplicateParam { .. })
        ));
    }

    #[test]
    fn qualified_pattern_reports_own_params_only() {
        let own = Pattern::compile("/posts/:id", true).unwrap();
        let q = Pattern::qualified("/users/:id", &own).unwrap();
        assert!(q.is_exact());
        let m = q.match_own("/users/1/posts/2", own.params().len()).unwrap();
        assert_eq!(m.params, params(&[("id", "2")]));
        assert_eq!(m.consumed, "/users/1/posts/2".len());
        assert!(q.match_own("/users/1/posts/2/edit", 1).is_none());
    }
}
