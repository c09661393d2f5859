// File: src/matcher.rs
// Purpose: Segment matching, consumed-prefix derivation and the match capability

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::context::Params;
use crate::error::PatternSyntaxError;
use crate::pattern::regexp::{ROUTE_GROUP, TRAIL_GROUP};
use crate::pattern::{CompileOptions, Pattern, Token};

// ============================================================================
// Match Result
// ============================================================================

/// Result of a successful match
///
/// Created fresh for every match attempt and never mutated afterwards.
/// A path that does not match produces no `MatchResult` at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Index 0 is the full match text, then one entry per parameter group
    /// (`None` when the group did not participate)
    pub captures: Vec<Option<String>>,
    /// Start offset of the match in `input` (matching is anchored, so always 0)
    pub index: usize,
    /// The path the pattern was run against
    pub input: String,
    /// Captured parameters; groups that did not participate or captured an
    /// empty string are omitted
    pub params: Params,
    /// Static prefix handed to descendants as their accumulated path, in
    /// pattern source form (metacharacters escaped)
    pub consumed: String,
}

impl MatchResult {
    /// Full text matched by the pattern
    pub fn matched_text(&self) -> &str {
        self.captures
            .first()
            .and_then(|c| c.as_deref())
            .unwrap_or_default()
    }

    /// Part of the input left over after the matched text
    pub fn remainder(&self) -> &str {
        &self.input[self.index + self.matched_text().len()..]
    }

    /// Looks up a parameter by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

// ============================================================================
// Segment Matching
// ============================================================================

/// Derives the consumed prefix from a pattern's static structure (pure function)
///
/// The prefix never depends on the matched values, so re-matching the same
/// pattern against another path hands descendants the same baseline.
///
/// - Leading literal: the literal, plus the prefix of an immediately
///   following key (`/child1/:c1` → `/child1/`)
/// - Leading key: the key's own prefix (`/:child` → `/`, `(/child)` → empty)
/// - Anything else: the empty string
///
/// Descendants append their own pattern to this prefix, so literal text is
/// re-escaped (`/a\(b\)` stays `/a\(b\)`).
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::{consumed_prefix, pattern::parse};
///
/// assert_eq!(consumed_prefix(&parse("/child1/:c1/:index").unwrap()), "/child1/");
/// assert_eq!(consumed_prefix(&parse("/child1/child2/").unwrap()), "/child1/child2/");
/// assert_eq!(consumed_prefix(&parse("/:child1").unwrap()), "/");
/// ```
pub fn consumed_prefix(tokens: &[Token]) -> String {
    match tokens {
        [Token::Literal(text), Token::Key(key), ..] => format!("{}{}", escape_source(text), escape_source(&key.prefix)),
        [Token::Literal(text), ..] => escape_source(text),
        [Token::Key(key), ..] => escape_source(&key.prefix),
        _ => String::new(),
    }
}

/// Escapes characters the pattern lexer treats as syntax
fn escape_source(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, ':' | '(' | ')' | '{' | '}' | '?' | '*' | '+' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Matches a compiled pattern against a path
///
/// Anchored at the start of `path`; trailing text beyond a segment boundary is
/// allowed unless the pattern was compiled with `end`.
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::{match_path, Pattern};
///
/// let pattern = Pattern::compile("/path/:id").unwrap();
///
/// let found = match_path(&pattern, "/path/1/more").unwrap();
/// assert_eq!(found.param("id"), Some("1"));
/// assert_eq!(found.matched_text(), "/path/1");
/// assert_eq!(found.remainder(), "/more");
///
/// assert!(match_path(&pattern, "/other/1").is_none());
/// ```
pub fn match_path(pattern: &Pattern, path: &str) -> Option<MatchResult> {
    let caps = pattern.regex().captures(path)?;

    // Both groups are part of every recognizer; `route` always participates
    let route_end = caps.name(ROUTE_GROUP).map(|m| m.end()).unwrap_or(0);
    let full_end = caps.name(TRAIL_GROUP).map(|m| m.end()).unwrap_or(route_end);

    let values: Vec<Option<String>> = pattern
        .group_names()
        .iter()
        .map(|group| caps.name(group).map(|m| m.as_str().to_string()))
        .collect();

    let params: Params = pattern
        .keys()
        .iter()
        .zip(&values)
        .filter_map(|(key, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (key.name.clone(), v.to_string()))
        })
        .collect();

    let mut captures = Vec::with_capacity(values.len() + 1);
    captures.push(Some(path[..full_end].to_string()));
    captures.extend(values);

    Some(MatchResult {
        captures,
        index: 0,
        input: path.to_string(),
        params,
        consumed: pattern.consumed_prefix().to_string(),
    })
}

// ============================================================================
// Match Capability
// ============================================================================

/// The match capability a router hands to its routes
///
/// `pattern` is the full route pattern (accumulated prefix plus the route's
/// own pattern); `path` is the current path snapshot of the render pass.
pub trait Matcher {
    fn match_route(&self, pattern: &str, path: &str) -> Result<Option<MatchResult>, PatternSyntaxError>;
}

impl<F> Matcher for F
where
    F: Fn(&str, &str) -> Result<Option<MatchResult>, PatternSyntaxError>,
{
    fn match_route(&self, pattern: &str, path: &str) -> Result<Option<MatchResult>, PatternSyntaxError> {
        self(pattern, path)
    }
}

/// Default matcher: pattern compiler + segment matcher with a compile cache
///
/// Each distinct pattern string is compiled once per matcher instance.
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::{Matcher, PatternMatcher};
///
/// let matcher = PatternMatcher::new();
/// let found = matcher.match_route("/users/:id", "/users/42").unwrap().unwrap();
/// assert_eq!(found.param("id"), Some("42"));
/// assert_eq!(matcher.cached_patterns(), 1);
/// ```
#[derive(Debug, Default)]
pub struct PatternMatcher {
    options: CompileOptions,
    cache: RefCell<HashMap<String, Rc<Pattern>>>,
}

impl PatternMatcher {
    /// Creates a matcher with default compile options
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a matcher with explicit compile options
    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compiles `source`, reusing a cached pattern when available
    pub fn compile(&self, source: &str) -> Result<Rc<Pattern>, PatternSyntaxError> {
        if let Some(pattern) = self.cache.borrow().get(source) {
            trace!(pattern = source, "pattern cache hit");
            return Ok(Rc::clone(pattern));
        }

        let pattern = Rc::new(Pattern::compile_with(source, &self.options)?);
        self.cache
            .borrow_mut()
            .insert(source.to_string(), Rc::clone(&pattern));
        trace!(pattern = source, regex = pattern.regex().as_str(), "pattern compiled");
        Ok(pattern)
    }

    /// Number of distinct patterns compiled so far
    pub fn cached_patterns(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

impl Matcher for PatternMatcher {
    fn match_route(&self, pattern: &str, path: &str) -> Result<Option<MatchResult>, PatternSyntaxError> {
        let compiled = self.compile(pattern)?;
        Ok(compiled.exec(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_optional_group_is_omitted() {
        let pattern = Pattern::compile("/users/:id?").unwrap();
        let found = pattern.exec("/users").unwrap();
        assert!(found.params.is_empty());
        assert_eq!(found.captures, vec![Some("/users".to_string()), None]);
    }

    #[test]
    fn test_empty_capture_is_omitted() {
        let found = Pattern::compile("/docs/*").unwrap().exec("/docs/").unwrap();
        assert!(found.params.is_empty());
        assert_eq!(found.captures[1].as_deref(), Some(""));

        let found = Pattern::compile("/child1/*child2").unwrap().exec("/child1/child2").unwrap();
        assert!(found.params.is_empty());
    }

    #[test]
    fn test_consumed_prefix_keeps_escapes() {
        let pattern = Pattern::compile("/a\\(b\\)/:id").unwrap();
        assert_eq!(pattern.consumed_prefix(), "/a\\(b\\)/");

        let child = Pattern::compile(&format!("{}c", pattern.consumed_prefix())).unwrap();
        assert!(child.keys().is_empty());
        assert!(child.is_match("/a(b)/c"));
    }

    #[test]
    fn test_trailing_delimiter_included_at_end() {
        let pattern = Pattern::compile("/:child").unwrap();
        let found = pattern.exec("/child/").unwrap();
        assert_eq!(found.matched_text(), "/child/");
        assert_eq!(found.param("child"), Some("child"));
        assert_eq!(found.remainder(), "");
    }

    #[test]
    fn test_prefix_match_stops_on_segment_boundary() {
        let pattern = Pattern::compile("/user").unwrap();
        assert!(pattern.exec("/user/42").is_some());
        assert!(pattern.exec("/users").is_none());
    }

    #[test]
    fn test_cache_reuses_compiled_patterns() {
        let matcher = PatternMatcher::new();
        matcher.match_route("/a/:id", "/a/1").unwrap();
        matcher.match_route("/a/:id", "/a/2").unwrap();
        matcher.match_route("/b", "/b").unwrap();
        assert_eq!(matcher.cached_patterns(), 2);

        matcher.clear_cache();
        assert_eq!(matcher.cached_patterns(), 0);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let matcher = PatternMatcher::new();
        assert!(matcher.match_route("/:", "/x").is_err());
        assert_eq!(matcher.cached_patterns(), 0);
    }

    #[test]
    fn test_closure_matcher() {
        let matcher = |_: &str, _: &str| -> Result<Option<MatchResult>, PatternSyntaxError> { Ok(None) };
        assert_eq!(matcher.match_route("/a", "/a").unwrap(), None);
    }
}
