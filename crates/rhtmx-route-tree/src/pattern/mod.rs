//! Pattern compiler for nested route paths
//!
//! Turns a pattern string into a reusable [`Pattern`]: a token list, the
//! ordered parameter keys and a derived regex recognizer.
//! Compilation is pure: the same source and options always produce a
//! matcher with the same behavior.
//!
//! # Syntax
//!
//! | Syntax            | Meaning                                              |
//! |-------------------|------------------------------------------------------|
//! | `/about`          | literal text                                         |
//! | `:id`             | named parameter, one or more non-delimiter chars     |
//! | `:id(\d+)`        | named parameter with a custom pattern                |
//! | `(a\|b)`          | positional group, addressed as `"0"`, `"1"`, …       |
//! | `*`               | wildcard, positional group capturing the remainder   |
//! | `{-:id}`          | brace group carrying its own prefix/suffix           |
//! | `?` / `*` / `+`   | optional / zero-or-more / one-or-more (after a key)  |
//! | `\x`              | escaped literal character                            |
//!
//! A `/` or `.` written directly before a parameter belongs to that
//! parameter, so `/users/:id?` matches both `/users` and `/users/42`.

use std::fmt;

use regex::Regex;

use crate::context::Params;
use crate::error::PatternSyntaxError;
use crate::matcher::{consumed_prefix, match_path, MatchResult};

mod generate;
mod lexer;
pub mod parser;
pub(crate) mod regexp;

pub use parser::parse;

// ============================================================================
// Token Types
// ============================================================================

/// Repetition applied to a key or group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modifier {
    /// Exactly once
    #[default]
    None,
    /// `?`
    Optional,
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl Modifier {
    pub(crate) fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "?" => Modifier::Optional,
            "*" => Modifier::ZeroOrMore,
            "+" => Modifier::OneOrMore,
            _ => Modifier::None,
        }
    }

    /// Regex quantifier for this modifier
    pub fn as_str(self) -> &'static str {
        match self {
            Modifier::None => "",
            Modifier::Optional => "?",
            Modifier::ZeroOrMore => "*",
            Modifier::OneOrMore => "+",
        }
    }

    /// Whether the key may be absent from a match
    pub fn is_optional(self) -> bool {
        matches!(self, Modifier::Optional | Modifier::ZeroOrMore)
    }

    /// Whether the key may repeat
    pub fn is_repeat(self) -> bool {
        matches!(self, Modifier::ZeroOrMore | Modifier::OneOrMore)
    }
}

/// How a key was declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// `:name`
    Named,
    /// `( … )`
    Positional,
    /// bare `*`
    Wildcard,
}

/// A capturing slot in a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key {
    /// Parameter name; positional keys use their index ("0", "1", …)
    pub name: String,
    pub kind: KeyKind,
    /// Fixed text required before the captured value
    pub prefix: String,
    /// Fixed text required after the captured value
    pub suffix: String,
    /// Regex source for the captured value
    pub pattern: String,
    pub modifier: Modifier,
}

/// One element of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Literal text
    Literal(String),
    /// Capturing key
    Key(Key),
    /// Brace group without a key, e.g. the `{s}` in `/book{s}?`
    Group { text: String, modifier: Modifier },
}

// ============================================================================
// Compile Options
// ============================================================================

/// Options controlling how a pattern is recognized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Case-sensitive matching (default: false)
    pub sensitive: bool,
    /// Disallow the optional trailing delimiter (default: false)
    pub strict: bool,
    /// Require the pattern to match the whole path (default: false).
    /// When false the match may stop at any segment boundary and the rest of
    /// the path is left for descendants.
    pub end: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            sensitive: false,
            strict: false,
            end: false,
        }
    }
}

impl CompileOptions {
    /// Sets case sensitivity (functional builder)
    pub fn with_sensitive(mut self, sensitive: bool) -> Self {
        self.sensitive = sensitive;
        self
    }

    /// Sets strict trailing-delimiter handling (functional builder)
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets full-path matching (functional builder)
    pub fn with_end(mut self, end: bool) -> Self {
        self.end = end;
        self
    }
}

// ============================================================================
// Compiled Pattern
// ============================================================================

/// Immutable compiled form of a route pattern
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::Pattern;
///
/// let pattern = Pattern::compile("/child1/:c1/:index").unwrap();
/// assert_eq!(pattern.param_names(), vec!["c1", "index"]);
///
/// let found = pattern.exec("/child1/child2/index.html").unwrap();
/// assert_eq!(found.params["c1"], "child2");
/// assert_eq!(found.params["index"], "index.html");
/// assert_eq!(found.consumed, "/child1/");
/// ```
#[derive(Clone)]
pub struct Pattern {
    source: String,
    tokens: Vec<Token>,
    keys: Vec<Key>,
    consumed: String,
    regex: Regex,
    group_names: Vec<String>,
    validators: Vec<Regex>,
    options: CompileOptions,
}

impl Pattern {
    /// Compiles a pattern with default options
    pub fn compile(source: &str) -> Result<Self, PatternSyntaxError> {
        Self::compile_with(source, &CompileOptions::default())
    }

    /// Compiles a pattern with explicit options
    pub fn compile_with(source: &str, options: &CompileOptions) -> Result<Self, PatternSyntaxError> {
        let tokens = parse(source)?;
        let recognizer = regexp::build_recognizer(&tokens, options)?;

        let keys = tokens
            .iter()
            .filter_map(|token| match token {
                Token::Key(key) => Some(key.clone()),
                _ => None,
            })
            .collect();

        Ok(Self {
            source: source.to_string(),
            consumed: consumed_prefix(&tokens),
            tokens,
            keys,
            regex: recognizer.regex,
            group_names: recognizer.group_names,
            validators: recognizer.validators,
            options: *options,
        })
    }

    /// The pattern source as written
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Capturing keys in left-to-right order
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    /// Parameter names in left-to-right order
    pub fn param_names(&self) -> Vec<&str> {
        self.keys.iter().map(|key| key.name.as_str()).collect()
    }

    /// The derived recognizer
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Static prefix handed to descendants when this pattern matches
    pub fn consumed_prefix(&self) -> &str {
        &self.consumed
    }

    /// Number of parameter capture groups in the recognizer
    pub fn capture_count(&self) -> usize {
        self.regex
            .capture_names()
            .flatten()
            .filter(|name| self.group_names.iter().any(|g| g == name))
            .count()
    }

    /// Runs the recognizer against `path`, anchored at the start
    ///
    /// Returns `None` when the path does not match.
    pub fn exec(&self, path: &str) -> Option<MatchResult> {
        match_path(self, path)
    }

    /// Whether `path` matches this pattern
    pub fn is_match(&self, path: &str) -> bool {
        self.regex.is_match(path)
    }

    pub(crate) fn group_names(&self) -> &[String] {
        &self.group_names
    }

    /// Builds a path from parameters (reverse routing)
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_route_tree::Pattern;
    ///
    /// let pattern = Pattern::compile("/posts/:year(\\d+)/:slug").unwrap();
    /// let path = pattern
    ///     .build_with(&[("year", "2024"), ("slug", "hello-world")])
    ///     .unwrap();
    /// assert_eq!(path, "/posts/2024/hello-world");
    /// ```
    pub fn build(&self, params: &Params) -> Result<String, crate::error::BuildError> {
        generate::build_path(&self.tokens, &self.validators, params)
    }

    /// Convenience form of [`Pattern::build`] taking parameter tuples
    pub fn build_with(&self, params: &[(&str, &str)]) -> Result<String, crate::error::BuildError> {
        let params: Params = params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.build(&params)
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("source", &self.source)
            .field("tokens", &self.tokens)
            .field("regex", &self.regex.as_str())
            .field("options", &self.options)
            .finish()
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl std::str::FromStr for Pattern {
    type Err = PatternSyntaxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::compile(s)
    }
}
