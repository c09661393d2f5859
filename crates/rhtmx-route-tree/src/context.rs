// File: src/context.rs
// Purpose: Inherited per-subtree route context and sibling bookkeeping

use std::collections::HashMap;

use crate::error::{CapturedError, ParameterHygieneViolation};
use crate::matcher::MatchResult;

/// Parameter mapping: name (or positional index) → captured value
pub type Params = HashMap<String, String>;

/// The only parameter key allowed to reach an unconditional route
pub const POSITIONAL_KEY: &str = "0";

/// Context handed from a route to the routes directly below it
///
/// `path` and `params` are inherited values. `matches` and `error` are the
/// bookkeeping of one sibling level: each sibling is lent the context
/// exclusively while it evaluates, appends its own match or failure, and
/// hands it on to the next sibling in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteContext {
    /// Accumulated pattern prefix from ancestors
    pub path: String,
    /// Parameters of the nearest matched ancestor
    pub params: Params,
    /// Matches produced by siblings evaluated so far at this level
    pub matches: Vec<MatchResult>,
    /// Failure recorded by a sibling's error boundary at this level
    pub error: Option<CapturedError>,
}

impl RouteContext {
    /// Root context: empty prefix, no parameters, no bookkeeping
    pub fn root() -> Self {
        Self::default()
    }

    /// Fresh context for a subtree: inherited values, empty bookkeeping
    pub fn child(path: impl Into<String>, params: Params) -> Self {
        Self {
            path: path.into(),
            params,
            matches: Vec::new(),
            error: None,
        }
    }

    /// Sets the accumulated prefix (functional builder)
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Sets inherited parameters (functional builder)
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.params = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Looks up an inherited parameter
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    /// Whether a sibling at this level already matched or failed
    pub fn is_claimed(&self) -> bool {
        !self.matches.is_empty() || self.error.is_some()
    }

    /// Checks that inherited parameters may reach an unconditional route
    ///
    /// Accepts no parameters or exactly the positional key `"0"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rhtmx_route_tree::RouteContext;
    ///
    /// assert!(RouteContext::root().check_hygiene().is_ok());
    /// assert!(RouteContext::root().with_params([("0", "1")]).check_hygiene().is_ok());
    ///
    /// let err = RouteContext::root()
    ///     .with_params([("id", "1"), ("userId", "2")])
    ///     .check_hygiene()
    ///     .unwrap_err();
    /// assert_eq!(err.keys, vec!["id", "userId"]);
    /// ```
    pub fn check_hygiene(&self) -> Result<(), ParameterHygieneViolation> {
        let allowed = match self.params.len() {
            0 => true,
            1 => self.params.contains_key(POSITIONAL_KEY),
            _ => false,
        };

        if allowed {
            return Ok(());
        }

        let mut keys: Vec<String> = self.params.keys().cloned().collect();
        keys.sort();
        Err(ParameterHygieneViolation { keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_context_starts_unclaimed() {
        let mut params = Params::new();
        params.insert("id".to_string(), "7".to_string());

        let ctx = RouteContext::child("/users/", params);
        assert_eq!(ctx.path, "/users/");
        assert_eq!(ctx.param("id"), Some("7"));
        assert!(!ctx.is_claimed());
    }

    #[test]
    fn test_claimed_by_error() {
        let mut ctx = RouteContext::root();
        ctx.error = Some(CapturedError {
            route: "/a".to_string(),
            message: "boom".to_string(),
            causes: Vec::new(),
            panicked: false,
        });
        assert!(ctx.is_claimed());
    }

    #[test]
    fn test_hygiene_rejects_single_named_key() {
        let err = RouteContext::root()
            .with_params([("id", "1")])
            .check_hygiene()
            .unwrap_err();
        assert_eq!(err.keys, vec!["id".to_string()]);
    }

    #[test]
    fn test_hygiene_rejects_positional_keys_beyond_first() {
        let ctx = RouteContext::root().with_params([("0", "a"), ("1", "b")]);
        assert!(ctx.check_hygiene().is_err());
    }
}
