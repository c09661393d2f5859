// File: src/error.rs
// Purpose: Error taxonomy for pattern compilation, route evaluation and path building

use std::any::Any;

use thiserror::Error;

/// Malformed pattern syntax, raised at compile time
///
/// Every variant names the offending construct and the byte offset in the
/// pattern source where it was found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternSyntaxError {
    #[error("missing parameter name after \":\" at {index}")]
    MissingParameterName { index: usize },

    #[error("unbalanced group starting at {index}")]
    UnbalancedGroup { index: usize },

    #[error("capturing groups are not allowed inside a group pattern (at {index})")]
    CapturingGroup { index: usize },

    #[error("group pattern cannot start with \"?\" at {index}")]
    GroupStartsWithQuestion { index: usize },

    #[error("missing pattern inside group at {index}")]
    EmptyGroup { index: usize },

    #[error("trailing escape character at {index}")]
    TrailingEscape { index: usize },

    #[error("unexpected {found} at {index}, expected {expected}")]
    UnexpectedToken {
        found: &'static str,
        index: usize,
        expected: &'static str,
    },

    #[error("parameter \"{name}\" cannot repeat without a prefix or suffix")]
    RepeatWithoutAffix { name: String },

    #[error("invalid regular expression `{pattern}`: {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Inherited parameters reached an unconditional route
///
/// Parameters terminate at the first route without its own pattern; only an
/// empty set or the single positional key `"0"` may flow into one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parameters are not allowed in parent routes (inherited: {keys:?})")]
pub struct ParameterHygieneViolation {
    /// Offending parameter names, sorted
    pub keys: Vec<String>,
}

/// A failure raised while rendering a route's children
///
/// Stores the rendered message chain instead of the original error so it can
/// be cloned into sibling bookkeeping and handed to fallbacks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("route `{route}` failed to render: {message}")]
pub struct CapturedError {
    /// Route path (accumulated prefix + own pattern) whose children failed
    pub route: String,
    /// Top-level error message
    pub message: String,
    /// Messages of the underlying causes, outermost first
    pub causes: Vec<String>,
    /// Whether the failure was a panic rather than a returned error
    pub panicked: bool,
}

impl CapturedError {
    /// Captures a returned content error
    pub fn from_error(route: &str, error: &anyhow::Error) -> Self {
        Self {
            route: route.to_string(),
            message: error.to_string(),
            causes: error.chain().skip(1).map(|cause| cause.to_string()).collect(),
            panicked: false,
        }
    }

    /// Captures a panic payload caught while rendering
    pub fn from_panic(route: &str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };

        Self {
            route: route.to_string(),
            message,
            causes: Vec::new(),
            panicked: true,
        }
    }
}

/// Errors raised while evaluating a route tree
///
/// A path that simply does not match is never an error; it is a route that
/// renders nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    /// The router context carries no match capability (configuration defect)
    #[error("route requires a match function in the router context")]
    MissingMatcher,

    /// A route pattern failed to compile on first use
    #[error("invalid route pattern `{pattern}`: {source}")]
    PatternSyntax {
        pattern: String,
        #[source]
        source: PatternSyntaxError,
    },

    /// Child content failed and no error boundary recovered it
    #[error(transparent)]
    Render(#[from] CapturedError),
}

/// Errors raised while building a path from parameters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("missing required parameter \"{name}\"")]
    MissingParameter { name: String },

    #[error("parameter \"{name}\" value \"{value}\" does not match `{pattern}`")]
    InvalidParameter {
        name: String,
        value: String,
        pattern: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_captured_error_keeps_cause_chain() {
        let err = Err::<(), _>(anyhow::anyhow!("disk full"))
            .context("loading profile")
            .unwrap_err();

        let captured = CapturedError::from_error("/users/:id", &err);
        assert_eq!(captured.message, "loading profile");
        assert_eq!(captured.causes, vec!["disk full".to_string()]);
        assert!(!captured.panicked);
    }

    #[test]
    fn test_captured_error_from_panic_payloads() {
        let captured = CapturedError::from_panic("/a", Box::new("boom"));
        assert_eq!(captured.message, "boom");
        assert!(captured.panicked);

        let captured = CapturedError::from_panic("/a", Box::new(String::from("owned boom")));
        assert_eq!(captured.message, "owned boom");

        let captured = CapturedError::from_panic("/a", Box::new(42_u8));
        assert_eq!(captured.message, "unknown panic");
    }

    #[test]
    fn test_route_error_display() {
        assert_eq!(
            RouteError::MissingMatcher.to_string(),
            "route requires a match function in the router context"
        );

        let err = RouteError::PatternSyntax {
            pattern: "/:".to_string(),
            source: PatternSyntaxError::MissingParameterName { index: 1 },
        };
        assert_eq!(
            err.to_string(),
            "invalid route pattern `/:`: missing parameter name after \":\" at 1"
        );
    }
}
