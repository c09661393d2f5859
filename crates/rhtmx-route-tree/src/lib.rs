//! # RHTMX Route Tree
//!
//! Nested route matching for client-side view trees:
//! - Path patterns (`/users/:id`, `/files/*`, `/posts/:year(\d+)`, `{/:lang}?`)
//! - Prefix consumption: each matched route hands its descendants a base path
//! - Sibling exclusivity: an unconditional route stands down once a sibling
//!   before it matched or failed
//! - Parameter hygiene for unconditional routes
//! - Error boundaries with fallbacks and reset
//! - Navigation state with push/replace and external change events
//!
//! ## Evaluation Model
//!
//! A render pass reads the current path once and walks the tree top-down.
//! Siblings are evaluated in declaration order against a shared
//! [`RouteContext`], which records the matches and failures seen so far at
//! that level. A route whose pattern does not match renders nothing; that is
//! a value (`None`), never an error.
//!
//! ## Example
//!
//! ```
//! use rhtmx_route_tree::{RouteNode, Router};
//!
//! let router = Router::builder()
//!     .initial_path("/users/42")
//!     .children(vec![
//!         RouteNode::path("/users").with_children(vec![
//!             RouteNode::path("/:id").with_content(|ctx| {
//!                 Ok(format!("user {}", ctx.param("id").unwrap_or_default()))
//!             }),
//!             RouteNode::new().with_content(|_| Ok("user list".to_string())),
//!         ]),
//!         RouteNode::new().with_content(|_| Ok("not found".to_string())),
//!     ])
//!     .build();
//!
//! let out = router.render().unwrap();
//! assert_eq!(out.len(), 1);
//! assert_eq!(out[0].contents(), vec![&"user 42".to_string()]);
//! ```

// ============================================================================
// Module Declarations
// ============================================================================

pub mod boundary;
pub mod config;
pub mod context;
pub mod error;
pub mod matcher;
pub mod navigation;
pub mod node;
pub mod pattern;
pub mod router;

// ============================================================================
// Public API
// ============================================================================

pub use boundary::{BoundaryState, ErrorBoundary, ResetHandle};
pub use config::{NavigationConfig, RouterConfig, RoutingConfig};
pub use context::{Params, RouteContext, POSITIONAL_KEY};
pub use error::{BuildError, CapturedError, ParameterHygieneViolation, PatternSyntaxError, RouteError};
pub use matcher::{consumed_prefix, match_path, MatchResult, Matcher, PatternMatcher};
pub use navigation::{History, HistoryEntry, MemoryHistory, NavData, Navigator, Subscription, Transition};
pub use node::{Child, Rendered, RouteNode};
pub use pattern::{parse, CompileOptions, Key, KeyKind, Modifier, Pattern, Token};
pub use router::{Router, RouterBuilder, RouterContext};
