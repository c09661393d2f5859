// File: src/node.rs
// Purpose: Route nodes and the per-pass evaluation of a route tree

use std::fmt;
use std::rc::Rc;

use tracing::{debug, error, trace, warn};

use crate::boundary::ErrorBoundary;
use crate::context::RouteContext;
use crate::error::{CapturedError, ParameterHygieneViolation, RouteError};
use crate::router::RouterContext;

/// Host content renderer: receives the context of the enclosing route
pub type ContentFn<V> = dyn Fn(&RouteContext) -> anyhow::Result<V>;

// ============================================================================
// Tree Types
// ============================================================================

/// A child of a route: another route or host content
pub enum Child<V> {
    Route(RouteNode<V>),
    Content(Rc<ContentFn<V>>),
}

impl<V> Clone for Child<V> {
    fn clone(&self) -> Self {
        match self {
            Self::Route(node) => Self::Route(node.clone()),
            Self::Content(render) => Self::Content(Rc::clone(render)),
        }
    }
}

impl<V> fmt::Debug for Child<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Route(node) => f.debug_tuple("Route").field(node).finish(),
            Self::Content(_) => f.write_str("Content(..)"),
        }
    }
}

impl<V> From<RouteNode<V>> for Child<V> {
    fn from(node: RouteNode<V>) -> Self {
        Self::Route(node)
    }
}

/// A node of the route tree
///
/// A node with a pattern renders its children when the pattern matches the
/// current path. A node without a pattern is unconditional: it renders unless
/// an earlier sibling already matched or failed.
///
/// # Example
///
/// ```
/// use rhtmx_route_tree::{RouteNode, Router};
///
/// let router = Router::builder()
///     .initial_path("/users/42")
///     .children(vec![
///         RouteNode::path("/users/:id")
///             .with_content(|ctx| Ok(format!("user {}", ctx.param("id").unwrap_or("?")))),
///         RouteNode::new().with_content(|_| Ok("not found".to_string())),
///     ])
///     .build();
///
/// let out = router.render().unwrap();
/// assert_eq!(out.len(), 1);
/// assert_eq!(out[0].contents(), vec![&"user 42".to_string()]);
/// ```
pub struct RouteNode<V> {
    pattern: Option<String>,
    boundary: Option<ErrorBoundary<V>>,
    children: Vec<Child<V>>,
}

impl<V> Default for RouteNode<V> {
    fn default() -> Self {
        Self {
            pattern: None,
            boundary: None,
            children: Vec::new(),
        }
    }
}

impl<V> Clone for RouteNode<V> {
    fn clone(&self) -> Self {
        Self {
            pattern: self.pattern.clone(),
            boundary: self.boundary.clone(),
            children: self.children.clone(),
        }
    }
}

impl<V> fmt::Debug for RouteNode<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("pattern", &self.pattern)
            .field("boundary", &self.boundary)
            .field("children", &self.children)
            .finish()
    }
}

impl<V> RouteNode<V> {
    /// Unconditional route
    pub fn new() -> Self {
        Self::default()
    }

    /// Route guarded by `pattern`, relative to the accumulated prefix
    pub fn path(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Wraps the children in an error boundary rendering `fallback` on failure
    pub fn with_fallback(self, fallback: impl Fn(&CapturedError, crate::boundary::ResetHandle) -> V + 'static) -> Self {
        self.with_boundary(ErrorBoundary::new(fallback))
    }

    pub fn with_boundary(mut self, boundary: ErrorBoundary<V>) -> Self {
        self.boundary = Some(boundary);
        self
    }

    pub fn with_child(mut self, child: impl Into<Child<V>>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = RouteNode<V>>) -> Self {
        self.children.extend(children.into_iter().map(Child::Route));
        self
    }

    /// Appends host content rendered with this route's context
    pub fn with_content(mut self, render: impl Fn(&RouteContext) -> anyhow::Result<V> + 'static) -> Self {
        self.children.push(Child::Content(Rc::new(render)));
        self
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn boundary(&self) -> Option<&ErrorBoundary<V>> {
        self.boundary.as_ref()
    }

    pub fn children(&self) -> &[Child<V>] {
        &self.children
    }

    pub fn is_unconditional(&self) -> bool {
        self.pattern.is_none()
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    /// Evaluates this node for one render pass
    ///
    /// `level` is the accumulator shared with this node's siblings; it is lent
    /// exclusively for the duration of the call. `path` is the pass snapshot.
    ///
    /// Returns `Ok(None)` when the node renders nothing (pattern did not match,
    /// or an unconditional node whose level is already claimed). A node that
    /// does not render its children clears its boundary's failure, so the next
    /// time it matches the children are tried again.
    pub fn evaluate(&self, router: &RouterContext, level: &mut RouteContext, path: &str) -> Result<Option<Rendered<V>>, RouteError> {
        let Some(matcher) = router.matcher() else {
            error!("route evaluated without a match function");
            return Err(RouteError::MissingMatcher);
        };

        let (route_path, mut child) = match &self.pattern {
            None => {
                if let Err(violation) = level.check_hygiene() {
                    warn!(prefix = %level.path, keys = ?violation.keys, "unconditional route inherited parameters");
                    self.release_boundary();
                    return Ok(Some(Rendered::Diagnostic(violation)));
                }
                if level.is_claimed() {
                    trace!(prefix = %level.path, "unconditional route skipped, level already claimed");
                    self.release_boundary();
                    return Ok(None);
                }
                let child = RouteContext::child(level.path.clone(), level.params.clone());
                (level.path.clone(), child)
            }
            Some(pattern) => {
                let route_path = format!("{}{}", level.path, pattern);
                let found = matcher
                    .match_route(&route_path, path)
                    .map_err(|source| RouteError::PatternSyntax {
                        pattern: route_path.clone(),
                        source,
                    })?;

                let Some(found) = found else {
                    trace!(pattern = %route_path, path, "route did not match");
                    self.release_boundary();
                    return Ok(None);
                };

                debug!(pattern = %route_path, path, consumed = %found.consumed, params = ?found.params, "route matched");
                let child = RouteContext::child(found.consumed.clone(), found.params.clone());
                level.matches.push(found);
                (route_path, child)
            }
        };

        let children = match &self.boundary {
            Some(boundary) => boundary.guard(&route_path, level, || {
                self.render_children(router, &mut child, path, &route_path)
            })?,
            None => self.render_children(router, &mut child, path, &route_path)?,
        };

        Ok(Some(Rendered::Route {
            context: child,
            children,
        }))
    }

    fn release_boundary(&self) {
        if let Some(boundary) = &self.boundary {
            boundary.release();
        }
    }

    fn render_children(&self, router: &RouterContext, ctx: &mut RouteContext, path: &str, route_path: &str) -> Result<Vec<Rendered<V>>, RouteError> {
        let mut rendered = Vec::with_capacity(self.children.len());

        for child in &self.children {
            match child {
                Child::Route(node) => {
                    if let Some(out) = node.evaluate(router, ctx, path)? {
                        rendered.push(out);
                    }
                }
                Child::Content(render) => {
                    let view = render(ctx).map_err(|e| CapturedError::from_error(route_path, &e))?;
                    rendered.push(Rendered::Content(view));
                }
            }
        }

        Ok(rendered)
    }
}

// ============================================================================
// Render Output
// ============================================================================

/// Output of one render pass over a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<V> {
    /// A route that rendered, with the context its children saw
    Route {
        context: RouteContext,
        children: Vec<Rendered<V>>,
    },
    /// Host content
    Content(V),
    /// Error boundary fallback
    Fallback { error: CapturedError, view: V },
    /// Inline hygiene diagnostic in place of an unconditional route
    Diagnostic(ParameterHygieneViolation),
}

impl<V> Rendered<V> {
    /// Context of a rendered route
    pub fn context(&self) -> Option<&RouteContext> {
        match self {
            Self::Route { context, .. } => Some(context),
            _ => None,
        }
    }

    pub fn children(&self) -> &[Rendered<V>] {
        match self {
            Self::Route { children, .. } => children,
            _ => &[],
        }
    }

    /// Host content and fallback views in render order (depth first)
    pub fn contents(&self) -> Vec<&V> {
        let mut out = Vec::new();
        self.collect_views(&mut out);
        out
    }

    fn collect_views<'a>(&'a self, out: &mut Vec<&'a V>) {
        match self {
            Self::Route { children, .. } => {
                for child in children {
                    child.collect_views(out);
                }
            }
            Self::Content(view) => out.push(view),
            Self::Fallback { view, .. } => out.push(view),
            Self::Diagnostic(_) => {}
        }
    }

    /// First diagnostic found in this subtree
    pub fn diagnostic(&self) -> Option<&ParameterHygieneViolation> {
        match self {
            Self::Diagnostic(violation) => Some(violation),
            Self::Route { children, .. } => children.iter().find_map(Rendered::diagnostic),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}
