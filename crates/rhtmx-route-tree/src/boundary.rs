//! Route error boundaries.
//!
//! Wraps the rendering of a route's children. A child failure (a content
//! closure returning `Err`, or a panic while rendering) is captured, recorded
//! on the sibling level so unconditional siblings stand down, and replaced by
//! the configured fallback view. The boundary stays failed across render
//! passes until its [`ResetHandle`] is invoked or its route stops rendering.

use std::cell::RefCell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

use tracing::{debug, warn};

use crate::context::RouteContext;
use crate::error::{CapturedError, RouteError};
use crate::node::Rendered;

/// Fallback view factory: receives the failure and a reset capability
pub type FallbackFn<V> = dyn Fn(&CapturedError, ResetHandle) -> V;

/// State of an error boundary, persisted across render passes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BoundaryState {
    /// Children render normally
    #[default]
    Healthy,
    /// Children failed; the fallback is shown
    Failed(CapturedError),
}

impl BoundaryState {
    /// Returns the captured error, if any
    pub fn error(&self) -> Option<&CapturedError> {
        match self {
            Self::Healthy => None,
            Self::Failed(e) => Some(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Clears a boundary's recorded failure so the next pass renders children again
#[derive(Clone)]
pub struct ResetHandle {
    state: Rc<RefCell<BoundaryState>>,
}

impl ResetHandle {
    pub fn reset(&self) {
        let mut state = self.state.borrow_mut();
        if let BoundaryState::Failed(error) = &*state {
            debug!(route = %error.route, "error boundary reset");
        }
        *state = BoundaryState::Healthy;
    }
}

impl fmt::Debug for ResetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResetHandle")
            .field("state", &*self.state.borrow())
            .finish()
    }
}

/// Error isolation wrapper for a route's children
///
/// # Example
///
/// ```
/// use rhtmx_route_tree::{ErrorBoundary, RouteNode};
///
/// let node: RouteNode<String> = RouteNode::path("/reports")
///     .with_boundary(ErrorBoundary::new(|err, _reset| format!("failed: {}", err.message)))
///     .with_content(|_| anyhow::bail!("report backend offline"));
/// assert!(node.boundary().is_some());
/// ```
pub struct ErrorBoundary<V> {
    fallback: Rc<FallbackFn<V>>,
    state: Rc<RefCell<BoundaryState>>,
}

impl<V> ErrorBoundary<V> {
    /// Creates a boundary rendering `fallback` on failure
    pub fn new(fallback: impl Fn(&CapturedError, ResetHandle) -> V + 'static) -> Self {
        Self {
            fallback: Rc::new(fallback),
            state: Rc::new(RefCell::new(BoundaryState::Healthy)),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> BoundaryState {
        self.state.borrow().clone()
    }

    pub fn is_failed(&self) -> bool {
        self.state.borrow().is_failed()
    }

    pub fn reset_handle(&self) -> ResetHandle {
        ResetHandle {
            state: Rc::clone(&self.state),
        }
    }

    /// Drops a recorded failure when the owning route renders nothing
    pub(crate) fn release(&self) {
        let mut state = self.state.borrow_mut();
        if let BoundaryState::Failed(error) = &*state {
            debug!(route = %error.route, "error boundary released, route no longer rendered");
        }
        *state = BoundaryState::Healthy;
    }

    /// Runs `render` inside the boundary
    ///
    /// Render failures and panics become the fallback view; the failure is
    /// stored on the boundary and on `level.error`. Structural errors
    /// (missing matcher, bad pattern) pass through untouched.
    pub(crate) fn guard<F>(&self, route: &str, level: &mut RouteContext, render: F) -> Result<Vec<Rendered<V>>, RouteError>
    where
        F: FnOnce() -> Result<Vec<Rendered<V>>, RouteError>,
    {
        let failed = self.state.borrow().error().cloned();
        if let Some(error) = failed {
            debug!(route, "error boundary still failed, rendering fallback");
            return Ok(vec![self.fail(error, level)]);
        }

        match catch_unwind(AssertUnwindSafe(render)) {
            Ok(Ok(children)) => Ok(children),
            Ok(Err(RouteError::Render(error))) => Ok(vec![self.fail(error, level)]),
            Ok(Err(other)) => Err(other),
            Err(payload) => Ok(vec![self.fail(CapturedError::from_panic(route, payload), level)]),
        }
    }

    fn fail(&self, error: CapturedError, level: &mut RouteContext) -> Rendered<V> {
        warn!(route = %error.route, error = %error.message, panicked = error.panicked, "route children failed, rendering fallback");

        *self.state.borrow_mut() = BoundaryState::Failed(error.clone());
        level.error = Some(error.clone());

        let view = (self.fallback)(&error, self.reset_handle());
        Rendered::Fallback { error, view }
    }
}

impl<V> Clone for ErrorBoundary<V> {
    fn clone(&self) -> Self {
        Self {
            fallback: Rc::clone(&self.fallback),
            state: Rc::clone(&self.state),
        }
    }
}

impl<V> fmt::Debug for ErrorBoundary<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorBoundary")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
