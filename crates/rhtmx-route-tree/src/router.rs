// File: src/router.rs
// Purpose: Router root: capabilities, navigation state and render passes

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info};

use crate::config::RouterConfig;
use crate::context::RouteContext;
use crate::error::RouteError;
use crate::matcher::{Matcher, PatternMatcher};
use crate::navigation::{
    history_location, history_navigate, CurrentPathFn, History, MemoryHistory, NavData, NavigateFn, Navigator,
    Subscription,
};
use crate::node::{Rendered, RouteNode};

// ============================================================================
// Router Context
// ============================================================================

/// Capabilities shared by every route of one router
///
/// The default value carries neither a matcher nor a navigator; evaluating a
/// route against it fails with [`RouteError::MissingMatcher`].
#[derive(Clone, Default)]
pub struct RouterContext {
    matcher: Option<Rc<dyn Matcher>>,
    navigator: Option<Navigator>,
}

impl RouterContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context with a default [`PatternMatcher`] and no navigator
    pub fn with_default_matcher() -> Self {
        Self::new().with_matcher(PatternMatcher::new())
    }

    pub fn with_matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Rc::new(matcher));
        self
    }

    pub fn with_shared_matcher(mut self, matcher: Rc<dyn Matcher>) -> Self {
        self.matcher = Some(matcher);
        self
    }

    pub fn with_navigator(mut self, navigator: Navigator) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn matcher(&self) -> Option<&dyn Matcher> {
        self.matcher.as_deref()
    }

    pub fn navigator(&self) -> Option<&Navigator> {
        self.navigator.as_ref()
    }
}

impl fmt::Debug for RouterContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterContext")
            .field("matcher", &self.matcher.is_some())
            .field("navigator", &self.navigator)
            .finish()
    }
}

// ============================================================================
// Router
// ============================================================================

/// Root of a route tree
///
/// Owns the navigation state and evaluates its top-level routes against one
/// snapshot of the current path per [`Router::render`] call. Rendering is
/// driven by the host: subscribe to path changes and call `render` again.
///
/// # Example
///
/// ```
/// use rhtmx_route_tree::{RouteNode, Router};
///
/// let router = Router::builder()
///     .initial_path("/")
///     .children(vec![
///         RouteNode::path("/about").with_content(|_| Ok("about")),
///         RouteNode::new().with_content(|_| Ok("home")),
///     ])
///     .build();
///
/// assert_eq!(router.render().unwrap()[0].contents(), vec![&"home"]);
///
/// router.navigate("/about", None, false);
/// assert_eq!(router.render().unwrap()[0].contents(), vec![&"about"]);
/// ```
pub struct Router<V> {
    context: RouterContext,
    navigator: Navigator,
    history: Rc<dyn History>,
    base_path: String,
    children: Vec<RouteNode<V>>,
    on_updated: Option<Rc<dyn Fn(&str)>>,
    last_rendered: RefCell<Option<String>>,
}

impl<V> Router<V> {
    pub fn builder() -> RouterBuilder<V> {
        RouterBuilder::new()
    }

    /// Evaluates the whole tree against the current path
    ///
    /// The path is read once; every route in the pass sees the same snapshot.
    /// Returns the rendered top-level routes in declaration order (empty when
    /// nothing rendered).
    pub fn render(&self) -> Result<Vec<Rendered<V>>, RouteError> {
        let path = self.navigator.current_path();
        debug!(path = %path, "render pass");

        let mut level = RouteContext::root().with_path(self.base_path.clone());
        let mut rendered = Vec::with_capacity(self.children.len());
        for child in &self.children {
            if let Some(out) = child.evaluate(&self.context, &mut level, &path)? {
                rendered.push(out);
            }
        }

        self.mark_rendered(&path);
        Ok(rendered)
    }

    fn mark_rendered(&self, path: &str) {
        let changed = self.last_rendered.borrow().as_deref() != Some(path);
        if !changed {
            return;
        }

        *self.last_rendered.borrow_mut() = Some(path.to_string());
        if let Some(on_updated) = &self.on_updated {
            on_updated(path);
        }
    }

    /// Navigates through the router's navigator
    pub fn navigate(&self, path: &str, data: Option<NavData>, replace: bool) {
        self.navigator.navigate(path, data, replace);
    }

    pub fn current_path(&self) -> String {
        self.navigator.current_path()
    }

    /// Registers a listener for path changes (the host's cue to render again)
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> Subscription {
        self.navigator.subscribe(listener)
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn context(&self) -> &RouterContext {
        &self.context
    }

    pub fn history(&self) -> &Rc<dyn History> {
        &self.history
    }

    pub fn children(&self) -> &[RouteNode<V>] {
        &self.children
    }
}

impl<V> fmt::Debug for Router<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("context", &self.context)
            .field("base_path", &self.base_path)
            .field("children", &self.children)
            .field("last_rendered", &self.last_rendered.borrow())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for [`Router`]
///
/// Every capability is optional: the defaults are an in-memory history, a
/// navigate capability pushing or replacing history entries, the history
/// location as current path, and a [`PatternMatcher`] configured from
/// [`RouterConfig`].
pub struct RouterBuilder<V> {
    config: RouterConfig,
    history: Option<Rc<dyn History>>,
    matcher: Option<Rc<dyn Matcher>>,
    navigate: Option<Rc<NavigateFn>>,
    current_path: Option<Rc<CurrentPathFn>>,
    change_event: Option<String>,
    initial_path: Option<String>,
    on_updated: Option<Rc<dyn Fn(&str)>>,
    children: Vec<RouteNode<V>>,
}

impl<V> Default for RouterBuilder<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RouterBuilder<V> {
    pub fn new() -> Self {
        Self {
            config: RouterConfig::default(),
            history: None,
            matcher: None,
            navigate: None,
            current_path: None,
            change_event: None,
            initial_path: None,
            on_updated: None,
            children: Vec::new(),
        }
    }

    /// Applies routing and navigation settings
    pub fn config(mut self, config: &RouterConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Host history (default: [`MemoryHistory`] at the configured initial path)
    pub fn history(mut self, history: Rc<dyn History>) -> Self {
        self.history = Some(history);
        self
    }

    /// Match capability (default: [`PatternMatcher`])
    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Rc::new(matcher));
        self
    }

    /// Navigate capability `(path, data, replace)`
    pub fn navigate(mut self, navigate: impl Fn(&str, Option<NavData>, bool) + 'static) -> Self {
        self.navigate = Some(Rc::new(navigate));
        self
    }

    /// Current-path capability
    pub fn current_path(mut self, current_path: impl Fn() -> String + 'static) -> Self {
        self.current_path = Some(Rc::new(current_path));
        self
    }

    /// History event signalling external path changes; empty disables it
    pub fn change_event(mut self, event: impl Into<String>) -> Self {
        self.change_event = Some(event.into());
        self
    }

    /// Starting path of the default in-memory history
    pub fn initial_path(mut self, path: impl Into<String>) -> Self {
        self.initial_path = Some(path.into());
        self
    }

    /// Called after a render pass whose path differs from the previous pass
    pub fn on_updated(mut self, on_updated: impl Fn(&str) + 'static) -> Self {
        self.on_updated = Some(Rc::new(on_updated));
        self
    }

    pub fn children(mut self, children: Vec<RouteNode<V>>) -> Self {
        self.children = children;
        self
    }

    pub fn child(mut self, child: RouteNode<V>) -> Self {
        self.children.push(child);
        self
    }

    pub fn build(self) -> Router<V> {
        let initial_path = self
            .initial_path
            .unwrap_or_else(|| self.config.navigation.initial_path.clone());
        let history: Rc<dyn History> = match self.history {
            Some(history) => history,
            None => Rc::new(MemoryHistory::new(initial_path)),
        };

        let navigate = self.navigate.unwrap_or_else(|| history_navigate(&history));
        let current_path = self
            .current_path
            .unwrap_or_else(|| history_location(&history));

        let navigator = Navigator::from_parts(navigate, current_path);
        let change_event = self
            .change_event
            .unwrap_or_else(|| self.config.navigation.change_event.clone());
        navigator.attach(history.as_ref(), &change_event);

        let options = self.config.compile_options();
        let matcher: Rc<dyn Matcher> = match self.matcher {
            Some(matcher) => matcher,
            None => Rc::new(PatternMatcher::with_options(options)),
        };

        let base_path = self.config.routing.base_path.clone().unwrap_or_default();

        info!(
            path = %navigator.current_path(),
            change_event = %change_event,
            routes = self.children.len(),
            "router initialized"
        );

        Router {
            context: RouterContext::new()
                .with_shared_matcher(matcher)
                .with_navigator(navigator.clone()),
            navigator,
            history,
            base_path,
            children: self.children,
            on_updated: self.on_updated,
            last_rendered: RefCell::new(None),
        }
    }
}
