//! Navigation state
//!
//! The [`Navigator`] owns the current path of a router. It performs
//! navigations through a navigate capability, re-reads the path through a
//! current-path capability and tells its listeners whenever the observed path
//! changes. External changes (history traversal) arrive through the host
//! history's change event.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

pub mod events;
pub mod history;

pub use events::{Channel, Subscription};
pub use history::{History, HistoryEntry, MemoryHistory, NavData, Transition, POPSTATE};

/// Navigate capability: `(path, data, replace)`
pub type NavigateFn = dyn Fn(&str, Option<NavData>, bool);

/// Current-path capability
pub type CurrentPathFn = dyn Fn() -> String;

#[derive(Debug, Default)]
struct NavigationState {
    path: String,
    dispatching: bool,
    /// Newest path observed while listeners were running
    pending: Option<String>,
}

struct NavigatorInner {
    navigate: Rc<NavigateFn>,
    current_path: Rc<CurrentPathFn>,
    state: RefCell<NavigationState>,
    listeners: Channel<String>,
    external: RefCell<Option<Subscription>>,
}

/// Holds the current path and drives navigation
///
/// Clones share state. The history subscription made by
/// [`Navigator::attach`] is released when the last clone is dropped.
///
/// Listeners may navigate again while being notified. Such nested changes are
/// not dispatched recursively: the newest one is kept in a single pending
/// slot and dispatched once the current round of listeners returns.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use rhtmx_route_tree::{History, MemoryHistory, Navigator};
///
/// let history = Rc::new(MemoryHistory::new("/"));
/// let navigator = Navigator::from_history(history.clone(), "popstate");
///
/// navigator.navigate("/users/7", None, false);
/// assert_eq!(navigator.current_path(), "/users/7");
/// assert_eq!(history.location(), "/users/7");
/// ```
#[derive(Clone)]
pub struct Navigator {
    inner: Rc<NavigatorInner>,
}

impl Navigator {
    /// Creates a navigator from explicit capabilities
    ///
    /// The initial path is read from `current_path` immediately.
    pub fn new(navigate: impl Fn(&str, Option<NavData>, bool) + 'static, current_path: impl Fn() -> String + 'static) -> Self {
        Self::from_parts(Rc::new(navigate), Rc::new(current_path))
    }

    pub(crate) fn from_parts(navigate: Rc<NavigateFn>, current_path: Rc<CurrentPathFn>) -> Self {
        let path = current_path();
        Self {
            inner: Rc::new(NavigatorInner {
                navigate,
                current_path,
                state: RefCell::new(NavigationState {
                    path,
                    ..NavigationState::default()
                }),
                listeners: Channel::new(),
                external: RefCell::new(None),
            }),
        }
    }

    /// Navigator backed entirely by `history`
    ///
    /// Navigations push or replace history entries; `change_event` (when not
    /// empty) is observed for external changes.
    pub fn from_history(history: Rc<dyn History>, change_event: &str) -> Self {
        let navigator = Self::from_parts(history_navigate(&history), history_location(&history));
        navigator.attach(history.as_ref(), change_event);
        navigator
    }

    /// Last observed path
    pub fn current_path(&self) -> String {
        self.inner.state.borrow().path.clone()
    }

    /// Navigates to `path`, then re-reads the current path
    ///
    /// Listeners are notified when the re-read path differs from the
    /// previously observed one.
    pub fn navigate(&self, path: &str, data: Option<NavData>, replace: bool) {
        debug!(path, replace, "navigate");
        (self.inner.navigate)(path, data, replace);
        self.refresh();
    }

    /// Re-reads the current path from the host
    ///
    /// Returns whether the observed path changed.
    pub fn refresh(&self) -> bool {
        let path = (self.inner.current_path)();
        {
            let mut state = self.inner.state.borrow_mut();
            if state.path == path {
                trace!(path = %path, "path unchanged");
                return false;
            }
            state.path = path.clone();
        }
        self.notify(path);
        true
    }

    /// Registers a listener for path changes
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) -> Subscription {
        self.inner.listeners.subscribe(move |path: &String| listener(path))
    }

    /// Observes `event` on `history`, refreshing whenever it fires
    ///
    /// An empty event name disables observation. Replaces any previous
    /// attachment.
    pub fn attach(&self, history: &dyn History, event: &str) {
        if event.is_empty() {
            debug!("history change event disabled");
            *self.inner.external.borrow_mut() = None;
            return;
        }

        let weak: Weak<NavigatorInner> = Rc::downgrade(&self.inner);
        let subscription = history.subscribe(
            event,
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    Navigator { inner }.refresh();
                }
            }),
        );
        *self.inner.external.borrow_mut() = Some(subscription);
    }

    /// Stops observing the history change event
    pub fn detach(&self) {
        *self.inner.external.borrow_mut() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.inner.external.borrow().is_some()
    }

    fn notify(&self, path: String) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.dispatching {
                trace!(path = %path, "navigation during dispatch, queued");
                state.pending = Some(path);
                return;
            }
            state.dispatching = true;
        }

        let _reset = DispatchGuard(&self.inner.state);
        let mut next = Some(path);
        while let Some(path) = next {
            debug!(path = %path, "path changed");
            self.inner.listeners.emit(&path);
            next = self.inner.state.borrow_mut().pending.take();
        }
    }
}

/// Clears the dispatching flag even if a listener panics
struct DispatchGuard<'a>(&'a RefCell<NavigationState>);

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.borrow_mut();
        state.dispatching = false;
        state.pending = None;
    }
}

impl fmt::Debug for Navigator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Navigator")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.listener_count())
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Default navigate capability: push or replace on `history`
pub(crate) fn history_navigate(history: &Rc<dyn History>) -> Rc<NavigateFn> {
    let history = Rc::clone(history);
    Rc::new(move |path: &str, data: Option<NavData>, replace: bool| {
        if replace {
            history.replace_state(data, path);
        } else {
            history.push_state(data, path);
        }
    })
}

/// Default current-path capability: the history location
pub(crate) fn history_location(history: &Rc<dyn History>) -> Rc<CurrentPathFn> {
    let history = Rc::clone(history);
    Rc::new(move || history.location())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn memory(path: &str) -> (Rc<MemoryHistory>, Navigator) {
        let history = Rc::new(MemoryHistory::new(path));
        let navigator = Navigator::from_history(history.clone(), POPSTATE);
        (history, navigator)
    }

    #[test]
    fn test_initial_path_read_from_host() {
        let (_, navigator) = memory("/start");
        assert_eq!(navigator.current_path(), "/start");
    }

    #[test]
    fn test_navigate_notifies_only_on_change() {
        let (_, navigator) = memory("/");
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = navigator.subscribe(move |_| counter.set(counter.get() + 1));

        navigator.navigate("/a", None, false);
        navigator.navigate("/a", None, true);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_reentrant_navigation_coalesces() {
        let (history, navigator) = memory("/");
        let seen = Rc::new(RefCell::new(Vec::new()));

        let nav = navigator.clone();
        let log = Rc::clone(&seen);
        let _sub = navigator.subscribe(move |path| {
            log.borrow_mut().push(path.to_string());
            if path == "/a" {
                nav.navigate("/b", None, false);
                nav.navigate("/c", None, false);
            }
        });

        navigator.navigate("/a", None, false);

        assert_eq!(*seen.borrow(), vec!["/a", "/c"]);
        assert_eq!(navigator.current_path(), "/c");
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn test_history_traversal_refreshes() {
        let (history, navigator) = memory("/");
        navigator.navigate("/a", None, false);
        history.back();
        assert_eq!(navigator.current_path(), "/");
    }

    #[test]
    fn test_empty_change_event_disables_observation() {
        let history = Rc::new(MemoryHistory::new("/"));
        let navigator = Navigator::from_history(history.clone(), "");
        navigator.navigate("/a", None, false);
        history.back();

        assert!(!navigator.is_attached());
        assert_eq!(navigator.current_path(), "/a");
        assert!(navigator.refresh());
        assert_eq!(navigator.current_path(), "/");
    }

    #[test]
    fn test_dropping_navigator_unsubscribes() {
        let (history, navigator) = memory("/");
        history.push_state(None, "/a");
        drop(navigator);
        assert!(history.back());
    }
}
