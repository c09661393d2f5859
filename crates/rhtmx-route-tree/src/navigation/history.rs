// File: src/navigation/history.rs
// Purpose: Host history capability and an in-memory implementation

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::events::{Channel, Subscription};

/// Opaque navigation data attached to a history entry
pub type NavData = serde_json::Value;

/// Event emitted by [`MemoryHistory`] when the cursor moves
pub const POPSTATE: &str = "popstate";

/// Host history: current location, entry state and change events
///
/// Methods take `&self`; implementations use interior mutability.
pub trait History {
    /// Current path
    fn location(&self) -> String;

    /// Data attached to the current entry
    fn state(&self) -> Option<NavData>;

    /// Adds an entry after the current one, discarding forward entries
    fn push_state(&self, data: Option<NavData>, path: &str);

    /// Overwrites the current entry
    fn replace_state(&self, data: Option<NavData>, path: &str);

    /// Registers `listener` for `event`
    fn subscribe(&self, event: &str, listener: Rc<dyn Fn()>) -> Subscription;
}

/// One history entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<NavData>,
}

/// A recorded push or replace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Transition {
    Push {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<NavData>,
    },
    Replace {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        data: Option<NavData>,
    },
}

impl Transition {
    pub fn path(&self) -> &str {
        match self {
            Transition::Push { path, .. } | Transition::Replace { path, .. } => path,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, Transition::Replace { .. })
    }
}

#[derive(Debug)]
struct Entries {
    stack: Vec<HistoryEntry>,
    cursor: usize,
    transitions: Vec<Transition>,
}

/// In-memory history stack
///
/// Used as the default host by [`crate::Router`] and in tests. Traversal
/// (`back`, `forward`, `go`) emits `"popstate"`; push and replace do not.
///
/// # Examples
///
/// ```
/// use rhtmx_route_tree::{History, MemoryHistory};
///
/// let history = MemoryHistory::new("/");
/// history.push_state(None, "/a");
/// history.push_state(None, "/b");
/// assert_eq!(history.location(), "/b");
///
/// history.back();
/// assert_eq!(history.location(), "/a");
/// assert_eq!(history.len(), 3);
/// ```
#[derive(Debug)]
pub struct MemoryHistory {
    entries: RefCell<Entries>,
    channels: RefCell<HashMap<String, Channel<()>>>,
}

impl MemoryHistory {
    /// History with a single entry at `initial_path`
    pub fn new(initial_path: impl Into<String>) -> Self {
        Self {
            entries: RefCell::new(Entries {
                stack: vec![HistoryEntry {
                    path: initial_path.into(),
                    data: None,
                }],
                cursor: 0,
                transitions: Vec::new(),
            }),
            channels: RefCell::new(HashMap::new()),
        }
    }

    /// Number of entries in the stack
    pub fn len(&self) -> usize {
        self.entries.borrow().stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().stack.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.entries.borrow().cursor
    }

    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.borrow().stack.clone()
    }

    /// Every push and replace, in order
    pub fn transitions(&self) -> Vec<Transition> {
        self.entries.borrow().transitions.clone()
    }

    pub fn back(&self) -> bool {
        self.go(-1)
    }

    pub fn forward(&self) -> bool {
        self.go(1)
    }

    /// Moves the cursor by `delta`; out-of-range moves do nothing
    ///
    /// Returns whether the cursor moved.
    pub fn go(&self, delta: isize) -> bool {
        let moved = {
            let mut entries = self.entries.borrow_mut();
            let target = entries.cursor as isize + delta;
            if delta == 0 || target < 0 || target >= entries.stack.len() as isize {
                false
            } else {
                entries.cursor = target as usize;
                true
            }
        };

        if moved {
            debug!(delta, path = %self.location(), "history traversal");
            self.dispatch(POPSTATE);
        }
        moved
    }

    /// Emits `event` to its subscribers
    pub fn dispatch(&self, event: &str) {
        let channel = self.channels.borrow().get(event).cloned();
        if let Some(channel) = channel {
            channel.emit(&());
        }
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        let entries = self.entries.borrow();
        entries.stack[entries.cursor].path.clone()
    }

    fn state(&self) -> Option<NavData> {
        let entries = self.entries.borrow();
        entries.stack[entries.cursor].data.clone()
    }

    fn push_state(&self, data: Option<NavData>, path: &str) {
        let mut entries = self.entries.borrow_mut();
        let next = entries.cursor + 1;
        entries.stack.truncate(next);
        entries.stack.push(HistoryEntry {
            path: path.to_string(),
            data: data.clone(),
        });
        entries.cursor = next;
        entries.transitions.push(Transition::Push {
            path: path.to_string(),
            data,
        });
    }

    fn replace_state(&self, data: Option<NavData>, path: &str) {
        let mut entries = self.entries.borrow_mut();
        let cursor = entries.cursor;
        entries.stack[cursor] = HistoryEntry {
            path: path.to_string(),
            data: data.clone(),
        };
        entries.transitions.push(Transition::Replace {
            path: path.to_string(),
            data,
        });
    }

    fn subscribe(&self, event: &str, listener: Rc<dyn Fn()>) -> Subscription {
        self.channels
            .borrow_mut()
            .entry(event.to_string())
            .or_default()
            .subscribe(move |_| listener())
    }
}
