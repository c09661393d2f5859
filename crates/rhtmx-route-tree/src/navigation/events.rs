// File: src/navigation/events.rs
// Purpose: Single-threaded listener channels with drop-to-unsubscribe handles

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Listener<T> = Rc<dyn Fn(&T)>;

struct Listeners<T> {
    next_id: u64,
    entries: Vec<(u64, Listener<T>)>,
}

/// A list of listeners notified in subscription order
///
/// Emitting snapshots the listener list first, so listeners may subscribe,
/// unsubscribe or emit again while being notified.
pub struct Channel<T> {
    listeners: Rc<RefCell<Listeners<T>>>,
}

impl<T: 'static> Channel<T> {
    pub fn new() -> Self {
        Self {
            listeners: Rc::new(RefCell::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Registers `listener`; dropping the returned handle removes it
    pub fn subscribe(&self, listener: impl Fn(&T) + 'static) -> Subscription {
        let id = {
            let mut listeners = self.listeners.borrow_mut();
            let id = listeners.next_id;
            listeners.next_id += 1;
            listeners.entries.push((id, Rc::new(listener)));
            id
        };

        let weak: Weak<RefCell<Listeners<T>>> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = weak.upgrade() {
                listeners.borrow_mut().entries.retain(|(entry, _)| *entry != id);
            }
        })
    }

    /// Notifies every listener registered at the time of the call
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Listener<T>> = self
            .listeners
            .borrow()
            .entries
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(value);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl<T: 'static> Default for Channel<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Clones share the same listener list
impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            listeners: Rc::clone(&self.listeners),
        }
    }
}

impl<T> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("listeners", &self.listeners.borrow().entries.len())
            .finish()
    }
}

/// Handle to a registered listener
///
/// The listener stays registered for as long as the handle lives.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle that owns nothing
    pub fn empty() -> Self {
        Self { cancel: None }
    }

    /// Removes the listener now
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Keeps the listener registered for the lifetime of its channel
    pub fn detach(mut self) {
        self.cancel = None;
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}
