//! Change notification for the map client.
//!
//! An [`EventEmitter`] is a shared, single-threaded listener list. Clones
//! share listeners, so the client can hand one clone to its subscription
//! callback and keep another for `on` / `off`.

#[cfg(test)]
#[path = "events_test.rs"]
mod events_test;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Events emitted by the map client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientEvent {
    /// A new grid replaced the displayed one.
    Change,
}

impl ClientEvent {
    /// Event name as used by script hosts.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Change => "change",
        }
    }
}

/// Handle returned by [`EventEmitter::on`], used to remove the listener.
pub type ListenerId = u64;

type Listener = Rc<RefCell<dyn FnMut(ClientEvent)>>;

#[derive(Default)]
struct EmitterInner {
    next_id: ListenerId,
    listeners: Vec<(ListenerId, ClientEvent, Listener)>,
}

/// Shared listener list.
#[derive(Clone, Default)]
pub struct EventEmitter {
    inner: Rc<RefCell<EmitterInner>>,
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.inner.borrow().listeners.len())
            .finish()
    }
}

impl EventEmitter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `listener` for `event`.
    pub fn on(&self, event: ClientEvent, listener: impl FnMut(ClientEvent) + 'static) -> ListenerId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.listeners.push((id, event, Rc::new(RefCell::new(listener))));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.listeners.len();
        inner.listeners.retain(|(lid, _, _)| *lid != id);
        inner.listeners.len() != before
    }

    /// Number of listeners registered for `event`.
    #[must_use]
    pub fn listener_count(&self, event: ClientEvent) -> usize {
        self.inner.borrow().listeners.iter().filter(|(_, e, _)| *e == event).count()
    }

    /// Call every listener registered for `event`, in registration order.
    ///
    /// Listeners may call `on` / `off` while being notified. A listener
    /// removed by an earlier one in the same round is skipped; one added
    /// during the round is first called on the next emit. A listener that
    /// re-emits is not re-entered. Returns the number of listeners called.
    pub fn emit(&self, event: ClientEvent) -> usize {
        let snapshot: Vec<(ListenerId, Listener)> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(id, _, l)| (*id, Rc::clone(l)))
            .collect();

        let mut called = 0;
        for (id, listener) in snapshot {
            if !self.is_registered(id) {
                continue;
            }
            let Ok(mut f) = listener.try_borrow_mut() else {
                continue;
            };
            (&mut *f)(event);
            called += 1;
        }
        called
    }

    fn is_registered(&self, id: ListenerId) -> bool {
        self.inner.borrow().listeners.iter().any(|(lid, _, _)| *lid == id)
    }
}
