//! Listener registration for engine events
//!
//! Components that produce events own an [`EventEmitter`]. Interested code
//! registers closures with [`EventEmitter::subscribe`] and removes them with the
//! returned [`ListenerId`]. An emitter without listeners does nothing, which is
//! the default behavior for every hook in the engine.
//!
//! # Example
//!
//! ```ignore
//! let emitter = EventEmitter::<u32>::new();
//! let id = emitter.subscribe(|value| log::info!("got {value}"));
//! emitter.emit(&7);
//! emitter.unsubscribe(id);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

/// Identifies a registered listener so it can be removed later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener<E> = Rc<dyn Fn(&E)>;

/// A list of listeners for events of type `E`.
///
/// Registration uses interior mutability so listeners can be added through a
/// shared reference, including from inside another listener.
pub struct EventEmitter<E> {
    listeners: RefCell<Vec<(ListenerId, Listener<E>)>>,
    next_id: Cell<u64>,
}

impl<E> EventEmitter<E> {
    /// Create an emitter with no listeners
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Register a listener. Listeners run in registration order.
    pub fn subscribe(&self, listener: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener.
    ///
    /// Returns false if the id was unknown (or already removed).
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Deliver an event to every listener registered at the time of the call.
    pub fn emit(&self, event: &E) {
        // Snapshot first: listeners may subscribe or unsubscribe while running.
        let snapshot: SmallVec<[Listener<E>; 4]> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    /// Number of registered listeners
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Remove all listeners
    pub fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Something that emits events of a single type.
pub trait EventSource {
    /// Event payload type
    type Event;

    /// The emitter listeners register with
    fn events(&self) -> &EventEmitter<Self::Event>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_listeners_is_noop() {
        let emitter = EventEmitter::<i32>::new();
        emitter.emit(&1);
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_listeners_run_in_order() {
        let emitter = EventEmitter::<i32>::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        emitter.subscribe(move |v| first.borrow_mut().push(("first", *v)));
        let second = Rc::clone(&seen);
        emitter.subscribe(move |v| second.borrow_mut().push(("second", *v)));

        emitter.emit(&5);
        assert_eq!(*seen.borrow(), vec![("first", 5), ("second", 5)]);
    }

    #[test]
    fn test_unsubscribe_twice() {
        let emitter = EventEmitter::<()>::new();
        let id = emitter.subscribe(|_| {});
        assert!(emitter.unsubscribe(id));
        assert!(!emitter.unsubscribe(id));
        assert_eq!(emitter.listener_count(), 0);
    }

    #[test]
    fn test_subscribe_during_emit() {
        let emitter = Rc::new(EventEmitter::<u8>::new());
        let count = Rc::new(Cell::new(0));

        let inner_emitter = Rc::clone(&emitter);
        let inner_count = Rc::clone(&count);
        emitter.subscribe(move |_| {
            let counter = Rc::clone(&inner_count);
            inner_emitter.subscribe(move |_| counter.set(counter.get() + 1));
        });

        // The listener added during this emit does not see this event
        emitter.emit(&0);
        assert_eq!(count.get(), 0);
        assert_eq!(emitter.listener_count(), 2);

        emitter.emit(&0);
        assert_eq!(count.get(), 1);
    }
}
