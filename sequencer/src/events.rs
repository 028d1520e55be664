//! Synchronous fan-out of committed events.

/// Listeners are invoked inline on the committing thread, in subscription order.
pub struct EventBus<E> {
    listeners: Vec<Box<dyn Fn(&E) + Send + Sync>>,
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            listeners: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, listener: Box<dyn Fn(&E) + Send + Sync>) {
        self.listeners.push(listener);
    }

    pub fn emit(&self, event: &E) {
        for listener in &self.listeners {
            listener(event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    #[test]
    fn emit_calls_all_listeners() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut bus = EventBus::<u32>::new();
        for _ in 0..3 {
            let c = Arc::clone(&counter);
            bus.subscribe(Box::new(move |_| {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }
        bus.emit(&7);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(bus.listener_count(), 3);
    }

    #[test]
    fn listeners_see_events_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut bus = EventBus::<&'static str>::new();
        let s = Arc::clone(&seen);
        bus.subscribe(Box::new(move |e| s.lock().unwrap().push(*e)));
        bus.emit(&"a");
        bus.emit(&"b");
        assert_eq!(*seen.lock().unwrap(), vec!["a", "b"]);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        EventBus::<u8>::default().emit(&1);
    }
}
