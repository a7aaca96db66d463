//! In-process publish/subscribe for dashboard regions
//!
//! Dispatch is synchronous and fire-and-forget. Handlers run in
//! registration order and may dispatch or subscribe from inside a handler.
//! The bus is UI-thread only; it is not `Send`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::signal::{Signal, SignalKind};

type Handler = Rc<dyn Fn(&Signal)>;

struct Registration {
    id: u64,
    kinds: Vec<SignalKind>,
    handler: Handler,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    registrations: Vec<Registration>,
}

impl Registry {
    fn contains(&self, id: u64) -> bool {
        self.registrations.iter().any(|r| r.id == id)
    }
}

/// Cloneable handle to a shared signal registry
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one signal
    pub fn on(&self, kind: SignalKind, handler: impl Fn(&Signal) + 'static) -> Subscription {
        self.on_any(&[kind], handler)
    }

    /// Register one handler for several signals
    pub fn on_any(
        &self,
        kinds: &[SignalKind],
        handler: impl Fn(&Signal) + 'static,
    ) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        registry.next_id += 1;
        let id = registry.next_id;
        registry.registrations.push(Registration {
            id,
            kinds: kinds.to_vec(),
            handler: Rc::new(handler),
        });
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    /// Deliver a signal to every live handler registered for its kind
    pub fn dispatch(&self, signal: Signal) {
        let kind = signal.kind();
        let targets: Vec<(u64, Handler)> = self
            .registry
            .borrow()
            .registrations
            .iter()
            .filter(|r| r.kinds.contains(&kind))
            .map(|r| (r.id, Rc::clone(&r.handler)))
            .collect();

        trace!(signal = kind.name(), handlers = targets.len(), "dispatch");

        for (id, handler) in targets {
            // An earlier handler may have dropped this subscription
            if !self.registry.borrow().contains(id) {
                continue;
            }
            handler(&signal);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.registry.borrow().registrations.len()
    }
}

/// Keeps a handler registered; dropping it unregisters the handler
#[must_use = "dropping a Subscription unregisters its handler"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Subscription {
    pub fn cancel(self) {}
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.try_borrow_mut() {
                registry.registrations.retain(|r| r.id != self.id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let first = {
            let log = Rc::clone(&log);
            bus.on(SignalKind::ForceRefresh, move |_| log.borrow_mut().push("first"))
        };
        let second = {
            let log = Rc::clone(&log);
            bus.on(SignalKind::ForceRefresh, move |_| log.borrow_mut().push("second"))
        };

        bus.dispatch(Signal::ForceRefresh);
        assert_eq!(*log.borrow(), vec!["first", "second"]);

        drop((first, second));
    }

    #[test]
    fn test_only_matching_kinds_are_called() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let _sub = {
            let hits = Rc::clone(&hits);
            bus.on(SignalKind::OpenMessages, move |_| hits.set(hits.get() + 1))
        };

        bus.dispatch(Signal::ForceRefresh);
        bus.dispatch(Signal::OpenMessages);
        bus.dispatch(Signal::OpenMessages);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_drop_unregisters() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let sub = {
            let hits = Rc::clone(&hits);
            bus.on(SignalKind::WindowFocused, move |_| hits.set(hits.get() + 1))
        };
        assert_eq!(bus.handler_count(), 1);

        sub.cancel();
        assert_eq!(bus.handler_count(), 0);

        bus.dispatch(Signal::WindowFocused);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_reentrant_dispatch() {
        let bus = EventBus::new();
        let opened = Rc::new(Cell::new(false));

        let _forward = {
            let inner = bus.clone();
            bus.on(SignalKind::OpenCreateOffer, move |_| {
                inner.dispatch(Signal::OpenMessages);
            })
        };
        let _sink = {
            let opened = Rc::clone(&opened);
            bus.on(SignalKind::OpenMessages, move |_| opened.set(true))
        };

        bus.dispatch(Signal::OpenCreateOffer);
        assert!(opened.get());
    }

    #[test]
    fn test_handler_cancelled_mid_dispatch_is_skipped() {
        let bus = EventBus::new();
        let hits = Rc::new(Cell::new(0));
        let victim: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let _killer = {
            let victim = Rc::clone(&victim);
            bus.on(SignalKind::ForceRefresh, move |_| {
                victim.borrow_mut().take();
            })
        };
        let sub = {
            let hits = Rc::clone(&hits);
            bus.on(SignalKind::ForceRefresh, move |_| hits.set(hits.get() + 1))
        };
        *victim.borrow_mut() = Some(sub);

        bus.dispatch(Signal::ForceRefresh);
        assert_eq!(hits.get(), 0);
    }
}
