//! Typed publish/subscribe hub
//!
//! The hub is generic over the payload type `T` it transports, so the core
//! stays decoupled from the event enums higher layers define. Topics are
//! string names; per-object channels compose the object identifier into the
//! topic via [`scoped_topic`].

use super::target::{ListenerId, ListenerOptions, ListenerTarget};
use crate::resources::{DisposeFn, RegistryError, ResourceKind, ResourceRegistry};
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Handle returned by every subscription operation.
///
/// Unsubscribing is explicit: dropping the handle leaves the handler
/// attached (the registry backstop still detaches adapter listeners on
/// teardown).
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the handler. Safe to call after the hub is gone.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Compose a per-object topic from an event name and an object identifier.
#[must_use]
pub fn scoped_topic(event: &str, id: &str) -> String {
    format!("{event}@{id}")
}

struct HandlerEntry<T> {
    id: u64,
    once: bool,
    func: Arc<dyn Fn(&T) + Send + Sync>,
}

struct HubState<T> {
    handlers: HashMap<String, Vec<HandlerEntry<T>>>,
    next_id: u64,
}

/// Typed publish/subscribe hub bound to a [`ResourceRegistry`].
///
/// Cloning yields another handle to the same hub.
pub struct EventHub<T> {
    state: Arc<Mutex<HubState<T>>>,
    registry: ResourceRegistry,
    listener_seq: Arc<AtomicU64>,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            registry: self.registry.clone(),
            listener_seq: self.listener_seq.clone(),
        }
    }
}

impl<T: 'static> EventHub<T> {
    /// Create a hub whose adapter listeners are tracked by `registry`.
    #[must_use]
    pub fn new(registry: ResourceRegistry) -> Self {
        log::debug!("Creating EventHub");
        Self {
            state: Arc::new(Mutex::new(HubState {
                handlers: HashMap::new(),
                next_id: 0,
            })),
            registry,
            listener_seq: Arc::new(AtomicU64::new(0)),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe `handler` to `event`. Delivery follows subscription order.
    pub fn on(
        &self,
        event: &str,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(event, false, handler)
    }

    /// Subscribe `handler` to `event` for a single delivery.
    pub fn once(
        &self,
        event: &str,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        self.subscribe(event, true, handler)
    }

    fn subscribe(
        &self,
        event: &str,
        once: bool,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Subscription {
        let id = {
            let mut state = self.state();
            let id = state.next_id;
            state.next_id += 1;
            state.handlers.entry(event.to_string()).or_default().push(
                HandlerEntry {
                    id,
                    once,
                    func: Arc::new(handler),
                },
            );
            id
        };

        let weak = Arc::downgrade(&self.state);
        let topic = event.to_string();
        Subscription::new(move || Self::remove_handler(&weak, &topic, id))
    }

    /// Publish `data` to every handler of `event`.
    ///
    /// Dispatch iterates a snapshot of the handler list, so handlers may
    /// subscribe or unsubscribe mid-emit without corrupting delivery. A
    /// panicking handler is logged with the event name and does not stop
    /// delivery to the rest.
    pub fn emit(&self, event: &str, data: &T) {
        let snapshot: Vec<Arc<dyn Fn(&T) + Send + Sync>> = {
            let mut state = self.state();
            let Some(entries) = state.handlers.get_mut(event) else {
                return;
            };
            let funcs = entries.iter().map(|e| e.func.clone()).collect();
            // One-shot handlers are consumed by this delivery. Drop them
            // before any handler body runs, so a handler that re-emits the
            // same event cannot fire them a second time.
            entries.retain(|e| !e.once);
            if entries.is_empty() {
                state.handlers.remove(event);
            }
            funcs
        };

        for func in snapshot {
            if catch_unwind(AssertUnwindSafe(|| func(data))).is_err() {
                log::error!("Handler for event '{event}' panicked");
            }
        }
    }

    /// Drop every handler for `event`.
    pub fn off(&self, event: &str) {
        self.state().handlers.remove(event);
    }

    /// Drop every handler on every topic. Attached listeners are not
    /// detached here; their teardown lives in the registry.
    pub fn clear(&self) {
        let mut state = self.state();
        if !state.handlers.is_empty() {
            log::debug!("Clearing {} event topic(s)", state.handlers.len());
            state.handlers.clear();
        }
    }

    /// Number of handlers currently subscribed to `event`.
    #[must_use]
    pub fn handler_count(&self, event: &str) -> usize {
        self.state().handlers.get(event).map_or(0, Vec::len)
    }

    /// Attach a handler to a listener-style external source and register its
    /// teardown with the resource registry, so a registry-wide dispose also
    /// detaches it even if the caller forgot to unsubscribe.
    ///
    /// # Errors
    ///
    /// Fails when the registry is already disposed.
    pub fn attach_listener<G>(
        &self,
        target: &Arc<G>,
        event: &str,
        handler: impl FnMut(&G::Event) + Send + 'static,
        options: ListenerOptions,
    ) -> Result<Subscription, RegistryError>
    where
        G: ListenerTarget + Send + Sync + 'static,
    {
        let listener_id = ListenerId(self.listener_seq.fetch_add(1, Ordering::Relaxed));
        target.add_listener(event, listener_id, Box::new(handler), options);

        let detach_target = target.clone();
        let detach_event = event.to_string();
        let detach: DisposeFn = Box::new(move || {
            detach_target.remove_listener(&detach_event, listener_id);
            Ok(())
        });

        let resource_id = format!("listener-{}-{event}", listener_id.0);
        self.registry
            .register(resource_id.clone(), ResourceKind::Listener, (), Some(detach))?;

        let registry = self.registry.clone();
        Ok(Subscription::new(move || {
            registry.unregister(&resource_id);
        }))
    }

    /// The registry this hub registers listener teardown with.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    fn remove_handler(state: &Weak<Mutex<HubState<T>>>, event: &str, id: u64) {
        let Some(state) = state.upgrade() else {
            return;
        };
        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entries) = state.handlers.get_mut(event) {
            entries.retain(|e| e.id != id);
            // Drop the topic once its handler set is empty.
            if entries.is_empty() {
                state.handlers.remove(event);
            }
        }
    }
}
