//! Scoped subscription facade
//!
//! An [`EventScope`] accumulates every subscription made through it and
//! releases them all, in registration order, with one `dispose` call. Unlike
//! the registry's graceful teardown, using a disposed scope is a hard error:
//! it means some component outlived its owner.

use super::hub::{EventHub, Subscription};
use super::target::{ListenerOptions, ListenerTarget};
use super::EventError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

struct ScopeState {
    subscriptions: Vec<Subscription>,
    disposed: bool,
}

/// Group-disposal wrapper around an [`EventHub`].
pub struct EventScope<T> {
    hub: EventHub<T>,
    state: Mutex<ScopeState>,
}

impl<T: 'static> EventScope<T> {
    /// Create a scope over `hub`.
    #[must_use]
    pub fn new(hub: EventHub<T>) -> Self {
        Self {
            hub,
            state: Mutex::new(ScopeState {
                subscriptions: Vec::new(),
                disposed: false,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScopeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn track(&self, subscription: Subscription) {
        self.state().subscriptions.push(subscription);
    }

    fn ensure_live(&self) -> Result<(), EventError> {
        if self.state().disposed {
            Err(EventError::ScopeDisposed)
        } else {
            Ok(())
        }
    }

    /// Subscribe through the scope; released on [`dispose`](Self::dispose).
    ///
    /// # Errors
    ///
    /// [`EventError::ScopeDisposed`] after the scope was disposed.
    pub fn on(
        &self,
        event: &str,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Result<(), EventError> {
        self.ensure_live()?;
        self.track(self.hub.on(event, handler));
        Ok(())
    }

    /// One-shot subscription through the scope.
    ///
    /// # Errors
    ///
    /// [`EventError::ScopeDisposed`] after the scope was disposed.
    pub fn once(
        &self,
        event: &str,
        handler: impl Fn(&T) + Send + Sync + 'static,
    ) -> Result<(), EventError> {
        self.ensure_live()?;
        self.track(self.hub.once(event, handler));
        Ok(())
    }

    /// Attach an external listener through the scope.
    ///
    /// # Errors
    ///
    /// [`EventError::ScopeDisposed`] after the scope was disposed, or a
    /// registry error when listener teardown cannot be tracked.
    pub fn attach_listener<G>(
        &self,
        target: &Arc<G>,
        event: &str,
        handler: impl FnMut(&G::Event) + Send + 'static,
        options: ListenerOptions,
    ) -> Result<(), EventError>
    where
        G: ListenerTarget + Send + Sync + 'static,
    {
        self.ensure_live()?;
        self.track(self.hub.attach_listener(target, event, handler, options)?);
        Ok(())
    }

    /// Release every accumulated subscription, in registration order, and
    /// flip the scope into its disposed state.
    ///
    /// # Errors
    ///
    /// [`EventError::ScopeDisposed`] when called a second time.
    pub fn dispose(&self) -> Result<(), EventError> {
        let subscriptions = {
            let mut state = self.state();
            if state.disposed {
                return Err(EventError::ScopeDisposed);
            }
            state.disposed = true;
            std::mem::take(&mut state.subscriptions)
        };
        log::debug!("Disposing event scope ({} subscription(s))", subscriptions.len());
        for subscription in subscriptions {
            subscription.unsubscribe();
        }
        Ok(())
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::ResourceRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scope() -> EventScope<i32> {
        EventScope::new(EventHub::new(ResourceRegistry::default()))
    }

    #[test]
    fn test_dispose_releases_all_subscriptions() {
        let registry = ResourceRegistry::default();
        let hub: EventHub<i32> = EventHub::new(registry);
        let scope = EventScope::new(hub.clone());
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let counter = count.clone();
            scope
                .on("x", move |_| {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .expect("subscribe");
        }

        hub.emit("x", &0);
        assert_eq!(count.load(Ordering::SeqCst), 3);

        scope.dispose().expect("dispose");
        hub.emit("x", &0);
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert_eq!(hub.handler_count("x"), 0);
    }

    #[test]
    fn test_disposed_scope_rejects_use() {
        let scope = scope();
        scope.dispose().expect("dispose");

        assert!(matches!(
            scope.on("x", |_| {}),
            Err(EventError::ScopeDisposed)
        ));
        assert!(matches!(
            scope.once("x", |_| {}),
            Err(EventError::ScopeDisposed)
        ));
        assert!(matches!(scope.dispose(), Err(EventError::ScopeDisposed)));
        assert!(scope.is_disposed());
    }
}
