//! Minimal dependency-injection container
//!
//! Services are keyed by their concrete type (a [`TypeId`] map, no string
//! tokens to typo) and constructed lazily by explicit factory closures.
//! There is no reflection-style autowiring: a factory that needs a
//! dependency resolves it from the container it is handed.
//!
//! The runtime drives a scene on one logical thread, so the container uses
//! `RefCell` interior mutability and no locking; it is not `Sync` and does
//! not need to be. Disposal is the one asynchronous operation: every
//! materialized singleton's [`Service::dispose`] runs concurrently, and a
//! failure in one never blocks the others.

use async_trait::async_trait;
use futures::future::join_all;
use std::any::{type_name, Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Container errors. All of these indicate a wiring or lifecycle bug in the
/// caller and are never swallowed internally.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// `resolve` was called for a type no `register_*` call introduced
    #[error("service not registered: {0}")]
    NotRegistered(&'static str),

    /// A factory resolved its own type, directly or transitively
    #[error("circular dependency while resolving {service}: {chain}")]
    CircularDependency {
        /// The type whose resolution closed the cycle
        service: &'static str,
        /// The resolution chain, outermost first
        chain: String,
    },

    /// A factory returned an error
    #[error("factory for service {service} failed: {message}")]
    Factory {
        /// The type being constructed
        service: &'static str,
        /// Rendered factory error chain
        message: String,
    },

    /// A memoized instance did not downcast to the requested type
    #[error("stored instance for {0} has an unexpected type")]
    TypeMismatch(&'static str),
}

/// Anything constructed by the container.
///
/// `dispose` defaults to a no-op: a service with nothing to clean up simply
/// does not override it.
#[async_trait]
pub trait Service: Any + Send + Sync {
    /// Release external resources held by this service.
    async fn dispose(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

type AnyArc = Arc<dyn Any + Send + Sync>;
type Factory = Arc<dyn Fn(&ServiceContainer) -> anyhow::Result<AnyArc>>;
type DisposeFuture = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>;
type Disposer = Arc<dyn Fn(AnyArc) -> DisposeFuture>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifetime {
    Singleton,
    Transient,
}

struct Descriptor {
    name: &'static str,
    lifetime: Lifetime,
    factory: Factory,
    disposer: Disposer,
    instance: Option<AnyArc>,
}

/// Type-keyed dependency-injection container with lazy singletons, circular
/// construction detection, and ordered asynchronous teardown.
#[derive(Default)]
pub struct ServiceContainer {
    descriptors: RefCell<HashMap<TypeId, Descriptor>>,
    /// Types currently mid-construction on this call stack
    resolving: RefCell<Vec<(TypeId, &'static str)>>,
}

/// Pops the resolution stack even when a factory errors or panics.
struct ResolveGuard<'a> {
    container: &'a ServiceContainer,
}

impl Drop for ResolveGuard<'_> {
    fn drop(&mut self) {
        self.container.resolving.borrow_mut().pop();
    }
}

impl ServiceContainer {
    /// Create an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` with one shared instance, constructed on first resolve.
    pub fn register_singleton<T, F>(&self, factory: F)
    where
        T: Service,
        F: Fn(&Self) -> anyhow::Result<T> + 'static,
    {
        self.register(Lifetime::Singleton, factory);
    }

    /// Register `T` with a fresh instance per resolve.
    pub fn register_transient<T, F>(&self, factory: F)
    where
        T: Service,
        F: Fn(&Self) -> anyhow::Result<T> + 'static,
    {
        self.register(Lifetime::Transient, factory);
    }

    fn register<T, F>(&self, lifetime: Lifetime, factory: F)
    where
        T: Service,
        F: Fn(&Self) -> anyhow::Result<T> + 'static,
    {
        let factory: Factory = Arc::new(move |container| {
            let service = factory(container)?;
            Ok(Arc::new(service) as AnyArc)
        });
        let disposer: Disposer = Arc::new(|any: AnyArc| match any.downcast::<T>() {
            Ok(service) => Box::pin(async move { service.dispose().await }),
            Err(_) => Box::pin(async { Ok(()) }),
        });

        let replaced = self.descriptors.borrow_mut().insert(
            TypeId::of::<T>(),
            Descriptor {
                name: type_name::<T>(),
                lifetime,
                factory,
                disposer,
                instance: None,
            },
        );
        if replaced.is_some() {
            log::debug!("Re-registered service {}", type_name::<T>());
        }
    }

    /// Whether `T` has been registered.
    #[must_use]
    pub fn contains<T: Service>(&self) -> bool {
        self.descriptors.borrow().contains_key(&TypeId::of::<T>())
    }

    /// Resolve an instance of `T`.
    ///
    /// Singletons are constructed once and memoized; transients are
    /// constructed on every call.
    ///
    /// # Errors
    ///
    /// [`ContainerError::NotRegistered`] for an unknown type,
    /// [`ContainerError::CircularDependency`] when `T` is already being
    /// constructed on the current call stack, and
    /// [`ContainerError::Factory`] when the factory itself fails.
    pub fn resolve<T: Service>(&self) -> Result<Arc<T>, ContainerError> {
        let type_id = TypeId::of::<T>();
        let name = type_name::<T>();

        {
            let resolving = self.resolving.borrow();
            if resolving.iter().any(|(id, _)| *id == type_id) {
                let chain = resolving
                    .iter()
                    .map(|(_, n)| *n)
                    .chain(std::iter::once(name))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(ContainerError::CircularDependency {
                    service: name,
                    chain,
                });
            }
        }

        let (factory, lifetime) = {
            let descriptors = self.descriptors.borrow();
            let descriptor = descriptors
                .get(&type_id)
                .ok_or(ContainerError::NotRegistered(name))?;
            if let Some(instance) = &descriptor.instance {
                return Self::downcast_arc(instance.clone());
            }
            (descriptor.factory.clone(), descriptor.lifetime)
        };

        self.resolving.borrow_mut().push((type_id, name));
        let guard = ResolveGuard { container: self };
        let constructed = (factory)(self);
        drop(guard);

        // A container error raised by a nested resolve (cycle, missing
        // dependency) passes through unwrapped; only genuine construction
        // failures become Factory errors.
        let instance = constructed.map_err(|err| match err.downcast::<ContainerError>() {
            Ok(container_err) => container_err,
            Err(err) => ContainerError::Factory {
                service: name,
                message: format!("{err:#}"),
            },
        })?;

        if lifetime == Lifetime::Singleton {
            if let Some(descriptor) = self.descriptors.borrow_mut().get_mut(&type_id) {
                descriptor.instance = Some(instance.clone());
            }
            log::trace!("Materialized singleton {name}");
        }

        Self::downcast_arc(instance)
    }

    /// New container sharing this one's registrations but none of its
    /// instances — a scoped lifetime (per-scene) over shared wiring.
    #[must_use]
    pub fn create_child(&self) -> Self {
        let descriptors = self
            .descriptors
            .borrow()
            .iter()
            .map(|(type_id, d)| {
                (
                    *type_id,
                    Descriptor {
                        name: d.name,
                        lifetime: d.lifetime,
                        factory: d.factory.clone(),
                        disposer: d.disposer.clone(),
                        instance: None,
                    },
                )
            })
            .collect();
        Self {
            descriptors: RefCell::new(descriptors),
            resolving: RefCell::new(Vec::new()),
        }
    }

    /// Dispose every materialized singleton concurrently and clear the
    /// memoized instances.
    ///
    /// The instances are detached from the container synchronously, before
    /// any disposer runs, so no resolve can observe a half-disposed
    /// singleton. Each disposal failure is logged and isolated from its
    /// siblings.
    pub async fn dispose(&self) {
        let pending: Vec<(&'static str, DisposeFuture)> = {
            let mut descriptors = self.descriptors.borrow_mut();
            descriptors
                .values_mut()
                .filter_map(|descriptor| {
                    descriptor
                        .instance
                        .take()
                        .map(|instance| (descriptor.name, (descriptor.disposer)(instance)))
                })
                .collect()
        };
        if pending.is_empty() {
            return;
        }

        log::debug!("Disposing {} singleton service(s)", pending.len());
        let (names, futures): (Vec<_>, Vec<_>) = pending.into_iter().unzip();
        let results = join_all(futures).await;
        for (name, result) in names.into_iter().zip(results) {
            if let Err(err) = result {
                log::warn!("Disposing service {name} failed: {err:#}");
            }
        }
    }

    fn downcast_arc<T: Service>(instance: AnyArc) -> Result<Arc<T>, ContainerError> {
        instance
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch(type_name::<T>()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Clock {
        // Distinguishes instances in identity tests
        serial: usize,
    }

    #[async_trait]
    impl Service for Clock {}

    struct Tracker {
        disposals: Arc<AtomicUsize>,
        fail: bool,
    }

    #[async_trait]
    impl Service for Tracker {
        async fn dispose(&self) -> anyhow::Result<()> {
            self.disposals.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                anyhow::bail!("tracker backend unavailable");
            }
            Ok(())
        }
    }

    struct NeedsClock {
        clock: Arc<Clock>,
    }

    #[async_trait]
    impl Service for NeedsClock {}

    #[test]
    fn test_singleton_returns_identical_instance() {
        let container = ServiceContainer::new();
        container.register_singleton(|_| Ok(Clock { serial: 1 }));

        let first = container.resolve::<Clock>().expect("resolve");
        let second = container.resolve::<Clock>().expect("resolve");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_transient_returns_fresh_instance() {
        let container = ServiceContainer::new();
        let serial = Arc::new(AtomicUsize::new(0));
        let counter = serial.clone();
        container.register_transient(move |_| {
            Ok(Clock {
                serial: counter.fetch_add(1, Ordering::SeqCst),
            })
        });

        let first = container.resolve::<Clock>().expect("resolve");
        let second = container.resolve::<Clock>().expect("resolve");
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.serial, second.serial);
    }

    #[test]
    fn test_unregistered_type_errors() {
        let container = ServiceContainer::new();
        assert!(matches!(
            container.resolve::<Clock>(),
            Err(ContainerError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_factory_pulls_dependencies() {
        let container = ServiceContainer::new();
        container.register_singleton(|_| Ok(Clock { serial: 7 }));
        container.register_singleton(|c| {
            Ok(NeedsClock {
                clock: c.resolve::<Clock>()?,
            })
        });

        let service = container.resolve::<NeedsClock>().expect("resolve");
        assert_eq!(service.clock.serial, 7);
    }

    #[test]
    fn test_missing_dependency_surfaces_unwrapped() {
        let container = ServiceContainer::new();
        container.register_singleton(|c| {
            Ok(NeedsClock {
                clock: c.resolve::<Clock>()?, // Clock never registered
            })
        });

        assert!(matches!(
            container.resolve::<NeedsClock>(),
            Err(ContainerError::NotRegistered(_))
        ));
    }

    #[test]
    fn test_genuine_factory_failure_reported_as_factory_error() {
        let container = ServiceContainer::new();
        container.register_singleton::<Clock, _>(|_| anyhow::bail!("backend offline"));

        match container.resolve::<Clock>() {
            Err(ContainerError::Factory { message, .. }) => {
                assert!(message.contains("backend offline"));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("resolve unexpectedly succeeded"),
        }
    }

    #[test]
    fn test_self_cycle_detected() {
        let container = ServiceContainer::new();
        container.register_singleton(|c| {
            let _self_ref = c.resolve::<Clock>()?;
            Ok(Clock { serial: 0 })
        });

        assert!(matches!(
            container.resolve::<Clock>(),
            Err(ContainerError::CircularDependency { .. })
        ));
    }

    #[test]
    fn test_transitive_cycle_detected() {
        #[derive(Debug)]
        struct A;
        #[derive(Debug)]
        struct B;
        #[async_trait]
        impl Service for A {}
        #[async_trait]
        impl Service for B {}

        let container = ServiceContainer::new();
        container.register_singleton(|c| {
            let _b = c.resolve::<B>()?;
            Ok(A)
        });
        container.register_singleton(|c| {
            let _a = c.resolve::<A>()?;
            Ok(B)
        });

        let err = container.resolve::<A>().expect_err("must cycle");
        match err {
            ContainerError::CircularDependency { chain, .. } => {
                assert!(chain.contains("A") && chain.contains("B"));
            }
            other => panic!("unexpected error: {other}"),
        }
        // The resolution stack unwound; later resolves are not poisoned.
        assert!(container.resolving.borrow().is_empty());
    }

    #[test]
    fn test_child_container_has_own_instances() {
        let container = ServiceContainer::new();
        container.register_singleton(|_| Ok(Clock { serial: 1 }));
        let parent_clock = container.resolve::<Clock>().expect("resolve");

        let child = container.create_child();
        assert!(child.contains::<Clock>());
        let child_clock = child.resolve::<Clock>().expect("resolve");
        assert!(!Arc::ptr_eq(&parent_clock, &child_clock));
    }

    #[tokio::test]
    async fn test_dispose_runs_each_singleton_once() {
        let container = ServiceContainer::new();
        let disposals = Arc::new(AtomicUsize::new(0));
        let counter = disposals.clone();
        container.register_singleton(move |_| {
            Ok(Tracker {
                disposals: counter.clone(),
                fail: false,
            })
        });

        let _service = container.resolve::<Tracker>().expect("resolve");
        container.dispose().await;
        container.dispose().await; // nothing left to dispose
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dispose_failure_does_not_block_siblings() {
        struct Failing(Tracker);
        #[async_trait]
        impl Service for Failing {
            async fn dispose(&self) -> anyhow::Result<()> {
                self.0.dispose().await
            }
        }

        let container = ServiceContainer::new();
        let disposals = Arc::new(AtomicUsize::new(0));

        let counter = disposals.clone();
        container.register_singleton(move |_| {
            Ok(Failing(Tracker {
                disposals: counter.clone(),
                fail: true,
            }))
        });
        let counter = disposals.clone();
        container.register_singleton(move |_| {
            Ok(Tracker {
                disposals: counter.clone(),
                fail: false,
            })
        });

        let _failing = container.resolve::<Failing>().expect("resolve");
        let _healthy = container.resolve::<Tracker>().expect("resolve");
        container.dispose().await;
        assert_eq!(disposals.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unmaterialized_singleton_not_constructed_by_dispose() {
        let container = ServiceContainer::new();
        let disposals = Arc::new(AtomicUsize::new(0));
        let counter = disposals.clone();
        container.register_singleton(move |_| {
            Ok(Tracker {
                disposals: counter.clone(),
                fail: false,
            })
        });

        container.dispose().await; // never resolved: nothing to do
        assert_eq!(disposals.load(Ordering::SeqCst), 0);
    }
}
