//! # Scene Runtime
//!
//! Top-level wiring for the core subsystems. [`SceneRuntime`] owns a
//! [`ServiceContainer`] with the [`ResourceRegistry`] and [`EventHub`]
//! registered as singletons, plus the per-frame state (viewport culler and
//! frame clock) that belongs to the driving loop rather than the container.
//!
//! Shutdown is a single barrier: [`SceneRuntime::shutdown`] disposes the
//! container, which concurrently disposes every materialized service — the
//! registry releases all tracked resources in its fixed kind order, and the
//! hub drops its remaining handlers.

use crate::core::config::RuntimeConfig;
use crate::culling::{CullStats, Renderable, ViewportCuller, ViewportUpdate};
use crate::events::EventHub;
use crate::foundation::time::FrameClock;
use crate::resources::ResourceRegistry;
use crate::services::{ContainerError, Service, ServiceContainer};
use async_trait::async_trait;
use thiserror::Error;

/// Runtime construction and wiring errors
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The supplied configuration failed validation
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A core service could not be wired up
    #[error(transparent)]
    Container(#[from] ContainerError),
}

#[async_trait]
impl Service for ResourceRegistry {
    async fn dispose(&self) -> anyhow::Result<()> {
        self.dispose_all();
        Ok(())
    }
}

#[async_trait]
impl<E: Send + Sync + 'static> Service for EventHub<E> {
    async fn dispose(&self) -> anyhow::Result<()> {
        self.clear();
        Ok(())
    }
}

/// The assembled runtime core for one scene.
///
/// `E` is the application's event payload type, shared by every subscriber
/// on the runtime's hub.
pub struct SceneRuntime<E: Send + Sync + 'static> {
    container: ServiceContainer,
    registry: ResourceRegistry,
    events: EventHub<E>,
    culler: ViewportCuller,
    clock: FrameClock,
}

impl<E: Send + Sync + 'static> SceneRuntime<E> {
    /// Build a runtime from `config`.
    ///
    /// # Errors
    ///
    /// [`RuntimeError::Config`] when validation rejects the configuration,
    /// [`RuntimeError::Container`] when wiring fails.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate().map_err(RuntimeError::Config)?;
        log::info!("Initializing scene runtime");

        let container = ServiceContainer::new();
        let registry_config = config.registry.clone();
        container.register_singleton(move |_| {
            Ok(ResourceRegistry::new(registry_config.clone()))
        });
        container.register_singleton(|c| {
            let registry = c.resolve::<ResourceRegistry>()?;
            Ok(EventHub::<E>::new((*registry).clone()))
        });

        // Both are Arc-backed handles; keep direct clones for hot-path
        // access without going through the container.
        let registry = (*container.resolve::<ResourceRegistry>()?).clone();
        let events = (*container.resolve::<EventHub<E>>()?).clone();

        Ok(Self {
            container,
            registry,
            events,
            culler: ViewportCuller::new(config.culling),
            clock: FrameClock::new(),
        })
    }

    /// The shared resource ledger.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// The runtime-wide event hub.
    #[must_use]
    pub fn events(&self) -> &EventHub<E> {
        &self.events
    }

    /// The service container, for registering application services.
    #[must_use]
    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Merge a partial viewport update into the culler.
    pub fn set_viewport(&mut self, update: ViewportUpdate) {
        self.culler.set_viewport(update);
    }

    /// Run one frame: tick the clock, then cull `objects` against the
    /// current viewport.
    pub fn cull<'a, R: Renderable>(&mut self, objects: &'a mut [R]) -> Vec<&'a R> {
        self.clock.tick();
        self.culler.cull(objects)
    }

    /// Frames processed so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Statistics from the most recent cull pass.
    #[must_use]
    pub fn cull_stats(&self) -> CullStats {
        self.culler.stats()
    }

    /// Tear the runtime down.
    ///
    /// Disposes every container singleton concurrently; the registry
    /// releases all tracked resources in its fixed kind order. After this
    /// returns, every registered disposer has run.
    pub async fn shutdown(self) {
        log::info!(
            "Shutting down scene runtime after {} frame(s)",
            self.clock.frame_count()
        );
        self.container.dispose().await;
    }
}
