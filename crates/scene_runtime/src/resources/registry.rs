//! Resource Registry - Central Ownership Ledger
//!
//! **SEPARATION OF CONCERNS**:
//! - ResourceRegistry: tracks what exists and runs all disposal logic
//! - EventHub: registers listener teardown here, never disposes directly
//! - SceneRuntime: triggers registry-wide disposal on scene teardown
//!
//! The registry is the single source of truth for "is this resource still
//! alive". Disposal is deliberately asymmetric: registering on a disposed
//! registry is a hard error (it indicates a lifecycle bug upstream), while
//! a failing disposer during teardown is logged and never propagated, so one
//! broken resource cannot prevent the rest of a scene from being released.
//!
//! **Ownership**: the registry is a cheap [`Clone`] handle over shared state
//! (`Arc<Mutex<..>>`); the runtime owns one and hands clones to subsystems.
//! The internal lock is never held across a disposer call, so disposers are
//! free to call back into the registry.

use crate::core::config::RegistryConfig;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// Teardown callback stored with a registered resource.
///
/// Failures are logged by the registry, never propagated.
pub type DisposeFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

/// Registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registration attempted after [`ResourceRegistry::dispose_all`]
    #[error("cannot register '{id}': registry already disposed")]
    Disposed {
        /// Identifier the caller tried to register
        id: String,
    },
}

/// Closed set of resource categories tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Render surface owning a drawing area
    Surface,
    /// Rendering context bound to a surface
    RenderContext,
    /// Listener attached to an external event source
    Listener,
    /// Scheduled per-frame callback
    FrameCallback,
    /// Decoded asset file (shared source data)
    AssetFile,
    /// Instantiated copy of a decoded asset
    AssetInstance,
    /// Running animation instance
    AnimationInstance,
    /// Scene-graph node
    SceneNode,
    /// Scene-graph text node
    TextNode,
    /// Physics body
    PhysicsBody,
    /// Physics world
    PhysicsWorld,
    /// Anything else with a disposer
    Generic,
}

impl ResourceKind {
    /// Fixed registry-wide disposal order: consumers are released before the
    /// things they consume. Frame callbacks and listeners go first (they
    /// reference everything else), leaf scene/physics resources next, then
    /// asset data, and the owning contexts/surfaces last.
    pub const DISPOSE_ORDER: [Self; 12] = [
        Self::FrameCallback,
        Self::Listener,
        Self::TextNode,
        Self::SceneNode,
        Self::PhysicsBody,
        Self::PhysicsWorld,
        Self::AnimationInstance,
        Self::AssetInstance,
        Self::AssetFile,
        Self::Generic,
        Self::RenderContext,
        Self::Surface,
    ];

    /// Canonical name, also used as the soft-limit key in
    /// [`RegistryConfig`](crate::core::config::RegistryConfig).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::RenderContext => "render_context",
            Self::Listener => "listener",
            Self::FrameCallback => "frame_callback",
            Self::AssetFile => "asset_file",
            Self::AssetInstance => "asset_instance",
            Self::AnimationInstance => "animation_instance",
            Self::SceneNode => "scene_node",
            Self::TextNode => "text_node",
            Self::PhysicsBody => "physics_body",
            Self::PhysicsWorld => "physics_world",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-kind live-entry counts, snapshotted by [`ResourceRegistry::stats`].
#[derive(Debug, Clone, Default)]
pub struct RegistryStats {
    /// Live entries per kind (kinds with zero entries are omitted)
    pub counts: HashMap<ResourceKind, usize>,
    /// Total live entries
    pub total: usize,
}

struct Entry {
    kind: ResourceKind,
    payload: Arc<dyn Any + Send + Sync>,
    disposer: Option<DisposeFn>,
}

#[derive(Default)]
struct RegistryState {
    entries: HashMap<String, Entry>,
    /// Insertion-ordered ids per kind; within a kind, disposal follows this order
    by_kind: HashMap<ResourceKind, Vec<String>>,
    disposed: bool,
    config: RegistryConfig,
}

/// Central ownership ledger for disposable scene resources.
///
/// Cloning yields another handle to the same underlying registry.
#[derive(Clone)]
pub struct ResourceRegistry {
    state: Arc<Mutex<RegistryState>>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}

impl ResourceRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new(config: RegistryConfig) -> Self {
        log::debug!("Creating ResourceRegistry");
        Self {
            state: Arc::new(Mutex::new(RegistryState {
                config,
                ..RegistryState::default()
            })),
        }
    }

    /// Lock the shared state, recovering from poisoning. Teardown must keep
    /// working even after a panic elsewhere.
    fn state(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a resource under a unique identifier.
    ///
    /// If `id` is already registered, the existing entry is unregistered
    /// first (its disposer runs) before the new one is stored. Exceeding the
    /// kind's soft limit logs a warning but still registers.
    ///
    /// Returns a shared handle to the stored resource.
    ///
    /// # Errors
    ///
    /// [`RegistryError::Disposed`] if the registry has been disposed; this is
    /// a lifecycle bug in the caller and is never swallowed.
    pub fn register<T: Send + Sync + 'static>(
        &self,
        id: impl Into<String>,
        kind: ResourceKind,
        resource: T,
        disposer: Option<DisposeFn>,
    ) -> Result<Arc<T>, RegistryError> {
        let id = id.into();

        // Evict any previous holder of this id before storing the new entry.
        let previous = {
            let mut state = self.state();
            if state.disposed {
                return Err(RegistryError::Disposed { id });
            }
            Self::remove_entry(&mut state, &id)
        };
        if let Some(entry) = previous {
            log::debug!("Replacing {} '{id}'", entry.kind);
            Self::run_disposer(&id, entry.disposer);
        }

        let payload = Arc::new(resource);
        let stored: Arc<dyn Any + Send + Sync> = payload.clone();

        let mut state = self.state();
        // dispose_all may have run while the replaced entry's disposer did.
        if state.disposed {
            return Err(RegistryError::Disposed { id });
        }

        let count = state.by_kind.get(&kind).map_or(0, Vec::len);
        let limit = state.config.soft_limit_for(kind);
        if limit > 0 && count >= limit {
            log::warn!("Resource kind '{kind}' exceeds soft limit {limit} ({count} registered)");
        }

        state.entries.insert(
            id.clone(),
            Entry {
                kind,
                payload: stored,
                disposer,
            },
        );
        state.by_kind.entry(kind).or_default().push(id.clone());
        log::trace!("Registered {kind} '{id}'");

        Ok(payload)
    }

    /// Unregister a resource and run its disposer.
    ///
    /// Returns `false` (a no-op, not an error) when `id` is unknown. A
    /// disposer failure is logged and never propagated.
    pub fn unregister(&self, id: &str) -> bool {
        let entry = {
            let mut state = self.state();
            Self::remove_entry(&mut state, id)
        };
        match entry {
            Some(entry) => {
                log::trace!("Unregistered {} '{id}'", entry.kind);
                Self::run_disposer(id, entry.disposer);
                true
            }
            None => false,
        }
    }

    /// Shared handle to a registered resource, untyped.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<Arc<dyn Any + Send + Sync>> {
        self.state().entries.get(id).map(|e| e.payload.clone())
    }

    /// Shared handle to a registered resource, downcast to `T`.
    ///
    /// `None` when `id` is unknown or holds a different type.
    #[must_use]
    pub fn get_as<T: Send + Sync + 'static>(&self, id: &str) -> Option<Arc<T>> {
        self.get(id).and_then(|any| any.downcast::<T>().ok())
    }

    /// Whether `id` is currently registered.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.state().entries.contains_key(id)
    }

    /// Ids registered under `kind`, in insertion order.
    #[must_use]
    pub fn ids_by_kind(&self, kind: ResourceKind) -> Vec<String> {
        self.state().by_kind.get(&kind).cloned().unwrap_or_default()
    }

    /// Number of live entries of one kind.
    #[must_use]
    pub fn count_by_kind(&self, kind: ResourceKind) -> usize {
        self.state().by_kind.get(&kind).map_or(0, Vec::len)
    }

    /// Total number of live entries.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.state().entries.len()
    }

    /// Per-kind counts snapshot.
    #[must_use]
    pub fn stats(&self) -> RegistryStats {
        let state = self.state();
        let counts = state
            .by_kind
            .iter()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(kind, ids)| (*kind, ids.len()))
            .collect();
        RegistryStats {
            counts,
            total: state.entries.len(),
        }
    }

    /// Whether [`dispose_all`](Self::dispose_all) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state().disposed
    }

    /// Unregister every resource of one kind.
    ///
    /// The id set is snapshotted first, so disposers may freely mutate the
    /// registry (including unregistering other entries of the same kind)
    /// without corrupting the sweep.
    pub fn dispose_kind(&self, kind: ResourceKind) {
        let ids = self.ids_by_kind(kind);
        if !ids.is_empty() {
            log::debug!("Disposing {} {kind} resource(s)", ids.len());
        }
        for id in ids {
            self.unregister(&id);
        }
    }

    /// Dispose every tracked resource in the fixed kind order and latch the
    /// registry into the disposed state.
    ///
    /// Idempotent: a second call finds nothing to dispose. The disposed flag
    /// is set before any disposer runs, so a registration racing with
    /// teardown fails instead of leaking.
    pub fn dispose_all(&self) {
        {
            let mut state = self.state();
            if state.disposed {
                return;
            }
            state.disposed = true;
        }
        log::debug!("Disposing all registry resources");
        for kind in ResourceKind::DISPOSE_ORDER {
            self.dispose_kind(kind);
        }
    }

    fn remove_entry(state: &mut RegistryState, id: &str) -> Option<Entry> {
        let entry = state.entries.remove(id)?;
        if let Some(ids) = state.by_kind.get_mut(&entry.kind) {
            ids.retain(|other| other != id);
        }
        Some(entry)
    }

    fn run_disposer(id: &str, disposer: Option<DisposeFn>) {
        if let Some(dispose) = disposer {
            if let Err(err) = dispose() {
                log::warn!("Disposer for '{id}' failed: {err:#}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_disposer(counter: &Arc<AtomicUsize>) -> Option<DisposeFn> {
        let counter = counter.clone();
        Some(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }))
    }

    #[test]
    fn test_register_and_get() {
        let registry = ResourceRegistry::default();
        registry
            .register("surf-1", ResourceKind::Surface, 42u32, None)
            .expect("register");

        assert!(registry.contains("surf-1"));
        assert_eq!(registry.get_as::<u32>("surf-1").as_deref(), Some(&42));
        assert!(registry.get_as::<String>("surf-1").is_none());
        assert_eq!(registry.total_count(), 1);
        assert_eq!(registry.count_by_kind(ResourceKind::Surface), 1);
    }

    #[test]
    fn test_unknown_id_is_absence_not_error() {
        let registry = ResourceRegistry::default();
        assert!(registry.get("nope").is_none());
        assert!(!registry.unregister("nope"));
    }

    #[test]
    fn test_unregister_runs_disposer_once() {
        let registry = ResourceRegistry::default();
        let disposals = Arc::new(AtomicUsize::new(0));
        registry
            .register(
                "node-1",
                ResourceKind::SceneNode,
                (),
                counting_disposer(&disposals),
            )
            .expect("register");

        assert!(registry.unregister("node-1"));
        assert!(!registry.unregister("node-1"));
        assert_eq!(disposals.load(Ordering::SeqCst), 1);
        assert_eq!(registry.total_count(), 0);
    }

    #[test]
    fn test_duplicate_id_replaces_and_disposes_old() {
        let registry = ResourceRegistry::default();
        let old_disposals = Arc::new(AtomicUsize::new(0));
        registry
            .register(
                "anim",
                ResourceKind::AnimationInstance,
                1u8,
                counting_disposer(&old_disposals),
            )
            .expect("register");
        registry
            .register("anim", ResourceKind::AnimationInstance, 2u8, None)
            .expect("replace");

        assert_eq!(old_disposals.load(Ordering::SeqCst), 1);
        assert_eq!(registry.get_as::<u8>("anim").as_deref(), Some(&2));
        assert_eq!(registry.count_by_kind(ResourceKind::AnimationInstance), 1);
    }

    #[test]
    fn test_disposer_failure_is_swallowed() {
        let registry = ResourceRegistry::default();
        registry
            .register(
                "bad",
                ResourceKind::Generic,
                (),
                Some(Box::new(|| Err(anyhow::anyhow!("backend gone")))),
            )
            .expect("register");

        assert!(registry.unregister("bad"));
        assert_eq!(registry.total_count(), 0);
    }

    #[test]
    fn test_soft_limit_is_advisory() {
        let config = RegistryConfig::new().with_soft_limit(ResourceKind::Listener, 1);
        let registry = ResourceRegistry::new(config);
        registry
            .register("l1", ResourceKind::Listener, (), None)
            .expect("register");
        // Past the limit: warns, still registers.
        registry
            .register("l2", ResourceKind::Listener, (), None)
            .expect("register past soft limit");
        assert_eq!(registry.count_by_kind(ResourceKind::Listener), 2);
    }

    #[test]
    fn test_dispose_kind_snapshot_tolerates_mutation() {
        let registry = ResourceRegistry::default();
        let disposals = Arc::new(AtomicUsize::new(0));

        // First node's disposer unregisters a sibling mid-sweep.
        let sibling_registry = registry.clone();
        let sibling_count = disposals.clone();
        registry
            .register(
                "node-a",
                ResourceKind::SceneNode,
                (),
                Some(Box::new(move || {
                    sibling_count.fetch_add(1, Ordering::SeqCst);
                    sibling_registry.unregister("node-b");
                    Ok(())
                })),
            )
            .expect("register");
        registry
            .register(
                "node-b",
                ResourceKind::SceneNode,
                (),
                counting_disposer(&disposals),
            )
            .expect("register");

        registry.dispose_kind(ResourceKind::SceneNode);
        // Both disposers ran exactly once; the snapshot sweep hit node-b's
        // id after it was already gone and treated it as a no-op.
        assert_eq!(disposals.load(Ordering::SeqCst), 2);
        assert_eq!(registry.total_count(), 0);
        assert!(!registry.is_disposed());
    }

    #[test]
    fn test_dispose_all_order_and_idempotence() {
        let registry = ResourceRegistry::default();
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        for (id, kind, label) in [
            ("s", ResourceKind::Surface, "surface"),
            ("cb", ResourceKind::FrameCallback, "callback"),
            ("ctx", ResourceKind::RenderContext, "context"),
            ("l", ResourceKind::Listener, "listener"),
        ] {
            let order = order.clone();
            registry
                .register(
                    id,
                    kind,
                    (),
                    Some(Box::new(move || {
                        order.lock().expect("order lock").push(label);
                        Ok(())
                    })),
                )
                .expect("register");
        }

        registry.dispose_all();
        registry.dispose_all(); // idempotent

        let order = order.lock().expect("order lock").clone();
        assert_eq!(order, vec!["callback", "listener", "context", "surface"]);
        assert_eq!(registry.total_count(), 0);
        assert!(registry.is_disposed());
    }

    #[test]
    fn test_register_after_dispose_fails() {
        let registry = ResourceRegistry::default();
        registry.dispose_all();
        let err = registry
            .register("late", ResourceKind::Generic, (), None)
            .expect_err("must fail");
        assert!(matches!(err, RegistryError::Disposed { .. }));
        // Reads still degrade gracefully.
        assert_eq!(registry.total_count(), 0);
        assert!(!registry.unregister("late"));
    }

    #[test]
    fn test_stats_counts_per_kind() {
        let registry = ResourceRegistry::default();
        registry
            .register("a", ResourceKind::SceneNode, (), None)
            .expect("register");
        registry
            .register("b", ResourceKind::SceneNode, (), None)
            .expect("register");
        registry
            .register("c", ResourceKind::Surface, (), None)
            .expect("register");

        let stats = registry.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.counts.get(&ResourceKind::SceneNode), Some(&2));
        assert_eq!(stats.counts.get(&ResourceKind::Surface), Some(&1));
        assert_eq!(stats.counts.get(&ResourceKind::Listener), None);
    }
}
