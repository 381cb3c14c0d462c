//! # Scene Runtime
//!
//! Core primitives for real-time scene rendering applications:
//! resource lifetime tracking, typed event dispatch, bounded caching,
//! viewport culling with spatial indexing, and dependency injection.
//!
//! ## Features
//!
//! - **Resource Registry**: every disposable object a scene creates is
//!   tracked and released in a fixed, dependency-safe order at teardown
//! - **Event Hub**: typed publish/subscribe with snapshot dispatch, panic
//!   isolation, and automatic cleanup of adapted external listeners
//! - **Bounded Cache**: LRU eviction under entry-count, byte-size, and TTL
//!   limits, with an eviction callback on every removal path
//! - **Viewport Culling**: margin-expanded visibility filtering plus a
//!   uniform spatial grid for cheap region queries
//! - **Service Container**: lazy singletons, circular-construction
//!   detection, child scopes, and concurrent async disposal
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_runtime::prelude::*;
//!
//! #[derive(Debug)]
//! enum SceneEvent {
//!     Ready,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut runtime = SceneRuntime::<SceneEvent>::new(RuntimeConfig::default())?;
//!     runtime.set_viewport(ViewportUpdate {
//!         width: Some(1280.0),
//!         height: Some(720.0),
//!         ..ViewportUpdate::default()
//!     });
//!
//!     let _sub = runtime.events().on("ready", |event| {
//!         println!("{event:?}");
//!     });
//!     runtime.events().emit("ready", &SceneEvent::Ready);
//!
//!     runtime.shutdown().await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod cache;
pub mod core;
pub mod culling;
pub mod events;
pub mod foundation;
pub mod resources;
pub mod services;

mod runtime;

pub use runtime::{RuntimeError, SceneRuntime};

/// Common imports for runtime users
pub mod prelude {
    pub use crate::{
        cache::BoundedCache,
        core::config::{
            CacheConfig, Config, CullingConfig, RegistryConfig, RuntimeConfig,
        },
        culling::{
            CullStats, Renderable, SpatialGrid, Viewport, ViewportCuller,
            ViewportUpdate,
        },
        events::{
            EventError, EventHub, EventScope, ListenerFn, ListenerId,
            ListenerOptions, ListenerTarget, Subscription,
        },
        foundation::math::Rect,
        resources::{RegistryError, ResourceKind, ResourceRegistry},
        services::{ContainerError, Service, ServiceContainer},
        RuntimeError, SceneRuntime,
    };
}
