//! Event dispatch with automatic cleanup
//!
//! Key principles:
//! - Typed publish/subscribe on string-named topics
//! - Snapshot dispatch (subscribing or unsubscribing mid-emit is safe)
//! - Listener-style external sources adapt through [`ListenerTarget`] and
//!   register their own teardown with the [`ResourceRegistry`]
//! - [`EventScope`] releases a whole group of subscriptions with one call

mod hub;
mod scope;
mod target;

pub use hub::{scoped_topic, EventHub, Subscription};
pub use scope::EventScope;
pub use target::{ListenerFn, ListenerId, ListenerOptions, ListenerTarget};

use crate::resources::RegistryError;
use thiserror::Error;

/// Event system errors
#[derive(Debug, Error)]
pub enum EventError {
    /// A disposed [`EventScope`] was used; this is a lifecycle bug in the
    /// caller and is surfaced immediately instead of silently ignored
    #[error("event scope already disposed")]
    ScopeDisposed,

    /// Listener teardown could not be tracked by the registry
    #[error(transparent)]
    Registry(#[from] RegistryError),
}
