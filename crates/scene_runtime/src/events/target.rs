//! Adapter contract for listener-style event sources
//!
//! Some collaborators are not bus-shaped: they expose add/remove-listener
//! operations (platform windows, input backends). This trait abstracts such a
//! source so the hub can attach handlers to it and the registry can detach
//! them during teardown, without the core knowing the backend.

/// Token identifying one attached listener for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Boxed listener callback for an external event source.
pub type ListenerFn<E> = Box<dyn FnMut(&E) + Send>;

/// Platform-style listener options.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListenerOptions {
    /// Deliver during the capture phase
    pub capture: bool,
    /// Handler promises not to cancel the event
    pub passive: bool,
    /// Detach automatically after the first delivery
    pub once: bool,
}

/// External event source exposing add/remove-listener operations.
pub trait ListenerTarget {
    /// Event payload delivered to attached listeners.
    type Event;

    /// Attach `handler` for `event` under `id`.
    fn add_listener(
        &self,
        event: &str,
        id: ListenerId,
        handler: ListenerFn<Self::Event>,
        options: ListenerOptions,
    );

    /// Detach the listener previously attached under `id`.
    fn remove_listener(&self, event: &str, id: ListenerId);
}
