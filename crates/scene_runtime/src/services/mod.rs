//! Dependency wiring and ordered teardown
//!
//! Collaborators are constructed by the [`ServiceContainer`] instead of
//! reaching for process-wide statics: factories pull their dependencies from
//! the container explicitly, singletons get one shared instance per
//! container, and one asynchronous `dispose` call tears every constructed
//! service down concurrently.

mod container;

pub use container::{ContainerError, Service, ServiceContainer};
