//! Resource ownership and lifetime tracking
//!
//! Every disposable resource a scene creates (render surfaces, listeners,
//! scheduled frame callbacks, decoded assets, physics handles) is registered
//! here so that teardown can release everything in a safe order even when
//! the creating code forgot to.

mod registry;

pub use registry::{
    DisposeFn, RegistryError, RegistryStats, ResourceKind, ResourceRegistry,
};
