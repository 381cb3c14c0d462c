//! Viewport culling and spatial indexing
//!
//! Reduces a potentially large set of renderable objects to the subset that
//! is visible and depth-ordered, cheaply enough to run every frame. The
//! [`SpatialGrid`] is a coarse filter that turns O(n) region scans into
//! O(objects-per-cell); the final answer always comes from an exact bounds
//! check.

mod culler;
mod grid;

pub use culler::{CullStats, Viewport, ViewportCuller, ViewportUpdate};
pub use grid::SpatialGrid;

use crate::foundation::math::Rect;

/// Contract any object must satisfy to participate in culling.
///
/// The core never owns renderables; it only reads bounds and the enabled
/// flag, and writes the visibility flag.
pub trait Renderable {
    /// Stable identifier, unique within the culled set.
    fn id(&self) -> u64;

    /// Current axis-aligned bounds in world units.
    fn bounds(&self) -> Rect;

    /// Whether the object participates in culling at all. Read-only input.
    fn is_enabled(&self) -> bool;

    /// Visibility flag written by the culler, read by the renderer.
    fn is_visible(&self) -> bool;

    /// Update the visibility flag.
    fn set_visible(&mut self, visible: bool);

    /// Depth value for sort ordering; smaller renders first.
    fn depth(&self) -> f32 {
        0.0
    }
}
