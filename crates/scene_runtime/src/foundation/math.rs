//! 2D geometry primitives
//!
//! The runtime only reasons about axis-aligned rectangles: object bounds,
//! viewports, and grid query regions. Everything here is plain `f32` math.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle with origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Horizontal extent (non-negative)
    pub width: f32,
    /// Vertical extent (non-negative)
    pub height: f32,
}

impl Rect {
    /// Create a rectangle from origin and extent.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (`x + width`).
    #[must_use]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge (`y + height`).
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Separating-axis overlap test. Touching edges count as intersecting.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        !(self.x > other.right()
            || self.right() < other.x
            || self.y > other.bottom()
            || self.bottom() < other.y)
    }

    /// Grow the rectangle by `margin` on all four sides.
    ///
    /// A negative margin shrinks it; callers are responsible for keeping the
    /// extent non-negative.
    #[must_use]
    pub fn expand(&self, margin: f32) -> Self {
        Self {
            x: self.x - margin,
            y: self.y - margin,
            width: self.width + margin * 2.0,
            height: self.height + margin * 2.0,
        }
    }

    /// Whether the point lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0, 0.0)
    }
}
