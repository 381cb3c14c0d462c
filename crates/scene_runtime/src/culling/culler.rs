//! Stateless per-frame culling pass
//!
//! Filters the live object set against the current viewport (expanded by a
//! configurable margin so objects about to enter the frame do not pop in)
//! and depth-sorts the survivors.

use super::Renderable;
use crate::core::config::CullingConfig;
use crate::foundation::math::Rect;
use crate::foundation::time::Stopwatch;
use std::time::Duration;

/// Current view into the scene, in world units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// On-screen width
    pub width: f32,
    /// On-screen height
    pub height: f32,
    /// Zoom factor; the world-space span of the view is `width / scale`
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            scale: 1.0,
        }
    }
}

/// Partial viewport update; unset fields keep their current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewportUpdate {
    /// New left edge
    pub x: Option<f32>,
    /// New top edge
    pub y: Option<f32>,
    /// New width
    pub width: Option<f32>,
    /// New height
    pub height: Option<f32>,
    /// New zoom factor
    pub scale: Option<f32>,
}

/// Statistics from the most recent cull pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct CullStats {
    /// Objects considered
    pub total: usize,
    /// Objects left visible
    pub visible: usize,
    /// Objects excluded (disabled or out of view)
    pub culled: usize,
    /// Wall-clock duration of the pass
    pub duration: Duration,
}

/// Per-frame visibility filter over a set of [`Renderable`]s.
pub struct ViewportCuller {
    viewport: Viewport,
    config: CullingConfig,
    stats: CullStats,
}

impl Default for ViewportCuller {
    fn default() -> Self {
        Self::new(CullingConfig::default())
    }
}

impl ViewportCuller {
    /// Create a culler with an empty viewport.
    #[must_use]
    pub fn new(config: CullingConfig) -> Self {
        Self {
            viewport: Viewport::default(),
            config,
            stats: CullStats::default(),
        }
    }

    /// Merge a partial update into the current viewport.
    ///
    /// A non-positive `scale` would invert or blow up the world-space view
    /// rect; such updates are rejected with a warning and the current scale
    /// is kept.
    pub fn set_viewport(&mut self, update: ViewportUpdate) {
        let vp = &mut self.viewport;
        vp.x = update.x.unwrap_or(vp.x);
        vp.y = update.y.unwrap_or(vp.y);
        vp.width = update.width.unwrap_or(vp.width);
        vp.height = update.height.unwrap_or(vp.height);
        if let Some(scale) = update.scale {
            if scale > 0.0 {
                vp.scale = scale;
            } else {
                log::warn!("Ignoring non-positive viewport scale {scale}");
            }
        }
    }

    /// The current viewport.
    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Statistics from the most recent [`cull`](Self::cull) pass.
    #[must_use]
    pub fn stats(&self) -> CullStats {
        self.stats
    }

    /// Whether `bounds` intersects the margin-expanded viewport.
    #[must_use]
    pub fn is_in_viewport(&self, bounds: &Rect) -> bool {
        let vp = self.viewport;
        let view = Rect::new(vp.x, vp.y, vp.width / vp.scale, vp.height / vp.scale)
            .expand(self.config.cull_margin);
        bounds.intersects(&view)
    }

    /// Filter `objects` to the visible subset and depth-sort it.
    ///
    /// Disabled objects are always excluded. Each enabled object's visibility
    /// flag is written as a side effect. When depth sorting is enabled the
    /// survivors come back stable-sorted ascending by depth.
    pub fn cull<'a, R: Renderable>(&mut self, objects: &'a mut [R]) -> Vec<&'a R> {
        let watch = Stopwatch::start_new();
        let total = objects.len();

        let mut survivors: Vec<usize> = Vec::with_capacity(total);
        for (index, object) in objects.iter_mut().enumerate() {
            if !object.is_enabled() {
                object.set_visible(false);
                continue;
            }
            let visible = !self.config.enable_culling || {
                let bounds = object.bounds();
                self.is_in_viewport(&bounds)
            };
            object.set_visible(visible);
            if visible {
                survivors.push(index);
            }
        }

        if self.config.enable_depth_sort {
            survivors.sort_by(|&a, &b| objects[a].depth().total_cmp(&objects[b].depth()));
        }

        self.stats = CullStats {
            total,
            visible: survivors.len(),
            culled: total - survivors.len(),
            duration: watch.elapsed(),
        };
        log::trace!(
            "Culled {} of {} object(s) in {:.3} ms",
            self.stats.culled,
            self.stats.total,
            watch.elapsed_millis()
        );

        let objects = &*objects;
        survivors.into_iter().map(|index| &objects[index]).collect()
    }
}
