//! Uniform-grid spatial index
//!
//! Partitions space into fixed-size square cells and buckets each object
//! into every cell its bounds overlap. Region queries union the candidate
//! buckets, de-duplicate, and finish with one exact bounds-intersection
//! check per candidate — the grid is a coarse filter, never the final
//! answer. All state is rebuildable from the object set, so staleness from
//! a missed update can always be repaired with [`rebuild`](SpatialGrid::rebuild).

use super::Renderable;
use crate::foundation::math::Rect;
use std::collections::{HashMap, HashSet};

/// Uniform grid over object bounds, keyed by [`Renderable::id`].
pub struct SpatialGrid {
    cell_size: f32,
    /// Cell coordinate -> ids of objects whose bounds overlap the cell
    cells: HashMap<(i32, i32), Vec<u64>>,
    /// Last-indexed bounds per object, consulted for removal and exact checks
    bounds: HashMap<u64, Rect>,
}

impl SpatialGrid {
    /// Create an empty grid with square cells of `cell_size` world units.
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            bounds: HashMap::new(),
        }
    }

    /// Build a grid over every object in `objects`.
    #[must_use]
    pub fn from_objects<R: Renderable>(objects: &[R], cell_size: f32) -> Self {
        let mut grid = Self::new(cell_size);
        for object in objects {
            grid.insert(object.id(), object.bounds());
        }
        grid
    }

    /// Integer cell range covered by `rect`, inclusive on both ends.
    fn cell_range(&self, rect: &Rect) -> (i32, i32, i32, i32) {
        let min_cx = (rect.x / self.cell_size).floor() as i32;
        let max_cx = (rect.right() / self.cell_size).floor() as i32;
        let min_cy = (rect.y / self.cell_size).floor() as i32;
        let max_cy = (rect.bottom() / self.cell_size).floor() as i32;
        (min_cx, max_cx, min_cy, max_cy)
    }

    /// Index `id` under every cell its bounds overlap.
    ///
    /// Re-inserting an already-indexed id refreshes its bounds.
    pub fn insert(&mut self, id: u64, bounds: Rect) {
        if self.bounds.contains_key(&id) {
            self.remove(id);
        }
        let (min_cx, max_cx, min_cy, max_cy) = self.cell_range(&bounds);
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                self.cells.entry((cx, cy)).or_default().push(id);
            }
        }
        self.bounds.insert(id, bounds);
    }

    /// Remove `id` from every cell derived from its last-indexed bounds.
    ///
    /// Empty cell buckets are deleted to bound memory.
    pub fn remove(&mut self, id: u64) -> bool {
        let Some(old_bounds) = self.bounds.remove(&id) else {
            return false;
        };
        let (min_cx, max_cx, min_cy, max_cy) = self.cell_range(&old_bounds);
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(bucket) = self.cells.get_mut(&(cx, cy)) {
                    bucket.retain(|other| *other != id);
                    if bucket.is_empty() {
                        self.cells.remove(&(cx, cy));
                    }
                }
            }
        }
        true
    }

    /// Move `id` to `new_bounds`: removed from the cells of its last-indexed
    /// bounds and re-inserted under the new ones.
    pub fn update(&mut self, id: u64, new_bounds: Rect) {
        self.remove(id);
        self.insert(id, new_bounds);
    }

    /// Ids of all indexed objects whose bounds intersect `region`.
    ///
    /// Candidates come from the region's cells, are de-duplicated, and each
    /// passes one exact intersection test before being returned. Order is
    /// unspecified.
    #[must_use]
    pub fn query(&self, region: &Rect) -> Vec<u64> {
        let (min_cx, max_cx, min_cy, max_cy) = self.cell_range(region);
        let mut candidates: HashSet<u64> = HashSet::new();
        for cx in min_cx..=max_cx {
            for cy in min_cy..=max_cy {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    candidates.extend(bucket.iter().copied());
                }
            }
        }
        candidates
            .into_iter()
            .filter(|id| {
                self.bounds
                    .get(id)
                    .is_some_and(|bounds| bounds.intersects(region))
            })
            .collect()
    }

    /// Discard and recompute the whole grid from `objects`. Required after
    /// bulk object-set replacement.
    pub fn rebuild<R: Renderable>(&mut self, objects: &[R]) {
        self.cells.clear();
        self.bounds.clear();
        for object in objects {
            self.insert(object.id(), object.bounds());
        }
    }

    /// Number of indexed objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    /// Whether no objects are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Number of non-empty cell buckets.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
