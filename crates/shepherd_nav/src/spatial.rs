//! Uniform-cell spatial hash
//!
//! Buckets are keyed by integer `(col, row)` pairs. There are no partial
//! updates: callers `clear()` and re-insert everything when positions move.

use shepherd_math::Vec2;
use std::collections::HashMap;

/// Spatial hash mapping world positions to nearby items
#[derive(Debug, Clone)]
pub struct SpatialHash<T> {
    cell_size: f32,
    buckets: HashMap<(i32, i32), Vec<T>>,
    len: usize,
}

impl<T: Copy> SpatialHash<T> {
    /// Create an empty hash with the given cell size
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            buckets: HashMap::new(),
            len: 0,
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of insertions since the last clear
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cell containing a world position
    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Remove every item, keeping allocated buckets
    pub fn clear(&mut self) {
        for bucket in self.buckets.values_mut() {
            bucket.clear();
        }
        self.len = 0;
    }

    /// Insert into the single cell containing `pos`
    pub fn insert(&mut self, pos: Vec2, item: T) {
        let key = self.cell_of(pos);
        self.buckets.entry(key).or_default().push(item);
        self.len += 1;
    }

    /// Insert into every cell overlapped by the square of half-size `radius`
    pub fn insert_radius(&mut self, pos: Vec2, radius: f32, item: T) {
        let (min_c, min_r) = self.cell_of(pos - Vec2::splat(radius));
        let (max_c, max_r) = self.cell_of(pos + Vec2::splat(radius));
        for c in min_c..=max_c {
            for r in min_r..=max_r {
                self.buckets.entry((c, r)).or_default().push(item);
            }
        }
        self.len += 1;
    }

    /// Items bucketed in the cell containing `pos`
    pub fn query(&self, pos: Vec2) -> &[T] {
        self.buckets
            .get(&self.cell_of(pos))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Items in the 3x3 block of cells around `pos`
    pub fn neighborhood(&self, pos: Vec2) -> impl Iterator<Item = T> + '_ {
        let (col, row) = self.cell_of(pos);
        (-1..=1)
            .flat_map(move |dc| (-1..=1).map(move |dr| (col + dc, row + dr)))
            .filter_map(move |key| self.buckets.get(&key))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Visit items in every cell overlapped by the square of half-size
    /// `radius`. Candidates still need an exact distance check.
    pub fn for_each_nearby(&self, pos: Vec2, radius: f32, mut f: impl FnMut(T)) {
        let (min_c, min_r) = self.cell_of(pos - Vec2::splat(radius));
        let (max_c, max_r) = self.cell_of(pos + Vec2::splat(radius));
        for c in min_c..=max_c {
            for r in min_r..=max_r {
                if let Some(bucket) = self.buckets.get(&(c, r)) {
                    for &item in bucket {
                        f(item);
                    }
                }
            }
        }
    }
}

impl<T: Copy> SpatialHash<T> {
    /// Clear and re-insert every `(position, item)` pair by position only
    pub fn rebuild(&mut self, items: impl IntoIterator<Item = (Vec2, T)>) {
        self.clear();
        for (pos, item) in items {
            self.insert(pos, item);
        }
    }
}
