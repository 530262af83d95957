//! Walkability grid and the navigation bake

use crate::obstacle::Obstacle;
use crate::spatial::SpatialHash;
use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Integer cell coordinate; may lie outside the grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub col: i32,
    pub row: i32,
}

impl GridCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    #[inline]
    pub fn offset(self, dc: i32, dr: i32) -> Self {
        Self::new(self.col + dc, self.row + dr)
    }

    /// Manhattan distance in cells
    #[inline]
    pub fn manhattan(self, other: Self) -> i32 {
        (self.col - other.col).abs() + (self.row - other.row).abs()
    }
}

/// Boolean raster over the world marking cells an agent may occupy.
///
/// Immutable once baked; a changed obstacle set means a fresh bake.
#[derive(Debug, Clone)]
pub struct WalkabilityGrid {
    cols: usize,
    rows: usize,
    cell_size: f32,
    extent: f32,
    cells: Vec<bool>,
}

impl WalkabilityGrid {
    /// Fully walkable grid covering a square world of side `extent`
    pub fn open(extent: f32, cell_size: f32) -> Self {
        let cols = (extent / cell_size).ceil().max(1.0) as usize;
        Self {
            cols,
            rows: cols,
            cell_size,
            extent,
            cells: vec![true; cols * cols],
        }
    }

    /// Rasterize obstacles: a cell is walkable iff its centre is farther than
    /// `radius + cell_size / 2 + margin` from every obstacle bucketed at that
    /// centre in `obstacle_hash`.
    pub fn bake(
        obstacles: &[Obstacle],
        obstacle_hash: &SpatialHash<usize>,
        extent: f32,
        cell_size: f32,
        margin: f32,
    ) -> Self {
        let mut grid = Self::open(extent, cell_size);
        let clearance = cell_size / 2.0 + margin;

        for row in 0..grid.rows {
            for col in 0..grid.cols {
                let center = grid.center(GridCoord::new(col as i32, row as i32));
                let blocked = obstacle_hash
                    .query(center)
                    .iter()
                    .any(|&i| obstacles[i].blocks(center, clearance));
                grid.cells[row * grid.cols + col] = !blocked;
            }
        }

        log::debug!(
            "Baked {}x{} nav grid: {} of {} cells walkable ({} obstacles)",
            grid.cols,
            grid.rows,
            grid.walkable_count(),
            grid.cells.len(),
            obstacles.len()
        );
        grid
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Total number of cells
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell containing a world position (floored, so negatives fall outside)
    #[inline]
    pub fn cell_at(&self, pos: Vec2) -> GridCoord {
        GridCoord::new(
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    #[inline]
    pub fn in_bounds(&self, c: GridCoord) -> bool {
        c.col >= 0 && c.row >= 0 && (c.col as usize) < self.cols && (c.row as usize) < self.rows
    }

    /// Flat index for an in-bounds coordinate
    #[inline]
    pub fn index(&self, c: GridCoord) -> Option<usize> {
        self.in_bounds(c)
            .then(|| c.row as usize * self.cols + c.col as usize)
    }

    #[inline]
    pub fn coord(&self, index: usize) -> GridCoord {
        GridCoord::new((index % self.cols) as i32, (index / self.cols) as i32)
    }

    /// Out-of-bounds cells are never walkable
    #[inline]
    pub fn is_walkable(&self, c: GridCoord) -> bool {
        self.index(c).map(|i| self.cells[i]).unwrap_or(false)
    }

    /// Override a single cell. Ignored out of bounds.
    pub fn set_walkable(&mut self, c: GridCoord, walkable: bool) {
        if let Some(i) = self.index(c) {
            self.cells[i] = walkable;
        }
    }

    /// World-space centre of a cell
    #[inline]
    pub fn center(&self, c: GridCoord) -> Vec2 {
        Vec2::new(
            c.col as f32 * self.cell_size + self.cell_size / 2.0,
            c.row as f32 * self.cell_size + self.cell_size / 2.0,
        )
    }

    /// Cell centre as a route point. The last row and column overhang the
    /// world when the extent is not a whole number of cells, so the point is
    /// pulled back inside.
    #[inline]
    pub fn waypoint(&self, c: GridCoord) -> Vec2 {
        self.center(c).clamp_to_square(self.extent)
    }

    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|&&w| w).count()
    }
}
