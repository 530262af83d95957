//! Grid A* pathfinding
//!
//! Searches the 8-connected walkability grid. The heuristic is Manhattan
//! distance in cells, which overestimates on diagonals; the occasional
//! non-shortest path is accepted because routes are replanned regularly.

use crate::grid::{GridCoord, WalkabilityGrid};
use shepherd_math::{consts::SQRT_2, Vec2};
use std::collections::VecDeque;

/// Result of a path request
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    /// Ordered waypoints, ending exactly on the requested end point
    Found(Vec<Vec2>),
    /// No path exists (start off-grid or the open set drained). Do not
    /// retry until the world or the objectives change.
    Unreachable,
    /// The expansion cap was hit. Transient; safe to retry later.
    Exhausted,
}

impl PathOutcome {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Whether a later retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    /// Waypoints, or an empty slice if no path was found
    pub fn points(&self) -> &[Vec2] {
        match self {
            Self::Found(points) => points,
            _ => &[],
        }
    }
}

/// Neighbour offsets and step costs, cardinals first
const NEIGHBORS: [(i32, i32, f32); 8] = [
    (0, -1, 1.0),
    (0, 1, 1.0),
    (-1, 0, 1.0),
    (1, 0, 1.0),
    (-1, -1, SQRT_2),
    (1, -1, SQRT_2),
    (-1, 1, SQRT_2),
    (1, 1, SQRT_2),
];

const NO_PARENT: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    index: usize,
    f_score: f32,
}

/// Grid pathfinder. Stateless between calls; identical inputs give
/// identical outputs.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    /// Node expansions allowed per search before giving up
    pub max_expansions: usize,
    /// Largest ring radius searched when substituting an unwalkable goal
    pub goal_search_radius: i32,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self {
            max_expansions: 8000,
            goal_search_radius: 14,
        }
    }
}

impl Pathfinder {
    pub fn new(max_expansions: usize) -> Self {
        Self {
            max_expansions,
            ..Default::default()
        }
    }

    /// Find a path between two world points.
    pub fn find_path(&self, grid: &WalkabilityGrid, start: Vec2, end: Vec2) -> PathOutcome {
        let start_cell = grid.cell_at(start);
        if !grid.in_bounds(start_cell) {
            return PathOutcome::Unreachable;
        }
        let goal_cell = self.resolve_goal(grid, grid.cell_at(end));

        match self.search(grid, start_cell, goal_cell) {
            PathOutcome::Found(mut points) => {
                // Land exactly on the request, not the cell centre
                match points.last_mut() {
                    Some(last) => *last = end,
                    None => points.push(end),
                }
                PathOutcome::Found(points)
            }
            other => other,
        }
    }

    /// Cell-level search: cell centres from the first step after `start`
    /// through `goal`. Exposed for callers that reason in cells.
    pub fn find_cell_path(
        &self,
        grid: &WalkabilityGrid,
        start: GridCoord,
        goal: GridCoord,
    ) -> Option<Vec<GridCoord>> {
        if !grid.in_bounds(start) {
            return None;
        }
        match self.search(grid, start, goal) {
            PathOutcome::Found(points) => {
                Some(points.into_iter().map(|p| grid.cell_at(p)).collect())
            }
            _ => None,
        }
    }

    /// Nearest walkable cell in expanding square rings, or the original
    /// cell if none lies within `goal_search_radius`.
    fn resolve_goal(&self, grid: &WalkabilityGrid, goal: GridCoord) -> GridCoord {
        if grid.is_walkable(goal) {
            return goal;
        }
        for radius in 1..=self.goal_search_radius {
            for dc in -radius..=radius {
                for dr in -radius..=radius {
                    let candidate = goal.offset(dc, dr);
                    if grid.is_walkable(candidate) {
                        return candidate;
                    }
                }
            }
        }
        goal
    }

    fn search(&self, grid: &WalkabilityGrid, start: GridCoord, goal: GridCoord) -> PathOutcome {
        let Some(start_index) = grid.index(start) else {
            return PathOutcome::Unreachable;
        };

        let n = grid.len();
        let mut g_score = vec![f32::INFINITY; n];
        let mut came_from = vec![NO_PARENT; n];
        let mut closed = vec![false; n];
        let mut in_open = vec![false; n];
        // Kept sorted by ascending f; new entries go ahead of equal scores
        let mut open: VecDeque<OpenNode> = VecDeque::new();

        g_score[start_index] = 0.0;
        open.push_back(OpenNode {
            index: start_index,
            f_score: start.manhattan(goal) as f32,
        });
        in_open[start_index] = true;

        let mut expansions = 0usize;
        while let Some(current) = open.pop_front() {
            expansions += 1;
            if expansions > self.max_expansions {
                log::debug!(
                    "Path search exhausted after {} expansions ({:?} -> {:?})",
                    self.max_expansions,
                    start,
                    goal
                );
                return PathOutcome::Exhausted;
            }

            in_open[current.index] = false;
            let current_cell = grid.coord(current.index);
            if current_cell == goal {
                return PathOutcome::Found(reconstruct(grid, &came_from, current.index));
            }
            closed[current.index] = true;

            for &(dc, dr, cost) in &NEIGHBORS {
                let neighbor = current_cell.offset(dc, dr);
                let Some(ni) = grid.index(neighbor) else {
                    continue;
                };
                if !grid.is_walkable(neighbor) || closed[ni] {
                    continue;
                }

                let tentative_g = g_score[current.index] + cost;
                if tentative_g < g_score[ni] {
                    came_from[ni] = current.index as u32;
                    g_score[ni] = tentative_g;

                    if !in_open[ni] {
                        let node = OpenNode {
                            index: ni,
                            f_score: tentative_g + neighbor.manhattan(goal) as f32,
                        };
                        let at = open.partition_point(|n| n.f_score < node.f_score);
                        open.insert(at, node);
                        in_open[ni] = true;
                    }
                }
            }
        }

        PathOutcome::Unreachable
    }
}

/// Walk the parent chain back to the start, emitting cell centres clamped
/// to the world. The start cell itself is not included.
fn reconstruct(grid: &WalkabilityGrid, came_from: &[u32], goal_index: usize) -> Vec<Vec2> {
    let mut path = Vec::new();
    let mut index = goal_index;
    while came_from[index] != NO_PARENT {
        path.push(grid.waypoint(grid.coord(index)));
        index = came_from[index] as usize;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn octile(a: GridCoord, b: GridCoord) -> f32 {
        let dx = (a.col - b.col).abs() as f32;
        let dy = (a.row - b.row).abs() as f32;
        dx.max(dy) - dx.min(dy) + dx.min(dy) * SQRT_2
    }

    fn cell_cost(start: GridCoord, cells: &[GridCoord]) -> f32 {
        let mut prev = start;
        let mut cost = 0.0;
        for &c in cells {
            let diagonal = c.col != prev.col && c.row != prev.row;
            cost += if diagonal { SQRT_2 } else { 1.0 };
            prev = c;
        }
        cost
    }

    #[test]
    fn test_straight_path_ends_on_request() {
        let grid = WalkabilityGrid::open(600.0, 60.0);
        let end = Vec2::new(555.0, 41.0);
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(30.0, 30.0), end);

        let points = outcome.points();
        assert_eq!(points.len(), 9);
        assert_eq!(*points.last().unwrap(), end);
        assert_eq!(points[0], Vec2::new(90.0, 30.0));
    }

    #[test]
    fn test_open_grid_cost_is_octile() {
        let grid = WalkabilityGrid::open(1200.0, 60.0);
        let finder = Pathfinder::default();
        let start = GridCoord::new(2, 3);

        for goal in [
            GridCoord::new(2, 3 + 10),
            GridCoord::new(12, 3),
            GridCoord::new(12, 13),
            GridCoord::new(5, 4),
            GridCoord::new(17, 9),
            GridCoord::new(0, 19),
        ] {
            let cells = finder.find_cell_path(&grid, start, goal).unwrap();
            assert_eq!(*cells.last().unwrap(), goal);
            assert_abs_diff_eq!(cell_cost(start, &cells), octile(start, goal), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_same_cell_returns_end_point() {
        let grid = WalkabilityGrid::open(600.0, 60.0);
        let end = Vec2::new(40.0, 40.0);
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(10.0, 10.0), end);
        assert_eq!(outcome, PathOutcome::Found(vec![end]));
    }

    #[test]
    fn test_start_out_of_bounds() {
        let grid = WalkabilityGrid::open(600.0, 60.0);
        let outcome =
            Pathfinder::default().find_path(&grid, Vec2::new(-10.0, 10.0), Vec2::new(300.0, 300.0));
        assert_eq!(outcome, PathOutcome::Unreachable);
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn test_unwalkable_goal_substituted() {
        let mut grid = WalkabilityGrid::open(600.0, 60.0);
        let blocked = GridCoord::new(8, 8);
        grid.set_walkable(blocked, false);

        let end = grid.center(blocked);
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(30.0, 30.0), end);
        let points = outcome.points();
        assert!(!points.is_empty());
        assert_eq!(*points.last().unwrap(), end);
        // Second to last is a walkable neighbour of the blocked cell
        let before = grid.cell_at(points[points.len() - 2]);
        assert!(grid.is_walkable(before));
    }

    #[test]
    fn test_goal_beyond_world_substituted() {
        let grid = WalkabilityGrid::open(600.0, 60.0);
        let end = Vec2::new(650.0, 300.0);
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(30.0, 300.0), end);
        assert!(outcome.is_found());
        assert_eq!(*outcome.points().last().unwrap(), end);
    }

    #[test]
    fn test_walled_goal_unreachable() {
        let mut grid = WalkabilityGrid::open(600.0, 60.0);
        // Ring of blocked cells around (7,7)
        for dc in -1..=1 {
            for dr in -1..=1 {
                if dc != 0 || dr != 0 {
                    grid.set_walkable(GridCoord::new(7 + dc, 7 + dr), false);
                }
            }
        }
        let end = grid.center(GridCoord::new(7, 7));
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(30.0, 30.0), end);
        assert_eq!(outcome, PathOutcome::Unreachable);
    }

    #[test]
    fn test_expansion_cap_reports_exhausted() {
        let grid = WalkabilityGrid::open(6000.0, 60.0);
        let outcome = Pathfinder::new(10).find_path(
            &grid,
            Vec2::new(30.0, 30.0),
            Vec2::new(5970.0, 30.0),
        );
        assert_eq!(outcome, PathOutcome::Exhausted);
        assert!(outcome.is_retryable());
    }

    #[test]
    fn test_detours_around_wall() {
        let mut grid = WalkabilityGrid::open(600.0, 60.0);
        for row in 0..9 {
            grid.set_walkable(GridCoord::new(5, row), false);
        }
        let outcome = Pathfinder::default().find_path(
            &grid,
            Vec2::new(30.0, 30.0),
            Vec2::new(570.0, 30.0),
        );
        let points = outcome.points();
        assert!(!points.is_empty());
        assert!(points.iter().any(|p| grid.cell_at(*p).row == 9));
        for p in &points[..points.len() - 1] {
            assert!(grid.is_walkable(grid.cell_at(*p)));
        }
    }

    #[test]
    fn test_edge_path_stays_in_world() {
        // 5000 is not a whole number of 60-unit cells; column 83 overhangs
        let grid = WalkabilityGrid::open(5000.0, 60.0);
        let end = Vec2::new(4995.0, 4900.0);
        let outcome = Pathfinder::default().find_path(&grid, Vec2::new(4995.0, 100.0), end);

        let points = outcome.points();
        assert!(points.len() > 10);
        assert_eq!(*points.last().unwrap(), end);
        for p in points {
            assert!(p.x <= 5000.0 && p.y <= 5000.0, "{:?} is outside the world", p);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut grid = WalkabilityGrid::open(1200.0, 60.0);
        for row in 2..18 {
            grid.set_walkable(GridCoord::new(9, row), false);
        }
        let finder = Pathfinder::default();
        let a = finder.find_path(&grid, Vec2::new(40.0, 600.0), Vec2::new(1100.0, 610.0));
        let b = finder.find_path(&grid, Vec2::new(40.0, 600.0), Vec2::new(1100.0, 610.0));
        assert_eq!(a, b);
        assert!(a.is_found());
    }
}
