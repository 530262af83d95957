//! Composed routes with an arrival cursor

use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Points closer than this at a segment join are treated as one point
pub const JOIN_EPSILON: f32 = 1.0;

/// An ordered list of world points plus a cursor to the current one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Waypoints along the route
    points: Vec<Vec2>,
    /// Current waypoint index
    cursor: usize,
}

impl Route {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<Vec2>) -> Self {
        Self { points, cursor: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Drop every point and reset the cursor
    pub fn clear(&mut self) {
        self.points.clear();
        self.cursor = 0;
    }

    /// Get current waypoint
    pub fn current(&self) -> Option<Vec2> {
        self.points.get(self.cursor).copied()
    }

    /// Get final destination
    pub fn destination(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    /// Append a single point unless it duplicates the last one
    pub fn push(&mut self, point: Vec2) {
        if self
            .points
            .last()
            .is_some_and(|last| last.distance(point) < JOIN_EPSILON)
        {
            return;
        }
        self.points.push(point);
    }

    /// Append a path segment. The segment's first point is dropped when it
    /// coincides with the current last point.
    pub fn append_segment(&mut self, segment: &[Vec2]) {
        let skip = match (self.points.last(), segment.first()) {
            (Some(last), Some(first)) if last.distance(*first) < JOIN_EPSILON => 1,
            _ => 0,
        };
        self.points.extend_from_slice(&segment[skip..]);
    }

    /// Move the cursor past every point within `radius` of `position`,
    /// stopping at the first one farther away. Never moves past the last
    /// point.
    pub fn advance_within(&mut self, position: Vec2, radius: f32) {
        if self.points.is_empty() {
            return;
        }
        let radius_sq = radius * radius;
        for i in self.cursor..self.points.len() {
            if self.points[i].distance_squared(position) < radius_sq {
                self.cursor = i + 1;
            } else {
                break;
            }
        }
        self.cursor = self.cursor.min(self.points.len() - 1);
    }

    /// Length from the current point to the end
    pub fn remaining_length(&self) -> f32 {
        self.points
            .get(self.cursor..)
            .map(|rest| rest.windows(2).map(|w| w[0].distance(w[1])).sum())
            .unwrap_or(0.0)
    }
}
