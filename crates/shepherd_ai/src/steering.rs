//! Steering behaviors

use rand::Rng;
use serde::{Deserialize, Serialize};
use shepherd_math::Vec2;

/// Accumulated steering acceleration for one agent and one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SteeringOutput {
    /// Linear acceleration
    pub linear: Vec2,
}

impl SteeringOutput {
    pub fn zero() -> Self {
        Self::default()
    }

    /// Add `force * weight`
    pub fn add(&mut self, force: Vec2, weight: f32) {
        self.linear += force * weight;
    }
}

/// Unit vector from `from` towards `to`, zero when they coincide
#[inline]
pub fn direction(from: Vec2, to: Vec2) -> Vec2 {
    (to - from).normalize_or_zero()
}

/// Reynolds seek with an arrival slowdown: desired speed falls off linearly
/// inside `slow_radius`. The correction is capped at `max_force`.
pub fn seek(
    position: Vec2,
    velocity: Vec2,
    target: Vec2,
    max_speed: f32,
    max_force: f32,
    slow_radius: f32,
) -> Vec2 {
    let offset = target - position;
    let distance = offset.length();
    if distance <= 0.0 {
        return Vec2::ZERO;
    }
    let speed = if distance < slow_radius {
        max_speed * distance / slow_radius
    } else {
        max_speed
    };
    let desired = offset / distance * speed;
    (desired - velocity).clamp_length_max(max_force)
}

/// Push of `magnitude` directly away from `threat`
#[inline]
pub fn flee(position: Vec2, threat: Vec2, magnitude: f32) -> Vec2 {
    direction(threat, position) * magnitude
}

/// Push away from a disc that grows linearly from zero at `reach` to
/// `strength` per `falloff` units of penetration. Zero outside `reach`.
pub fn repel(position: Vec2, center: Vec2, reach: f32, falloff: f32, strength: f32) -> Vec2 {
    let offset = position - center;
    let d = offset.length();
    if d >= reach || d <= 0.0 {
        return Vec2::ZERO;
    }
    offset / d * ((reach - d) / falloff * strength)
}

/// Random acceleration in `[-jitter, jitter]` on each axis
pub fn jitter<R: Rng + ?Sized>(rng: &mut R, jitter: f32) -> Vec2 {
    if jitter <= 0.0 {
        return Vec2::ZERO;
    }
    Vec2::new(
        rng.gen_range(-jitter..=jitter),
        rng.gen_range(-jitter..=jitter),
    )
}

/// Clamp a position into `[0, extent]` on both axes. The velocity component
/// that crossed a wall is reversed and scaled by `restitution`.
pub fn contain(position: &mut Vec2, velocity: &mut Vec2, extent: f32, restitution: f32) {
    if position.x < 0.0 || position.x > extent {
        position.x = position.x.clamp(0.0, extent);
        velocity.x *= -restitution;
    }
    if position.y < 0.0 || position.y > extent {
        position.y = position.y.clamp(0.0, extent);
        velocity.y *= -restitution;
    }
}
