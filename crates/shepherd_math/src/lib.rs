//! # shepherd_math - 2D Math Primitives
//!
//! Small value types shared by every simulation crate. The world is a flat
//! square, so everything is expressed with [`Vec2`].

pub mod vector;

pub use vector::*;

/// Common math constants
pub mod consts {
    pub const PI: f32 = core::f32::consts::PI;
    pub const TAU: f32 = PI * 2.0;
    pub const SQRT_2: f32 = core::f32::consts::SQRT_2;
    pub const EPSILON: f32 = 1e-6;
}

pub mod prelude {
    pub use crate::consts::{SQRT_2, TAU};
    pub use crate::vector::Vec2;
}
