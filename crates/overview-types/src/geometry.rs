//! Coordinate values used by the schema.
//!
//! Two frames exist and are never mixed:
//!
//! - [`Vector3`] -- full world coordinates in game units. Only grenade
//!   projectiles and grenade detonation records use it, because the
//!   renderer draws their height for arcing visuals.
//! - [`Point2`] -- top-down projected overview coordinates. Players, the
//!   bomb, shot markers and fire areas use it.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in the top-down overview frame.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point2 {
    /// Horizontal overview coordinate.
    pub x: f64,
    /// Vertical overview coordinate (grows downwards).
    pub y: f64,
}

impl Point2 {
    /// Create a point from its components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// A point in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vector3 {
    /// World X.
    pub x: f64,
    /// World Y.
    pub y: f64,
    /// World Z (height).
    pub z: f64,
}

impl Vector3 {
    /// Create a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Whether all components are finite.
    pub const fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finiteness() {
        assert!(Point2::new(1.0, -2.5).is_finite());
        assert!(!Point2::new(f64::NAN, 0.0).is_finite());
        assert!(!Vector3::new(0.0, 0.0, f64::INFINITY).is_finite());
    }
}
