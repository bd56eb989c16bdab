//! Global configuration constants for the mobilized-body engine.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Default gravity vector applied to every body of a tree (Y-up).
pub const DEFAULT_GRAVITY: [f64; 3] = [0.0, -9.81, 0.0];

/// Maximum deviation of `RᵀR` from identity accepted for a rotation matrix.
pub const ROTATION_TOLERANCE: f64 = 1e-9;

/// Tolerance used when validating symmetry and positive semi-definiteness of inertias.
pub const INERTIA_TOLERANCE: f64 = 1e-9;

/// Smallest pivot accepted when inverting a mobilizer's articulated inertia `D = HᵀPH`.
pub const PIVOT_TOLERANCE: f64 = 1e-12;

/// Quaternions shorter than this are treated as the identity rotation.
pub const QUATERNION_MIN_NORM: f64 = 1e-12;

/// Tree-wide settings. Changing them is a topology change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Uniform gravitational acceleration, expressed in Ground.
    pub gravity: DVec3,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            gravity: DVec3::from_array(DEFAULT_GRAVITY),
        }
    }
}

impl TreeConfig {
    /// A configuration with no gravity, handy for purely kinematic trees.
    pub fn zero_gravity() -> Self {
        Self {
            gravity: DVec3::ZERO,
        }
    }

    pub fn with_gravity(mut self, gravity: DVec3) -> Self {
        self.gravity = gravity;
        self
    }
}
