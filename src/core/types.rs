use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};
use std::ops::Mul;

use crate::config::ROTATION_TOLERANCE;
use crate::error::{MultibodyError, Result};

/// Proper orthonormal rotation matrix `R_AB`: columns are B's axes expressed in A.
///
/// Every constructor guarantees `RᵀR = 1` and `det R = +1`, so the inverse is
/// always the transpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rotation(DMat3);

impl Default for Rotation {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Rotation {
    pub const IDENTITY: Self = Self(DMat3::IDENTITY);

    pub fn about_x(angle: f64) -> Self {
        Self(DMat3::from_rotation_x(angle))
    }

    pub fn about_y(angle: f64) -> Self {
        Self(DMat3::from_rotation_y(angle))
    }

    pub fn about_z(angle: f64) -> Self {
        Self(DMat3::from_rotation_z(angle))
    }

    /// Rotation by `angle` about `axis`; the axis need not be unit length.
    /// A zero axis yields the identity.
    pub fn about_axis(axis: DVec3, angle: f64) -> Self {
        match axis.try_normalize() {
            Some(unit) => Self(DMat3::from_axis_angle(unit, angle)),
            None => Self::IDENTITY,
        }
    }

    /// Builds from a quaternion, normalizing it first.
    pub fn from_quat(quat: DQuat) -> Self {
        let norm = quat.length();
        if norm == 0.0 || !norm.is_finite() {
            return Self::IDENTITY;
        }
        Self(DMat3::from_quat(quat / norm))
    }

    /// Accepts `m` only if it is already a proper rotation within tolerance.
    pub fn try_from_mat3(m: DMat3) -> Result<Self> {
        if !m.is_finite() {
            return Err(MultibodyError::invalid_rotation("matrix has non-finite entries"));
        }
        let deviation = m.transpose() * m - DMat3::IDENTITY;
        let max_dev = deviation
            .x_axis
            .abs()
            .max_element()
            .max(deviation.y_axis.abs().max_element())
            .max(deviation.z_axis.abs().max_element());
        if max_dev > ROTATION_TOLERANCE {
            return Err(MultibodyError::invalid_rotation(format!(
                "columns are not orthonormal (max deviation {max_dev:e})"
            )));
        }
        if m.determinant() <= 0.0 {
            return Err(MultibodyError::invalid_rotation("determinant is not +1"));
        }
        Ok(Self(m))
    }

    /// Projects an approximately orthonormal matrix back onto the rotation group.
    pub fn reorthonormalized(m: DMat3) -> Self {
        Self::from_quat(DQuat::from_mat3(&m))
    }

    pub fn as_mat3(&self) -> &DMat3 {
        &self.0
    }

    pub fn to_quat(&self) -> DQuat {
        DQuat::from_mat3(&self.0).normalize()
    }

    /// `~R`: for a rotation the inverse is the transpose.
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    pub fn inverse(&self) -> Self {
        self.transpose()
    }

    /// Column `i` of the matrix, i.e. the i-th axis of the rotated frame.
    pub fn axis(&self, i: usize) -> DVec3 {
        self.0.col(i)
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}

impl Mul for Rotation {
    type Output = Rotation;
    fn mul(self, rhs: Rotation) -> Rotation {
        Rotation(self.0 * rhs.0)
    }
}

impl Mul<DVec3> for Rotation {
    type Output = DVec3;
    fn mul(self, rhs: DVec3) -> DVec3 {
        self.0 * rhs
    }
}

impl Mul<DMat3> for Rotation {
    type Output = DMat3;
    fn mul(self, rhs: DMat3) -> DMat3 {
        self.0 * rhs
    }
}

/// Rigid pose `X_AB` of frame B in frame A: orientation `R_AB` and origin `p_AB`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub rotation: Rotation,
    pub position: DVec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Self = Self {
        rotation: Rotation::IDENTITY,
        position: DVec3::ZERO,
    };

    pub fn new(rotation: Rotation, position: DVec3) -> Self {
        Self { rotation, position }
    }

    pub fn from_translation(position: DVec3) -> Self {
        Self {
            rotation: Rotation::IDENTITY,
            position,
        }
    }

    pub fn from_rotation(rotation: Rotation) -> Self {
        Self {
            rotation,
            position: DVec3::ZERO,
        }
    }

    /// `~X_AB = X_BA`.
    pub fn inverse(&self) -> Transform {
        let r_ba = self.rotation.transpose();
        Transform {
            rotation: r_ba,
            position: -(r_ba * self.position),
        }
    }

    /// `X_AB * X_BC = X_AC`.
    pub fn compose(&self, other: &Transform) -> Transform {
        Transform {
            rotation: self.rotation * other.rotation,
            position: self.position + self.rotation * other.position,
        }
    }

    /// Maps a point measured in B to the same point measured in A.
    pub fn transform_point(&self, p_b: DVec3) -> DVec3 {
        self.position + self.rotation * p_b
    }

    /// Re-expresses a free vector; translation does not apply.
    pub fn transform_vector(&self, v_b: DVec3) -> DVec3 {
        self.rotation * v_b
    }

    /// `~X_AB * p_A` without forming the inverse.
    pub fn inverse_transform_point(&self, p_a: DVec3) -> DVec3 {
        self.rotation.transpose() * (p_a - self.position)
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.rotation.abs_diff_eq(&other.rotation, max_abs_diff)
            && self.position.abs_diff_eq(other.position, max_abs_diff)
    }
}

impl Mul for Transform {
    type Output = Transform;
    fn mul(self, rhs: Transform) -> Transform {
        self.compose(&rhs)
    }
}

impl Mul<DVec3> for Transform {
    type Output = DVec3;
    fn mul(self, rhs: DVec3) -> DVec3 {
        self.transform_point(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> Transform {
        Transform::new(
            Rotation::about_axis(DVec3::new(1.0, 2.0, -0.5), 0.9),
            DVec3::new(0.3, -1.2, 2.5),
        )
    }

    #[test]
    fn transform_times_inverse_is_identity() {
        let x = sample();
        assert!((x * x.inverse()).abs_diff_eq(&Transform::IDENTITY, 1e-12));
        assert!((x.inverse() * x).abs_diff_eq(&Transform::IDENTITY, 1e-12));
    }

    #[test]
    fn composition_is_associative() {
        let a = sample();
        let b = Transform::new(Rotation::about_z(0.4), DVec3::X);
        let c = Transform::new(Rotation::about_x(-1.1), DVec3::new(0.0, 2.0, 1.0));
        assert!(((a * b) * c).abs_diff_eq(&(a * (b * c)), 1e-12));
    }

    #[test]
    fn rotation_inverse_is_transpose() {
        let r = Rotation::about_z(FRAC_PI_2);
        assert!((r * r.transpose()).abs_diff_eq(&Rotation::IDENTITY, 1e-12));
        assert!((r * DVec3::X).abs_diff_eq(DVec3::Y, 1e-12));
    }

    #[test]
    fn non_orthonormal_matrix_is_rejected() {
        let m = DMat3::from_diagonal(DVec3::new(1.0, 2.0, 1.0));
        assert!(Rotation::try_from_mat3(m).is_err());
        let reflection = DMat3::from_diagonal(DVec3::new(1.0, 1.0, -1.0));
        assert!(Rotation::try_from_mat3(reflection).is_err());
    }

    #[test]
    fn reorthonormalization_recovers_a_rotation() {
        let exact = Rotation::about_y(0.3);
        let noisy = *exact.as_mat3() * 1.0000001;
        let fixed = Rotation::reorthonormalized(noisy);
        assert!(Rotation::try_from_mat3(*fixed.as_mat3()).is_ok());
        assert!(fixed.abs_diff_eq(&exact, 1e-6));
    }

    #[test]
    fn inverse_transform_point_matches_inverse() {
        let x = sample();
        let p = DVec3::new(4.0, -1.0, 0.25);
        assert!(x
            .inverse_transform_point(p)
            .abs_diff_eq(x.inverse() * p, 1e-12));
    }
}
