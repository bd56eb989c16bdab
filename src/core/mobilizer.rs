//! Mobilizers: the parameterized joints between a parent's F frame and a
//! child's M frame.
//!
//! Every mobilizer reports `X_FM(q)` and the hinge matrix `H_FM(q)`, whose
//! columns map generalized speeds to the spatial velocity of M in F, taken
//! about M's origin and expressed in F. Built-in kinds are a closed enum;
//! [`CustomMobilizer`] is the open extension point.

use glam::{DQuat, DVec3};
use std::fmt;
use std::sync::Arc;

use super::types::{Rotation, Transform};
use crate::error::{MultibodyError, Result};
use crate::utils::math::{
    quat_derivative, quat_from_wxyz, quat_second_derivative, quat_to_wxyz, quat_write_raw,
};
use crate::utils::spatial::SpatialVec;

/// Capability interface for user-supplied mobilizers.
///
/// Only the kinematic map and hinge matrix are mandatory. The optional
/// capabilities default to the obvious answer when `nq == nu` and otherwise
/// report [`MultibodyError::NotImplemented`].
pub trait CustomMobilizer: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;
    fn num_q(&self) -> usize;
    fn num_u(&self) -> usize;

    fn default_q(&self) -> Vec<f64> {
        vec![0.0; self.num_q()]
    }

    fn calc_x_fm(&self, q: &[f64]) -> Transform;

    /// One column per generalized speed.
    fn calc_h_fm(&self, q: &[f64]) -> Vec<SpatialVec>;

    fn calc_h_fm_dot(&self, _q: &[f64], u: &[f64]) -> Result<Vec<SpatialVec>> {
        if u.iter().all(|&x| x == 0.0) {
            Ok(vec![SpatialVec::ZERO; self.num_u()])
        } else {
            Err(MultibodyError::not_implemented(format!(
                "{}: HDot for nonzero speeds",
                self.name()
            )))
        }
    }

    fn calc_qdot(&self, _q: &[f64], u: &[f64], qdot: &mut [f64]) -> Result<()> {
        if self.num_q() == self.num_u() {
            qdot.copy_from_slice(u);
            Ok(())
        } else {
            Err(MultibodyError::not_implemented(format!("{}: qdot with nq != nu", self.name())))
        }
    }

    fn calc_qdotdot(
        &self,
        _q: &[f64],
        _u: &[f64],
        udot: &[f64],
        qdotdot: &mut [f64],
    ) -> Result<()> {
        if self.num_q() == self.num_u() {
            qdotdot.copy_from_slice(udot);
            Ok(())
        } else {
            Err(MultibodyError::not_implemented(format!("{}: qdotdot with nq != nu", self.name())))
        }
    }

    fn multiply_by_n_transpose(&self, _q: &[f64], f_q: &[f64], f_u: &mut [f64]) -> Result<()> {
        if self.num_q() == self.num_u() {
            f_u.copy_from_slice(f_q);
            Ok(())
        } else {
            Err(MultibodyError::not_implemented(format!("{}: N^T with nq != nu", self.name())))
        }
    }

    fn set_q_to_fit_rotation(&self, _r_fm: &Rotation, _q: &mut [f64]) -> Result<()> {
        Err(MultibodyError::not_implemented(format!("{}: fit q to rotation", self.name())))
    }

    fn set_q_to_fit_translation(&self, _p_fm: DVec3, _q: &mut [f64]) -> Result<()> {
        Err(MultibodyError::not_implemented(format!("{}: fit q to translation", self.name())))
    }

    fn set_u_to_fit_angular_velocity(
        &self,
        _q: &[f64],
        _w_fm: DVec3,
        _u: &mut [f64],
    ) -> Result<()> {
        Err(MultibodyError::not_implemented(format!("{}: fit u to angular velocity", self.name())))
    }

    fn set_u_to_fit_linear_velocity(&self, _q: &[f64], _v_fm: DVec3, _u: &mut [f64]) -> Result<()> {
        Err(MultibodyError::not_implemented(format!("{}: fit u to linear velocity", self.name())))
    }
}

/// Kind of mobilizer connecting a body to its parent.
#[derive(Debug, Clone)]
pub enum MobilizerType {
    /// Only valid for body 0.
    Ground,
    /// 0 dof rigid attachment.
    Weld,
    /// 1 dof rotation about the shared z axis of F and M.
    Pin,
    /// 1 dof translation along the shared x axis.
    Slider,
    /// 2 dof: rotation about F's x, then about the new y.
    Universal,
    /// 2 dof: rotation about and translation along the shared z axis.
    Cylinder,
    /// 3 dof: rotation about z, translation in F's xy plane.
    Planar,
    /// 3 dof Cartesian translation.
    Translation,
    /// 3 dof rotation, quaternion coordinates `[w, x, y, z]` (nq = 4, nu = 3).
    /// Speeds are the angular velocity of M in F, expressed in F.
    Ball,
    /// 6 dof: Ball coordinates followed by the translation of M's origin in F.
    Free,
    Custom(Arc<dyn CustomMobilizer>),
}

impl MobilizerType {
    pub fn custom(m: impl CustomMobilizer + 'static) -> Self {
        MobilizerType::Custom(Arc::new(m))
    }

    pub fn name(&self) -> &str {
        match self {
            MobilizerType::Ground => "Ground",
            MobilizerType::Weld => "Weld",
            MobilizerType::Pin => "Pin",
            MobilizerType::Slider => "Slider",
            MobilizerType::Universal => "Universal",
            MobilizerType::Cylinder => "Cylinder",
            MobilizerType::Planar => "Planar",
            MobilizerType::Translation => "Translation",
            MobilizerType::Ball => "Ball",
            MobilizerType::Free => "Free",
            MobilizerType::Custom(c) => c.name(),
        }
    }

    pub fn num_q(&self) -> usize {
        match self {
            MobilizerType::Ground | MobilizerType::Weld => 0,
            MobilizerType::Pin | MobilizerType::Slider => 1,
            MobilizerType::Universal | MobilizerType::Cylinder => 2,
            MobilizerType::Planar | MobilizerType::Translation => 3,
            MobilizerType::Ball => 4,
            MobilizerType::Free => 7,
            MobilizerType::Custom(c) => c.num_q(),
        }
    }

    pub fn num_u(&self) -> usize {
        match self {
            MobilizerType::Ground | MobilizerType::Weld => 0,
            MobilizerType::Pin | MobilizerType::Slider => 1,
            MobilizerType::Universal | MobilizerType::Cylinder => 2,
            MobilizerType::Planar | MobilizerType::Translation | MobilizerType::Ball => 3,
            MobilizerType::Free => 6,
            MobilizerType::Custom(c) => c.num_u(),
        }
    }

    /// True when q contains a quaternion (nq differs from nu).
    pub fn uses_quaternion(&self) -> bool {
        matches!(self, MobilizerType::Ball | MobilizerType::Free)
    }

    pub fn default_q(&self) -> Vec<f64> {
        match self {
            MobilizerType::Ball => vec![1.0, 0.0, 0.0, 0.0],
            MobilizerType::Free => vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
            MobilizerType::Custom(c) => c.default_q(),
            other => vec![0.0; other.num_q()],
        }
    }

    /// Pose of M in F for coordinates `q`.
    pub fn calc_x_fm(&self, q: &[f64]) -> Transform {
        match self {
            MobilizerType::Ground | MobilizerType::Weld => Transform::IDENTITY,
            MobilizerType::Pin => Transform::from_rotation(Rotation::about_z(q[0])),
            MobilizerType::Slider => Transform::from_translation(DVec3::new(q[0], 0.0, 0.0)),
            MobilizerType::Universal => {
                Transform::from_rotation(Rotation::about_x(q[0]) * Rotation::about_y(q[1]))
            }
            MobilizerType::Cylinder => {
                Transform::new(Rotation::about_z(q[0]), DVec3::new(0.0, 0.0, q[1]))
            }
            MobilizerType::Planar => {
                Transform::new(Rotation::about_z(q[0]), DVec3::new(q[1], q[2], 0.0))
            }
            MobilizerType::Translation => Transform::from_translation(DVec3::new(q[0], q[1], q[2])),
            MobilizerType::Ball => Transform::from_rotation(Rotation::from_quat(quat_from_wxyz(q))),
            MobilizerType::Free => Transform::new(
                Rotation::from_quat(quat_from_wxyz(&q[..4])),
                DVec3::new(q[4], q[5], q[6]),
            ),
            MobilizerType::Custom(c) => c.calc_x_fm(q),
        }
    }

    /// Hinge matrix columns, about M's origin, expressed in F.
    pub fn calc_h_fm(&self, q: &[f64]) -> Vec<SpatialVec> {
        let ang = |v: DVec3| SpatialVec::new(v, DVec3::ZERO);
        let lin = |v: DVec3| SpatialVec::new(DVec3::ZERO, v);
        match self {
            MobilizerType::Ground | MobilizerType::Weld => Vec::new(),
            MobilizerType::Pin => vec![ang(DVec3::Z)],
            MobilizerType::Slider => vec![lin(DVec3::X)],
            MobilizerType::Universal => {
                vec![ang(DVec3::X), ang(Rotation::about_x(q[0]) * DVec3::Y)]
            }
            MobilizerType::Cylinder => vec![ang(DVec3::Z), lin(DVec3::Z)],
            MobilizerType::Planar => vec![ang(DVec3::Z), lin(DVec3::X), lin(DVec3::Y)],
            MobilizerType::Translation => vec![lin(DVec3::X), lin(DVec3::Y), lin(DVec3::Z)],
            MobilizerType::Ball => vec![ang(DVec3::X), ang(DVec3::Y), ang(DVec3::Z)],
            MobilizerType::Free => vec![
                ang(DVec3::X),
                ang(DVec3::Y),
                ang(DVec3::Z),
                lin(DVec3::X),
                lin(DVec3::Y),
                lin(DVec3::Z),
            ],
            MobilizerType::Custom(c) => c.calc_h_fm(q),
        }
    }

    /// Time derivative of the hinge matrix columns.
    pub fn calc_h_fm_dot(&self, q: &[f64], u: &[f64]) -> Result<Vec<SpatialVec>> {
        match self {
            MobilizerType::Universal => {
                let axis1 = Rotation::about_x(q[0]) * DVec3::Y;
                let dot1 = (DVec3::X * u[0]).cross(axis1);
                Ok(vec![SpatialVec::ZERO, SpatialVec::new(dot1, DVec3::ZERO)])
            }
            MobilizerType::Custom(c) => c.calc_h_fm_dot(q, u),
            other => Ok(vec![SpatialVec::ZERO; other.num_u()]),
        }
    }

    /// `qdot = N(q) u`.
    pub fn calc_qdot(&self, q: &[f64], u: &[f64], qdot: &mut [f64]) -> Result<()> {
        match self {
            MobilizerType::Ball => {
                let w = DVec3::new(u[0], u[1], u[2]);
                quat_write_raw(quat_derivative(quat_from_wxyz(q), w), qdot);
                Ok(())
            }
            MobilizerType::Free => {
                let w = DVec3::new(u[0], u[1], u[2]);
                quat_write_raw(quat_derivative(quat_from_wxyz(&q[..4]), w), &mut qdot[..4]);
                qdot[4..7].copy_from_slice(&u[3..6]);
                Ok(())
            }
            MobilizerType::Custom(c) => c.calc_qdot(q, u, qdot),
            _ => {
                qdot.copy_from_slice(u);
                Ok(())
            }
        }
    }

    /// `qdotdot = N udot + Ndot u`.
    pub fn calc_qdotdot(
        &self,
        q: &[f64],
        u: &[f64],
        udot: &[f64],
        qdotdot: &mut [f64],
    ) -> Result<()> {
        match self {
            MobilizerType::Ball => {
                let w = DVec3::new(u[0], u[1], u[2]);
                let b = DVec3::new(udot[0], udot[1], udot[2]);
                quat_write_raw(quat_second_derivative(quat_from_wxyz(q), w, b), qdotdot);
                Ok(())
            }
            MobilizerType::Free => {
                let w = DVec3::new(u[0], u[1], u[2]);
                let b = DVec3::new(udot[0], udot[1], udot[2]);
                quat_write_raw(
                    quat_second_derivative(quat_from_wxyz(&q[..4]), w, b),
                    &mut qdotdot[..4],
                );
                qdotdot[4..7].copy_from_slice(&udot[3..6]);
                Ok(())
            }
            MobilizerType::Custom(c) => c.calc_qdotdot(q, u, udot, qdotdot),
            _ => {
                qdotdot.copy_from_slice(udot);
                Ok(())
            }
        }
    }

    /// Maps a q-space generalized force to u-space: `f_u = Nᵀ f_q`.
    pub fn multiply_by_n_transpose(&self, q: &[f64], f_q: &[f64], f_u: &mut [f64]) -> Result<()> {
        match self {
            MobilizerType::Ball => {
                quat_n_transpose(quat_from_wxyz(q), &f_q[..4], &mut f_u[..3]);
                Ok(())
            }
            MobilizerType::Free => {
                quat_n_transpose(quat_from_wxyz(&q[..4]), &f_q[..4], &mut f_u[..3]);
                f_u[3..6].copy_from_slice(&f_q[4..7]);
                Ok(())
            }
            MobilizerType::Custom(c) => c.multiply_by_n_transpose(q, f_q, f_u),
            _ => {
                f_u.copy_from_slice(f_q);
                Ok(())
            }
        }
    }

    /// Best-effort q for the requested orientation of M in F. Coordinates
    /// that do not affect orientation are left unchanged.
    pub fn set_q_to_fit_rotation(&self, r_fm: &Rotation, q: &mut [f64]) -> Result<()> {
        let m = r_fm.as_mat3();
        match self {
            MobilizerType::Ground
            | MobilizerType::Weld
            | MobilizerType::Slider
            | MobilizerType::Translation => {}
            MobilizerType::Pin | MobilizerType::Cylinder | MobilizerType::Planar => {
                q[0] = m.x_axis.y.atan2(m.x_axis.x);
            }
            MobilizerType::Universal => {
                q[0] = m.y_axis.z.atan2(m.y_axis.y);
                q[1] = m.z_axis.x.atan2(m.x_axis.x);
            }
            MobilizerType::Ball | MobilizerType::Free => {
                quat_to_wxyz(r_fm.to_quat(), &mut q[..4]);
            }
            MobilizerType::Custom(c) => c.set_q_to_fit_rotation(r_fm, q)?,
        }
        Ok(())
    }

    /// Best-effort q for the requested position of M's origin in F.
    pub fn set_q_to_fit_translation(&self, p_fm: DVec3, q: &mut [f64]) -> Result<()> {
        match self {
            MobilizerType::Ground
            | MobilizerType::Weld
            | MobilizerType::Pin
            | MobilizerType::Universal
            | MobilizerType::Ball => {}
            MobilizerType::Slider => q[0] = p_fm.x,
            MobilizerType::Cylinder => q[1] = p_fm.z,
            MobilizerType::Planar => {
                q[1] = p_fm.x;
                q[2] = p_fm.y;
            }
            MobilizerType::Translation => {
                q[0] = p_fm.x;
                q[1] = p_fm.y;
                q[2] = p_fm.z;
            }
            MobilizerType::Free => {
                q[4] = p_fm.x;
                q[5] = p_fm.y;
                q[6] = p_fm.z;
            }
            MobilizerType::Custom(c) => c.set_q_to_fit_translation(p_fm, q)?,
        }
        Ok(())
    }

    pub fn set_q_to_fit_transform(&self, x_fm: &Transform, q: &mut [f64]) -> Result<()> {
        self.set_q_to_fit_rotation(&x_fm.rotation, q)?;
        self.set_q_to_fit_translation(x_fm.position, q)
    }

    /// Best-effort u for the requested angular velocity of M in F (expressed in F).
    pub fn set_u_to_fit_angular_velocity(
        &self,
        q: &[f64],
        w_fm: DVec3,
        u: &mut [f64],
    ) -> Result<()> {
        match self {
            MobilizerType::Ground
            | MobilizerType::Weld
            | MobilizerType::Slider
            | MobilizerType::Translation => {}
            MobilizerType::Pin | MobilizerType::Cylinder | MobilizerType::Planar => u[0] = w_fm.z,
            MobilizerType::Universal => {
                u[0] = w_fm.x;
                u[1] = w_fm.dot(Rotation::about_x(q[0]) * DVec3::Y);
            }
            MobilizerType::Ball | MobilizerType::Free => {
                u[0] = w_fm.x;
                u[1] = w_fm.y;
                u[2] = w_fm.z;
            }
            MobilizerType::Custom(c) => c.set_u_to_fit_angular_velocity(q, w_fm, u)?,
        }
        Ok(())
    }

    /// Best-effort u for the requested velocity of M's origin in F.
    pub fn set_u_to_fit_linear_velocity(
        &self,
        q: &[f64],
        v_fm: DVec3,
        u: &mut [f64],
    ) -> Result<()> {
        match self {
            MobilizerType::Ground
            | MobilizerType::Weld
            | MobilizerType::Pin
            | MobilizerType::Universal
            | MobilizerType::Ball => {}
            MobilizerType::Slider => u[0] = v_fm.x,
            MobilizerType::Cylinder => u[1] = v_fm.z,
            MobilizerType::Planar => {
                u[1] = v_fm.x;
                u[2] = v_fm.y;
            }
            MobilizerType::Translation => {
                u[0] = v_fm.x;
                u[1] = v_fm.y;
                u[2] = v_fm.z;
            }
            MobilizerType::Free => {
                u[3] = v_fm.x;
                u[4] = v_fm.y;
                u[5] = v_fm.z;
            }
            MobilizerType::Custom(c) => c.set_u_to_fit_linear_velocity(q, v_fm, u)?,
        }
        Ok(())
    }

    pub fn set_u_to_fit_velocity(&self, q: &[f64], v_fm: &SpatialVec, u: &mut [f64]) -> Result<()> {
        self.set_u_to_fit_angular_velocity(q, v_fm.ang, u)?;
        self.set_u_to_fit_linear_velocity(q, v_fm.lin, u)
    }
}

/// `f_u[j] = <N_j, f_q>` where `N_j = ½ (e_j, 0) ⊗ q` is the quaternion rate
/// produced by a unit angular speed about axis j.
fn quat_n_transpose(quat: DQuat, f_q: &[f64], f_u: &mut [f64]) {
    let fq = DQuat::from_xyzw(f_q[1], f_q[2], f_q[3], f_q[0]);
    for (j, axis) in [DVec3::X, DVec3::Y, DVec3::Z].into_iter().enumerate() {
        f_u[j] = quat_derivative(quat, axis).dot(fq);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn coordinate_counts() {
        assert_eq!(MobilizerType::Pin.num_q(), 1);
        assert_eq!(MobilizerType::Ball.num_q(), 4);
        assert_eq!(MobilizerType::Ball.num_u(), 3);
        assert_eq!(MobilizerType::Free.num_q(), 7);
        assert_eq!(MobilizerType::Free.num_u(), 6);
        assert_eq!(MobilizerType::Free.default_q().len(), 7);
    }

    #[test]
    fn pin_rotates_about_z() {
        let x = MobilizerType::Pin.calc_x_fm(&[FRAC_PI_2]);
        assert!((x.rotation * DVec3::X).abs_diff_eq(DVec3::Y, 1e-12));
    }

    #[test]
    fn fitted_q_reproduces_the_rotation() {
        let target = Rotation::about_x(0.3) * Rotation::about_y(-0.7);
        let mut q = [0.0; 2];
        MobilizerType::Universal.set_q_to_fit_rotation(&target, &mut q).unwrap();
        assert!(MobilizerType::Universal
            .calc_x_fm(&q)
            .rotation
            .abs_diff_eq(&target, 1e-12));

        let mut q = MobilizerType::Free.default_q();
        let x = Transform::new(Rotation::about_axis(DVec3::ONE, 1.0), DVec3::new(1.0, 2.0, 3.0));
        MobilizerType::Free.set_q_to_fit_transform(&x, &mut q).unwrap();
        assert!(MobilizerType::Free.calc_x_fm(&q).abs_diff_eq(&x, 1e-12));
    }

    #[test]
    fn universal_hdot_matches_finite_difference() {
        let q = [0.4, -0.2];
        let u = [1.3, 0.5];
        let h = 1e-7;
        let h0 = MobilizerType::Universal.calc_h_fm(&q);
        let h1 = MobilizerType::Universal.calc_h_fm(&[q[0] + h * u[0], q[1] + h * u[1]]);
        let hdot = MobilizerType::Universal.calc_h_fm_dot(&q, &u).unwrap();
        for i in 0..2 {
            let fd = (h1[i] - h0[i]) * (1.0 / h);
            assert!(fd.abs_diff_eq(&hdot[i], 1e-6));
        }
    }

    #[test]
    fn ball_n_transpose_is_adjoint_of_qdot() {
        let q = [0.9, 0.1, -0.3, 0.2];
        let u = [0.5, -1.0, 2.0];
        let f_q = [0.3, -0.7, 1.1, 0.4];
        let mut qdot = [0.0; 4];
        MobilizerType::Ball.calc_qdot(&q, &u, &mut qdot).unwrap();
        let mut f_u = [0.0; 3];
        MobilizerType::Ball.multiply_by_n_transpose(&q, &f_q, &mut f_u).unwrap();
        let lhs: f64 = qdot.iter().zip(f_q.iter()).map(|(a, b)| a * b).sum();
        let rhs: f64 = u.iter().zip(f_u.iter()).map(|(a, b)| a * b).sum();
        assert!((lhs - rhs).abs() < 1e-12);
    }

    #[derive(Debug)]
    struct Screw;

    impl CustomMobilizer for Screw {
        fn name(&self) -> &str {
            "Screw"
        }
        fn num_q(&self) -> usize {
            1
        }
        fn num_u(&self) -> usize {
            1
        }
        fn calc_x_fm(&self, q: &[f64]) -> Transform {
            Transform::new(Rotation::about_z(q[0]), DVec3::new(0.0, 0.0, 0.1 * q[0]))
        }
        fn calc_h_fm(&self, _q: &[f64]) -> Vec<SpatialVec> {
            vec![SpatialVec::new(DVec3::Z, DVec3::new(0.0, 0.0, 0.1))]
        }
    }

    #[test]
    fn custom_mobilizer_reports_missing_capabilities() {
        let screw = MobilizerType::custom(Screw);
        assert_eq!(screw.name(), "Screw");
        assert!(screw.calc_h_fm_dot(&[0.0], &[0.0]).is_ok());
        assert!(matches!(
            screw.calc_h_fm_dot(&[0.0], &[1.0]),
            Err(MultibodyError::NotImplemented(_))
        ));
        let mut q = [0.0];
        assert!(matches!(
            screw.set_q_to_fit_rotation(&Rotation::IDENTITY, &mut q),
            Err(MultibodyError::NotImplemented(_))
        ));
    }
}
