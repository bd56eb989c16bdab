use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use crate::core::types::{Rotation, Transform};
use crate::utils::math::{cross_mat, outer};

/// A 6D spatial vector combining angular and linear components.
/// For motion, angular is angular velocity/acceleration and linear is the
/// velocity/acceleration of a reference point. For force, angular is the
/// moment about the reference point and linear is the force.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialVec {
    pub ang: DVec3,
    pub lin: DVec3,
}

impl SpatialVec {
    pub const ZERO: Self = Self {
        ang: DVec3::ZERO,
        lin: DVec3::ZERO,
    };

    pub fn new(ang: DVec3, lin: DVec3) -> Self {
        Self { ang, lin }
    }

    pub fn nan() -> Self {
        Self::new(DVec3::NAN, DVec3::NAN)
    }

    pub fn dot(&self, other: &SpatialVec) -> f64 {
        self.ang.dot(other.ang) + self.lin.dot(other.lin)
    }

    /// Spatial motion cross product: v1 x_m v2
    pub fn cross_motion(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang),
            lin: self.ang.cross(other.lin) + self.lin.cross(other.ang),
        }
    }

    /// Spatial force cross product: v x_f f
    pub fn cross_force(&self, other: &SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.ang.cross(other.ang) + self.lin.cross(other.lin),
            lin: self.ang.cross(other.lin),
        }
    }

    /// Applies the same rotation to both halves.
    pub fn reexpress(&self, r: &Rotation) -> SpatialVec {
        SpatialVec {
            ang: *r * self.ang,
            lin: *r * self.lin,
        }
    }

    /// Rigid-body velocity of a point displaced by `r` from the reference point.
    pub fn shift_velocity(&self, r: DVec3) -> SpatialVec {
        SpatialVec {
            ang: self.ang,
            lin: self.lin + self.ang.cross(r),
        }
    }

    /// Rigid-body acceleration of a point displaced by `r`, given the angular
    /// velocity `w` of the body: adds `b × r + w × (w × r)`.
    pub fn shift_acceleration(&self, w: DVec3, r: DVec3) -> SpatialVec {
        SpatialVec {
            ang: self.ang,
            lin: self.lin + self.ang.cross(r) + w.cross(w.cross(r)),
        }
    }

    /// Moves a force's reference point by `r`; the moment picks up `-r × f`.
    pub fn shift_force(&self, r: DVec3) -> SpatialVec {
        SpatialVec {
            ang: self.ang - r.cross(self.lin),
            lin: self.lin,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.ang.is_finite() && self.lin.is_finite()
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.ang.abs_diff_eq(other.ang, max_abs_diff)
            && self.lin.abs_diff_eq(other.lin, max_abs_diff)
    }
}

impl std::ops::Add for SpatialVec {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            ang: self.ang + other.ang,
            lin: self.lin + other.lin,
        }
    }
}

impl std::ops::AddAssign for SpatialVec {
    fn add_assign(&mut self, other: Self) {
        self.ang += other.ang;
        self.lin += other.lin;
    }
}

impl std::ops::Sub for SpatialVec {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            ang: self.ang - other.ang,
            lin: self.lin - other.lin,
        }
    }
}

impl std::ops::SubAssign for SpatialVec {
    fn sub_assign(&mut self, other: Self) {
        self.ang -= other.ang;
        self.lin -= other.lin;
    }
}

impl std::ops::Neg for SpatialVec {
    type Output = Self;
    fn neg(self) -> Self {
        Self {
            ang: -self.ang,
            lin: -self.lin,
        }
    }
}

impl std::ops::Mul<f64> for SpatialVec {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            ang: self.ang * rhs,
            lin: self.lin * rhs,
        }
    }
}

/// A 6x6 spatial matrix represented as 4 3x3 blocks acting on `[ang; lin]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SpatialMat {
    pub m00: DMat3,
    pub m01: DMat3,
    pub m10: DMat3,
    pub m11: DMat3,
}

impl SpatialMat {
    pub const ZERO: Self = Self {
        m00: DMat3::ZERO,
        m01: DMat3::ZERO,
        m10: DMat3::ZERO,
        m11: DMat3::ZERO,
    };

    pub fn new(m00: DMat3, m01: DMat3, m10: DMat3, m11: DMat3) -> Self {
        Self { m00, m01, m10, m11 }
    }

    /// Diagonal matrix with every diagonal entry infinite and zeros elsewhere.
    pub fn infinite_diagonal() -> Self {
        let inf = DMat3::from_diagonal(DVec3::splat(f64::INFINITY));
        Self::new(inf, DMat3::ZERO, DMat3::ZERO, inf)
    }

    pub fn mul_vec(&self, v: SpatialVec) -> SpatialVec {
        SpatialVec {
            ang: self.m00 * v.ang + self.m01 * v.lin,
            lin: self.m10 * v.ang + self.m11 * v.lin,
        }
    }

    pub fn transpose(&self) -> Self {
        Self {
            m00: self.m00.transpose(),
            m01: self.m10.transpose(),
            m10: self.m01.transpose(),
            m11: self.m11.transpose(),
        }
    }

    /// Computes the outer product `a bᵀ` as a 6x6 matrix.
    pub fn outer_product(a: SpatialVec, b: SpatialVec) -> Self {
        Self {
            m00: outer(a.ang, b.ang),
            m01: outer(a.ang, b.lin),
            m10: outer(a.lin, b.ang),
            m11: outer(a.lin, b.lin),
        }
    }

    /// `R M Rᵀ` applied blockwise: re-expresses a spatial inertia.
    pub fn reexpress(&self, r: &Rotation) -> Self {
        let rm = *r.as_mat3();
        let rt = rm.transpose();
        Self {
            m00: rm * self.m00 * rt,
            m01: rm * self.m01 * rt,
            m10: rm * self.m10 * rt,
            m11: rm * self.m11 * rt,
        }
    }

    /// Shifts an inertia-like matrix from a child point to a parent point
    /// located `-l` from it: `Φ M Φᵀ` with `Φ = [[1, l×], [0, 1]]`.
    pub fn shift_to_parent(&self, l: DVec3) -> Self {
        let lx = cross_mat(l);
        let a00 = self.m00 + lx * self.m10;
        let a01 = self.m01 + lx * self.m11;
        let a10 = self.m10;
        let a11 = self.m11;
        Self {
            m00: a00 - a01 * lx,
            m01: a01,
            m10: a10 - a11 * lx,
            m11: a11,
        }
    }
}

impl std::ops::Add for SpatialMat {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            m00: self.m00 + other.m00,
            m01: self.m01 + other.m01,
            m10: self.m10 + other.m10,
            m11: self.m11 + other.m11,
        }
    }
}

impl std::ops::AddAssign for SpatialMat {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl std::ops::Sub for SpatialMat {
    type Output = Self;
    fn sub(self, other: Self) -> Self {
        Self {
            m00: self.m00 - other.m00,
            m01: self.m01 - other.m01,
            m10: self.m10 - other.m10,
            m11: self.m11 - other.m11,
        }
    }
}

impl std::ops::Mul<f64> for SpatialMat {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        Self {
            m00: self.m00 * rhs,
            m01: self.m01 * rhs,
            m10: self.m10 * rhs,
            m11: self.m11 * rhs,
        }
    }
}

/// Shifts a motion vector expressed about the parent origin to a child point
/// offset by `l`: `(w, v + w × l)`.
pub fn transform_motion(v: SpatialVec, l: DVec3) -> SpatialVec {
    v.shift_velocity(l)
}

/// Shifts a force applied at a child point offset by `l` back to the parent
/// origin: `(m + l × f, f)`.
pub fn transform_force(f: SpatialVec, l: DVec3) -> SpatialVec {
    f.shift_force(-l)
}

/// Velocity of frame B measured in frame A, about B's origin, expressed in
/// A, from both frames' Ground-frame poses and velocities.
pub fn find_relative_velocity(
    x_ga: &Transform,
    v_ga: &SpatialVec,
    x_gb: &Transform,
    v_gb: &SpatialVec,
) -> SpatialVec {
    let p_ab_g = x_gb.position - x_ga.position;
    let w_ab_g = v_gb.ang - v_ga.ang;
    let v_ab_g = (v_gb.lin - v_ga.lin) - v_ga.ang.cross(p_ab_g);
    SpatialVec::new(w_ab_g, v_ab_g).reexpress(&x_ga.rotation.transpose())
}

/// Acceleration of frame B measured in frame A, about B's origin, expressed
/// in A. Derivatives taken in Ground are converted to derivatives taken in A
/// by removing the `w_GA ×` contribution of A's rotation.
pub fn find_relative_acceleration(
    x_ga: &Transform,
    v_ga: &SpatialVec,
    a_ga: &SpatialVec,
    x_gb: &Transform,
    v_gb: &SpatialVec,
    a_gb: &SpatialVec,
) -> SpatialVec {
    let w_ga = v_ga.ang;
    let p_ab_g = x_gb.position - x_ga.position;
    let p_ab_g_dot = v_gb.lin - v_ga.lin;
    let w_ab_g = v_gb.ang - v_ga.ang;
    let v_ab_g = p_ab_g_dot - w_ga.cross(p_ab_g);

    let w_ab_g_dot = a_gb.ang - a_ga.ang;
    let v_ab_g_dot = (a_gb.lin - a_ga.lin) - (a_ga.ang.cross(p_ab_g) + w_ga.cross(p_ab_g_dot));

    let b_ab_g = w_ab_g_dot - w_ga.cross(w_ab_g);
    let a_ab_g = v_ab_g_dot - w_ga.cross(v_ab_g);
    SpatialVec::new(b_ab_g, a_ab_g).reexpress(&x_ga.rotation.transpose())
}
