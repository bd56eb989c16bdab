//! Mass properties and rotational inertia.
//!
//! Inertias are always symmetric positive semi-definite; constructors reject
//! anything else instead of storing it. Re-expression (rotation only) and
//! shifting the about-point (parallel-axis correction) are separate operations.

use glam::{DMat3, DVec3};
use serde::{Deserialize, Serialize};

use super::types::Rotation;
use crate::config::INERTIA_TOLERANCE;
use crate::error::{MultibodyError, Result};
use crate::utils::math::{cross_mat, parallel_axis};
use crate::utils::spatial::SpatialMat;

/// Symmetric rotational inertia matrix about some point, in some frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Inertia(DMat3);

impl Default for Inertia {
    fn default() -> Self {
        Self(DMat3::ZERO)
    }
}

impl Inertia {
    pub const ZERO: Self = Self(DMat3::ZERO);

    /// Principal moments along the coordinate axes, no products of inertia.
    pub fn from_moments(ixx: f64, iyy: f64, izz: f64) -> Result<Self> {
        Self::try_new(DMat3::from_diagonal(DVec3::new(ixx, iyy, izz)))
    }

    /// Moments and products `(ixy, ixz, iyz)` as they appear in the matrix.
    pub fn from_moments_and_products(moments: DVec3, products: DVec3) -> Result<Self> {
        let m = DMat3::from_cols(
            DVec3::new(moments.x, products.x, products.y),
            DVec3::new(products.x, moments.y, products.z),
            DVec3::new(products.y, products.z, moments.z),
        );
        Self::try_new(m)
    }

    /// Validates symmetry and positive semi-definiteness, then symmetrizes
    /// away round-off.
    pub fn try_new(m: DMat3) -> Result<Self> {
        if !m.is_finite() {
            return Err(MultibodyError::invalid_mass_properties(
                "inertia has non-finite entries",
            ));
        }
        let scale = m.x_axis.x.abs().max(m.y_axis.y.abs()).max(m.z_axis.z.abs()).max(1.0);
        let tol = INERTIA_TOLERANCE * scale;
        let asym = m - m.transpose();
        let max_asym = asym
            .x_axis
            .abs()
            .max_element()
            .max(asym.y_axis.abs().max_element())
            .max(asym.z_axis.abs().max_element());
        if max_asym > tol {
            return Err(MultibodyError::invalid_mass_properties(format!(
                "inertia is not symmetric (asymmetry {max_asym:e})"
            )));
        }
        let sym = (m + m.transpose()) * 0.5;
        if !is_positive_semidefinite(&sym, tol) {
            return Err(MultibodyError::invalid_mass_properties(
                "inertia is not positive semi-definite",
            ));
        }
        Ok(Self(sym))
    }

    /// Internal constructor for products of already-valid inertias.
    pub(crate) fn from_mat3_unchecked(m: DMat3) -> Self {
        Self((m + m.transpose()) * 0.5)
    }

    pub fn as_mat3(&self) -> &DMat3 {
        &self.0
    }

    pub fn moments(&self) -> DVec3 {
        DVec3::new(self.0.x_axis.x, self.0.y_axis.y, self.0.z_axis.z)
    }

    pub fn products(&self) -> DVec3 {
        DVec3::new(self.0.y_axis.x, self.0.z_axis.x, self.0.z_axis.y)
    }

    /// Re-expresses an inertia given in frame B into frame F, where `r_fb`
    /// maps B-expressed vectors into F: `I_F = R_FB I_B R_BF`.
    pub fn reexpress(&self, r_fb: &Rotation) -> Self {
        Self::from_mat3_unchecked(*r_fb * self.0 * *r_fb.transpose().as_mat3())
    }

    /// Shifts a central inertia to a point offset by `p` from the mass center.
    pub fn shift_from_mass_center(&self, p: DVec3, mass: f64) -> Self {
        Self::from_mat3_unchecked(self.0 + parallel_axis(p) * mass)
    }

    /// Shifts an inertia about a point to the mass center located at `p` from that point.
    pub fn shift_to_mass_center(&self, p: DVec3, mass: f64) -> Self {
        Self::from_mat3_unchecked(self.0 - parallel_axis(p) * mass)
    }

    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f64) -> bool {
        self.0.abs_diff_eq(other.0, max_abs_diff)
    }
}

impl std::ops::Add for Inertia {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl std::ops::Mul<DVec3> for Inertia {
    type Output = DVec3;
    fn mul(self, rhs: DVec3) -> DVec3 {
        self.0 * rhs
    }
}

fn is_positive_semidefinite(m: &DMat3, tol: f64) -> bool {
    let (a, b, c) = (m.x_axis.x, m.y_axis.y, m.z_axis.z);
    let (ab, ac, bc) = (m.y_axis.x, m.z_axis.x, m.z_axis.y);
    let minors = [
        a,
        b,
        c,
        a * b - ab * ab,
        a * c - ac * ac,
        b * c - bc * bc,
        m.determinant(),
    ];
    minors.iter().all(|&minor| minor >= -tol)
}

/// Mass, mass-center station, and inertia about the body origin, all
/// expressed in the body frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassProperties {
    mass: f64,
    mass_center: DVec3,
    inertia: Inertia,
}

impl Default for MassProperties {
    fn default() -> Self {
        Self {
            mass: 1.0,
            mass_center: DVec3::ZERO,
            inertia: Inertia(DMat3::IDENTITY),
        }
    }
}

impl MassProperties {
    /// `inertia` is taken about the body origin, not the mass center.
    pub fn new(mass: f64, mass_center: DVec3, inertia: Inertia) -> Result<Self> {
        if !(mass >= 0.0) || !mass.is_finite() {
            return Err(MultibodyError::invalid_mass_properties(format!(
                "mass must be finite and non-negative, got {mass}"
            )));
        }
        if !mass_center.is_finite() {
            return Err(MultibodyError::invalid_mass_properties(
                "mass center has non-finite coordinates",
            ));
        }
        // The inertia about the origin must cover the parallel-axis term of
        // the mass center, i.e. the central inertia is itself valid.
        let central = inertia.shift_to_mass_center(mass_center, mass);
        Inertia::try_new(*central.as_mat3()).map_err(|_| {
            MultibodyError::invalid_mass_properties(format!(
                "inertia about the origin {:?} is too small for mass {mass} at {mass_center:?}",
                inertia.moments()
            ))
        })?;
        Ok(Self {
            mass,
            mass_center,
            inertia,
        })
    }

    /// Builds from an inertia taken about the mass center.
    pub fn from_central_inertia(mass: f64, mass_center: DVec3, central: Inertia) -> Result<Self> {
        let about_origin = central.shift_from_mass_center(-mass_center, mass);
        Self::new(mass, mass_center, about_origin)
    }

    /// Point mass at `station`.
    pub fn point_mass(mass: f64, station: DVec3) -> Result<Self> {
        Self::from_central_inertia(mass, station, Inertia::ZERO)
    }

    /// Uniform solid sphere centered on the body origin.
    pub fn solid_sphere(mass: f64, radius: f64) -> Result<Self> {
        let i = 0.4 * mass * radius * radius;
        Self::new(mass, DVec3::ZERO, Inertia::from_moments(i, i, i)?)
    }

    /// Uniform solid box with the given half extents, centered on the body origin.
    pub fn solid_box(mass: f64, half_extents: DVec3) -> Result<Self> {
        let l = half_extents * 2.0;
        let factor = mass / 12.0;
        let inertia = Inertia::from_moments(
            factor * (l.y * l.y + l.z * l.z),
            factor * (l.x * l.x + l.z * l.z),
            factor * (l.x * l.x + l.y * l.y),
        )?;
        Self::new(mass, DVec3::ZERO, inertia)
    }

    /// Mass properties used for Ground: infinite mass and inertia.
    pub fn infinite() -> Self {
        Self {
            mass: f64::INFINITY,
            mass_center: DVec3::ZERO,
            inertia: Inertia(DMat3::from_diagonal(DVec3::splat(f64::INFINITY))),
        }
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn mass_center(&self) -> DVec3 {
        self.mass_center
    }

    /// Inertia about the body origin.
    pub fn inertia(&self) -> &Inertia {
        &self.inertia
    }

    /// Inertia about the origin per unit mass; zero for a massless body.
    pub fn unit_inertia(&self) -> Inertia {
        if self.mass == 0.0 {
            Inertia::ZERO
        } else {
            Inertia::from_mat3_unchecked(*self.inertia.as_mat3() / self.mass)
        }
    }

    pub fn is_infinite(&self) -> bool {
        self.mass.is_infinite()
    }

    /// Inertia about the mass center, same frame.
    pub fn calc_central_inertia(&self) -> Inertia {
        if self.is_infinite() {
            return self.inertia;
        }
        self.inertia.shift_to_mass_center(self.mass_center, self.mass)
    }

    /// Inertia about the point `new_origin` (measured from the current
    /// origin), same frame.
    pub fn calc_shifted_inertia(&self, new_origin: DVec3) -> Inertia {
        if self.is_infinite() {
            return self.inertia;
        }
        self.calc_central_inertia()
            .shift_from_mass_center(new_origin - self.mass_center, self.mass)
    }

    /// Same physical mass distribution measured from a new origin.
    pub fn calc_shifted_mass_props(&self, new_origin: DVec3) -> MassProperties {
        MassProperties {
            mass: self.mass,
            mass_center: self.mass_center - new_origin,
            inertia: self.calc_shifted_inertia(new_origin),
        }
    }

    /// Re-expresses in frame F given `r_fb`; the about-point does not move.
    pub fn reexpress(&self, r_fb: &Rotation) -> MassProperties {
        MassProperties {
            mass: self.mass,
            mass_center: *r_fb * self.mass_center,
            inertia: self.inertia.reexpress(r_fb),
        }
    }

    /// 6x6 spatial inertia about the origin:
    /// `[[I, m c×], [-m c×, m 1]]` acting on `[w; v]`.
    pub fn to_spatial_mat(&self) -> SpatialMat {
        let mc = cross_mat(self.mass_center * self.mass);
        SpatialMat::new(
            *self.inertia.as_mat3(),
            mc,
            -mc,
            DMat3::from_diagonal(DVec3::splat(self.mass)),
        )
    }
}
