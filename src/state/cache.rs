//! Per-body realization results, one struct per stage.
//!
//! All spatial quantities are expressed in Ground and taken about the body
//! origin unless the field name says otherwise.

use glam::DVec3;

use crate::core::types::{Rotation, Transform};
use crate::utils::dense::DenseMat;
use crate::utils::spatial::{SpatialMat, SpatialVec};

#[derive(Debug, Clone)]
pub struct PositionCache {
    pub x_fm: Transform,
    pub x_pb: Transform,
    pub x_gb: Transform,
    /// Orientation of the inboard frame F in Ground.
    pub r_gf: Rotation,
    /// Vector from M's origin to B's origin, expressed in F.
    pub r_mb_f: DVec3,
    /// Hinge matrix columns about M's origin, in F.
    pub h_fm: Vec<SpatialVec>,
    /// Hinge matrix columns mapping u to the velocity of B in P, about B's origin, in Ground.
    pub h_g: Vec<SpatialVec>,
    pub spatial_inertia: SpatialMat,
}

impl PositionCache {
    pub(crate) fn ground() -> Self {
        Self {
            x_fm: Transform::IDENTITY,
            x_pb: Transform::IDENTITY,
            x_gb: Transform::IDENTITY,
            r_gf: Rotation::IDENTITY,
            r_mb_f: DVec3::ZERO,
            h_fm: Vec::new(),
            h_g: Vec::new(),
            spatial_inertia: SpatialMat::infinite_diagonal(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VelocityCache {
    pub v_fm: SpatialVec,
    pub v_pb_g: SpatialVec,
    pub v_gb: SpatialVec,
    /// `HDot_FM u`, about M's origin, in F.
    pub hdot_u_fm: SpatialVec,
    /// Velocity-dependent part of the body's acceleration given its parent's.
    pub coriolis: SpatialVec,
}

#[derive(Debug, Clone)]
pub struct DynamicsCache {
    pub gyroscopic: SpatialVec,
    /// Applied body force plus gravity.
    pub applied: SpatialVec,
    pub articulated_inertia: SpatialMat,
    pub bias_force: SpatialVec,
    /// `P H`, one column per u.
    pub(crate) p_h: Vec<SpatialVec>,
    pub(crate) d_inv: DenseMat,
    /// `tau - Hᵀ z`.
    pub(crate) u_residual: Vec<f64>,
    pub(crate) prescribed: bool,
}

impl DynamicsCache {
    pub(crate) fn ground() -> Self {
        Self {
            gyroscopic: SpatialVec::ZERO,
            applied: SpatialVec::ZERO,
            articulated_inertia: SpatialMat::ZERO,
            bias_force: SpatialVec::ZERO,
            p_h: Vec::new(),
            d_inv: DenseMat::zeros(0),
            u_residual: Vec::new(),
            prescribed: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccelerationCache {
    pub a_gb: SpatialVec,
    /// About M's origin, in F.
    pub a_fm: SpatialVec,
    /// Force exerted by the mobilizer on B, about B's origin, in Ground.
    pub reaction_on_body: SpatialVec,
}
