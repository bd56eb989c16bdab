//! Additional math helpers layered on top of `glam`.

use glam::{DMat3, DQuat, DVec3};

use crate::config::QUATERNION_MIN_NORM;

/// Skew-symmetric matrix `[v]×` such that `cross_mat(v) * w == v.cross(w)`.
pub fn cross_mat(v: DVec3) -> DMat3 {
    DMat3::from_cols(
        DVec3::new(0.0, v.z, -v.y),
        DVec3::new(-v.z, 0.0, v.x),
        DVec3::new(v.y, -v.x, 0.0),
    )
}

/// Outer product `a bᵀ`.
pub fn outer(a: DVec3, b: DVec3) -> DMat3 {
    DMat3::from_cols(a * b.x, a * b.y, a * b.z)
}

/// `|v|² 1 - v vᵀ`, the geometric part of the parallel-axis shift.
pub fn parallel_axis(v: DVec3) -> DMat3 {
    DMat3::from_diagonal(DVec3::splat(v.length_squared())) - outer(v, v)
}

/// Reads a quaternion stored as `[w, x, y, z]`; degenerate input maps to identity.
pub fn quat_from_wxyz(q: &[f64]) -> DQuat {
    let quat = DQuat::from_xyzw(q[1], q[2], q[3], q[0]);
    let norm = quat.length();
    if norm < QUATERNION_MIN_NORM || !norm.is_finite() {
        DQuat::IDENTITY
    } else {
        quat / norm
    }
}

/// Writes a quaternion as `[w, x, y, z]`, choosing the `w >= 0` hemisphere.
pub fn quat_to_wxyz(quat: DQuat, out: &mut [f64]) {
    let quat = if quat.w < 0.0 { -quat } else { quat };
    out[0] = quat.w;
    out[1] = quat.x;
    out[2] = quat.y;
    out[3] = quat.z;
}

/// Time derivative of a unit quaternion rotating with angular velocity `w`
/// expressed in the fixed (outer) frame: `q̇ = ½ (0, w) ⊗ q`.
pub fn quat_derivative(quat: DQuat, w: DVec3) -> DQuat {
    DQuat::from_xyzw(w.x, w.y, w.z, 0.0) * quat * 0.5
}

/// Second derivative `q̈ = ½ (0, ẇ) ⊗ q + ½ (0, w) ⊗ q̇`.
pub fn quat_second_derivative(quat: DQuat, w: DVec3, w_dot: DVec3) -> DQuat {
    let q_dot = quat_derivative(quat, w);
    DQuat::from_xyzw(w_dot.x, w_dot.y, w_dot.z, 0.0) * quat * 0.5
        + DQuat::from_xyzw(w.x, w.y, w.z, 0.0) * q_dot * 0.5
}

/// Writes a quaternion as `[w, x, y, z]` without hemisphere normalization.
pub fn quat_write_raw(quat: DQuat, out: &mut [f64]) {
    out[0] = quat.w;
    out[1] = quat.x;
    out[2] = quat.y;
    out[3] = quat.z;
}
