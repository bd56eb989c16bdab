use serde::{Deserialize, Serialize};

use super::inertia::MassProperties;
use super::mobilizer::MobilizerType;
use super::motion::Motion;
use super::types::Transform;
use crate::error::Result;
use crate::state::{InstanceVars, PositionCache, VelocityCache};
use crate::utils::ids::MobilizedBodyIndex;
use crate::utils::spatial::SpatialVec;

/// Opaque handle to geometry owned by whoever renders it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GeometryId(pub u64);

/// Geometry placed in a frame; stored and forwarded, never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Decoration {
    pub transform: Transform,
    pub geometry: GeometryId,
}

/// Decorations attached to the body frame and to the mobilizer frames.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Decorations {
    pub body: Vec<Decoration>,
    /// Relative to the inboard frame F.
    pub inboard: Vec<Decoration>,
    /// Relative to the outboard frame M.
    pub outboard: Vec<Decoration>,
}

/// One body in the tree and the mobilizer connecting it to its parent.
#[derive(Debug, Clone)]
pub struct BodyNode {
    pub(crate) name: String,
    pub(crate) parent: Option<MobilizedBodyIndex>,
    pub(crate) children: Vec<MobilizedBodyIndex>,
    pub(crate) mobilizer: MobilizerType,
    pub(crate) mass_properties: MassProperties,
    /// `X_PF`
    pub(crate) inboard_frame: Transform,
    /// `X_BM`
    pub(crate) outboard_frame: Transform,
    pub(crate) default_q: Vec<f64>,
    pub(crate) motion: Option<Motion>,
    pub(crate) level: usize,
    pub(crate) q_start: usize,
    pub(crate) u_start: usize,
    pub(crate) decorations: Decorations,
}

impl BodyNode {
    /// New body attached to `parent`. Frames default to identity and mass
    /// properties to a unit sphere-like body at the origin.
    pub fn new(name: &str, parent: MobilizedBodyIndex, mobilizer: MobilizerType) -> Self {
        let default_q = mobilizer.default_q();
        Self {
            name: name.into(),
            parent: Some(parent),
            children: Vec::new(),
            mobilizer,
            mass_properties: MassProperties::default(),
            inboard_frame: Transform::IDENTITY,
            outboard_frame: Transform::IDENTITY,
            default_q,
            motion: None,
            level: 0,
            q_start: 0,
            u_start: 0,
            decorations: Decorations::default(),
        }
    }

    pub(crate) fn ground() -> Self {
        Self {
            name: "Ground".into(),
            parent: None,
            children: Vec::new(),
            mobilizer: MobilizerType::Ground,
            mass_properties: MassProperties::infinite(),
            inboard_frame: Transform::IDENTITY,
            outboard_frame: Transform::IDENTITY,
            default_q: Vec::new(),
            motion: None,
            level: 0,
            q_start: 0,
            u_start: 0,
            decorations: Decorations::default(),
        }
    }

    pub fn with_mass_properties(mut self, mass_properties: MassProperties) -> Self {
        self.mass_properties = mass_properties;
        self
    }

    pub fn with_inboard_frame(mut self, x_pf: Transform) -> Self {
        self.inboard_frame = x_pf;
        self
    }

    pub fn with_outboard_frame(mut self, x_bm: Transform) -> Self {
        self.outboard_frame = x_bm;
        self
    }

    /// `add_body` rejects the node if the length does not match the mobilizer's nq.
    pub fn with_default_q(mut self, q: Vec<f64>) -> Self {
        self.default_q = q;
        self
    }

    pub fn with_motion(mut self, motion: Motion) -> Self {
        self.motion = Some(motion);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<MobilizedBodyIndex> {
        self.parent
    }

    pub fn children(&self) -> &[MobilizedBodyIndex] {
        &self.children
    }

    pub fn mobilizer(&self) -> &MobilizerType {
        &self.mobilizer
    }

    pub fn num_q(&self) -> usize {
        self.mobilizer.num_q()
    }

    pub fn num_u(&self) -> usize {
        self.mobilizer.num_u()
    }

    pub(crate) fn default_instance(&self) -> InstanceVars {
        InstanceVars {
            mass_properties: self.mass_properties,
            inboard_frame: self.inboard_frame,
            outboard_frame: self.outboard_frame,
            motion: self.motion,
        }
    }

    /// Pose, hinge matrix, and spatial inertia from the parent's realized pose.
    pub(crate) fn realize_position(
        &self,
        q: &[f64],
        inst: &InstanceVars,
        parent: &PositionCache,
    ) -> PositionCache {
        let x_fm = self.mobilizer.calc_x_fm(q);
        let x_mb = inst.outboard_frame.inverse();
        let x_pb = inst.inboard_frame * x_fm * x_mb;
        let x_gb = parent.x_gb * x_pb;
        let r_gf = parent.x_gb.rotation * inst.inboard_frame.rotation;
        let r_mb_f = x_fm.rotation * x_mb.position;

        let h_fm = self.mobilizer.calc_h_fm(q);
        let h_g = h_fm
            .iter()
            .map(|h| SpatialVec::new(r_gf * h.ang, r_gf * (h.lin + h.ang.cross(r_mb_f))))
            .collect();

        let spatial_inertia = inst
            .mass_properties
            .reexpress(&x_gb.rotation)
            .to_spatial_mat();

        PositionCache {
            x_fm,
            x_pb,
            x_gb,
            r_gf,
            r_mb_f,
            h_fm,
            h_g,
            spatial_inertia,
        }
    }

    /// Velocities, qdot, and the Coriolis acceleration term from the parent's
    /// realized velocity.
    pub(crate) fn realize_velocity(
        &self,
        q: &[f64],
        u: &[f64],
        pos: &PositionCache,
        parent_pos: &PositionCache,
        parent_vel: &VelocityCache,
        qdot: &mut [f64],
    ) -> Result<VelocityCache> {
        let v_fm = combine_columns(&pos.h_fm, u);
        let v_pb_g = combine_columns(&pos.h_g, u);

        let w_gp = parent_vel.v_gb.ang;
        let l = pos.x_gb.position - parent_pos.x_gb.position;
        let v_gb = SpatialVec::new(
            w_gp + v_pb_g.ang,
            parent_vel.v_gb.lin + w_gp.cross(l) + v_pb_g.lin,
        );

        let hdot = self.mobilizer.calc_h_fm_dot(q, u)?;
        let hdot_u_fm = combine_columns(&hdot, u);

        let w_fm = v_fm.ang;
        let r = pos.r_mb_f;
        let coriolis = SpatialVec::new(
            w_gp.cross(v_pb_g.ang) + pos.r_gf * hdot_u_fm.ang,
            w_gp.cross(w_gp.cross(l))
                + 2.0 * w_gp.cross(v_pb_g.lin)
                + pos.r_gf
                    * (hdot_u_fm.lin + hdot_u_fm.ang.cross(r) + w_fm.cross(w_fm.cross(r))),
        );

        self.mobilizer.calc_qdot(q, u, qdot)?;

        Ok(VelocityCache {
            v_fm,
            v_pb_g,
            v_gb,
            hdot_u_fm,
            coriolis,
        })
    }
}

/// `Σ cols[i] * x[i]`
pub(crate) fn combine_columns(cols: &[SpatialVec], x: &[f64]) -> SpatialVec {
    cols.iter()
        .zip(x)
        .fold(SpatialVec::ZERO, |acc, (c, &xi)| acc + *c * xi)
}

/// `Hᵀ f`
pub(crate) fn project_columns(cols: &[SpatialVec], f: &SpatialVec) -> Vec<f64> {
    cols.iter().map(|c| c.dot(f)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::DVec3;
    use crate::core::types::Rotation;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn pin_position_composes_frames() {
        let node = BodyNode::new("arm", MobilizedBodyIndex::GROUND, MobilizerType::Pin)
            .with_inboard_frame(Transform::from_translation(DVec3::X));
        let inst = node.default_instance();
        let pos = node.realize_position(&[FRAC_PI_2], &inst, &PositionCache::ground());
        assert!(pos.x_gb.position.abs_diff_eq(DVec3::X, 1e-12));
        assert!(pos
            .x_gb
            .rotation
            .abs_diff_eq(&Rotation::about_z(FRAC_PI_2), 1e-12));
        assert_eq!(pos.h_g.len(), 1);
    }

    #[test]
    fn outboard_offset_moves_body_origin_on_a_circle() {
        // M sits 1 unit along -x of B, so B's origin is 1 unit along +x of the pin axis.
        let node = BodyNode::new("link", MobilizedBodyIndex::GROUND, MobilizerType::Pin)
            .with_outboard_frame(Transform::from_translation(-DVec3::X));
        let inst = node.default_instance();
        let pos = node.realize_position(&[FRAC_PI_2], &inst, &PositionCache::ground());
        assert!(pos.x_gb.position.abs_diff_eq(DVec3::Y, 1e-12));

        let mut qdot = [0.0];
        let vel = node
            .realize_velocity(
                &[FRAC_PI_2],
                &[2.0],
                &pos,
                &PositionCache::ground(),
                &VelocityCache::default(),
                &mut qdot,
            )
            .unwrap();
        assert!(vel.v_gb.lin.abs_diff_eq(DVec3::new(-2.0, 0.0, 0.0), 1e-12));
        // Centripetal acceleration of B's origin points back at the axis.
        assert!(vel.coriolis.lin.abs_diff_eq(DVec3::new(0.0, -4.0, 0.0), 1e-12));
        assert_eq!(qdot[0], 2.0);
    }
}
