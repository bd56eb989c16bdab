//! Cached per-body quantities and the body's slice of the tree-wide q and u.

use glam::DVec3;

use super::MobilizedBody;
use crate::core::body_node::project_columns;
use crate::core::inertia::{Inertia, MassProperties};
use crate::core::motion::{Motion, MotionLevel, MotionMethod, MotionMethods};
use crate::core::types::{Rotation, Transform};
use crate::error::{MultibodyError, Result};
use crate::state::{InstanceVars, Stage, State};
use crate::utils::spatial::{SpatialMat, SpatialVec};

impl<'t> MobilizedBody<'t> {
    // Pose

    /// `X_GB`
    pub fn body_transform(&self, state: &State) -> Result<Transform> {
        self.check_state(state)?;
        Ok(state.position_cache(self.index, "body_transform")?.x_gb)
    }

    /// `R_GB`
    pub fn body_rotation(&self, state: &State) -> Result<Rotation> {
        Ok(self.body_transform(state)?.rotation)
    }

    /// `p_GB`
    pub fn body_origin_location(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_transform(state)?.position)
    }

    /// `X_FM`; identity for Ground.
    pub fn mobilizer_transform(&self, state: &State) -> Result<Transform> {
        self.check_state(state)?;
        Ok(state.position_cache(self.index, "mobilizer_transform")?.x_fm)
    }

    // Velocity

    /// `V_GB`: angular velocity and origin velocity of B in Ground.
    pub fn body_velocity(&self, state: &State) -> Result<SpatialVec> {
        self.check_state(state)?;
        Ok(state.velocity_cache(self.index, "body_velocity")?.v_gb)
    }

    pub fn body_angular_velocity(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_velocity(state)?.ang)
    }

    pub fn body_origin_velocity(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_velocity(state)?.lin)
    }

    /// `V_FM`, expressed in F.
    pub fn mobilizer_velocity(&self, state: &State) -> Result<SpatialVec> {
        self.check_state(state)?;
        Ok(state.velocity_cache(self.index, "mobilizer_velocity")?.v_fm)
    }

    // Acceleration

    /// `A_GB`: angular acceleration and origin acceleration of B in Ground.
    pub fn body_acceleration(&self, state: &State) -> Result<SpatialVec> {
        self.check_state(state)?;
        Ok(state.acceleration_cache(self.index, "body_acceleration")?.a_gb)
    }

    pub fn body_angular_acceleration(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_acceleration(state)?.ang)
    }

    pub fn body_origin_acceleration(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_acceleration(state)?.lin)
    }

    /// `A_FM`, expressed in F.
    pub fn mobilizer_acceleration(&self, state: &State) -> Result<SpatialVec> {
        self.check_state(state)?;
        Ok(state.acceleration_cache(self.index, "mobilizer_acceleration")?.a_fm)
    }

    // Mass properties and frames (instance variables)

    fn instance<'s>(&self, state: &'s State) -> Result<&'s InstanceVars> {
        self.check_state(state)?;
        state.instance_of(self.index)
    }

    fn upd_instance<'s>(&self, state: &'s mut State) -> Result<&'s mut InstanceVars> {
        self.check_state(state)?;
        if self.is_ground() {
            return Err(MultibodyError::invalid_reference(
                "Ground instance variables are fixed",
            ));
        }
        state.upd_instance_of(self.index)
    }

    /// Mass properties in the body frame, about the body origin.
    pub fn body_mass_properties(&self, state: &State) -> Result<MassProperties> {
        state.require(Stage::Instance, "body_mass_properties")?;
        Ok(self.instance(state)?.mass_properties)
    }

    pub fn body_mass(&self, state: &State) -> Result<f64> {
        Ok(self.body_mass_properties(state)?.mass())
    }

    /// Mass center measured from B's origin, in B.
    pub fn body_mass_center_station(&self, state: &State) -> Result<DVec3> {
        Ok(self.body_mass_properties(state)?.mass_center())
    }

    pub fn body_unit_inertia_about_body_origin(&self, state: &State) -> Result<Inertia> {
        Ok(self.body_mass_properties(state)?.unit_inertia())
    }

    /// Spatial inertia about B's origin, expressed in Ground.
    pub fn body_spatial_inertia_in_ground(&self, state: &State) -> Result<SpatialMat> {
        self.check_state(state)?;
        Ok(state
            .position_cache(self.index, "body_spatial_inertia_in_ground")?
            .spatial_inertia)
    }

    /// `X_PF` as currently stored in `state`.
    pub fn inboard_frame(&self, state: &State) -> Result<Transform> {
        Ok(self.instance(state)?.inboard_frame)
    }

    /// `X_BM` as currently stored in `state`.
    pub fn outboard_frame(&self, state: &State) -> Result<Transform> {
        Ok(self.instance(state)?.outboard_frame)
    }

    pub fn set_inboard_frame(&self, state: &mut State, x_pf: Transform) -> Result<()> {
        self.upd_instance(state)?.inboard_frame = x_pf;
        Ok(())
    }

    pub fn set_outboard_frame(&self, state: &mut State, x_bm: Transform) -> Result<()> {
        self.upd_instance(state)?.outboard_frame = x_bm;
        Ok(())
    }

    pub fn set_body_mass_properties(
        &self,
        state: &mut State,
        mass_properties: MassProperties,
    ) -> Result<()> {
        self.upd_instance(state)?.mass_properties = mass_properties;
        Ok(())
    }

    // Motion

    fn motion_methods(&self, state: &State) -> Result<MotionMethods> {
        Ok(MotionMethods::from_motion(self.instance(state)?.motion.as_ref()))
    }

    pub fn q_motion_method(&self, state: &State) -> Result<MotionMethod> {
        Ok(self.motion_methods(state)?.q)
    }

    pub fn u_motion_method(&self, state: &State) -> Result<MotionMethod> {
        Ok(self.motion_methods(state)?.u)
    }

    pub fn udot_motion_method(&self, state: &State) -> Result<MotionMethod> {
        Ok(self.motion_methods(state)?.udot)
    }

    /// True if u is prescribed to zero, directly or by a locked q.
    pub fn is_velocity_always_zero(&self, state: &State) -> Result<bool> {
        Ok(self.motion_methods(state)?.is_velocity_always_zero())
    }

    pub fn is_acceleration_always_zero(&self, state: &State) -> Result<bool> {
        Ok(self.motion_methods(state)?.is_acceleration_always_zero())
    }

    /// Overrides this body's motion in `state` only; the tree default is untouched.
    pub fn set_motion_type(
        &self,
        state: &mut State,
        level: MotionLevel,
        method: MotionMethod,
    ) -> Result<()> {
        self.upd_instance(state)?.motion = Some(Motion::new(level, method));
        Ok(())
    }

    // Generalized coordinates

    pub fn one_q(&self, state: &State, which: usize) -> Result<f64> {
        let layout = self.check_state(state)?;
        MultibodyError::check_index("mobilizer q", which, layout.nq)?;
        Ok(state.q[layout.q_start + which])
    }

    pub fn one_u(&self, state: &State, which: usize) -> Result<f64> {
        let layout = self.check_state(state)?;
        MultibodyError::check_index("mobilizer u", which, layout.nu)?;
        Ok(state.u[layout.u_start + which])
    }

    pub fn one_qdot(&self, state: &State, which: usize) -> Result<f64> {
        let values = self.qdot_as_vector(state)?;
        MultibodyError::check_index("mobilizer qdot", which, values.len())?;
        Ok(values[which])
    }

    pub fn one_udot(&self, state: &State, which: usize) -> Result<f64> {
        let values = self.udot_as_vector(state)?;
        MultibodyError::check_index("mobilizer udot", which, values.len())?;
        Ok(values[which])
    }

    pub fn one_qdotdot(&self, state: &State, which: usize) -> Result<f64> {
        let values = self.qdotdot_as_vector(state)?;
        MultibodyError::check_index("mobilizer qdotdot", which, values.len())?;
        Ok(values[which])
    }

    /// One entry of [`tau_as_vector`](Self::tau_as_vector).
    pub fn one_tau(&self, state: &State, which: usize) -> Result<f64> {
        let layout = self.check_state(state)?;
        MultibodyError::check_index("mobilizer tau", which, layout.nu)?;
        let reaction = state
            .acceleration_cache(self.index, "one_tau")?
            .reaction_on_body;
        let h = &state.position_cache(self.index, "one_tau")?.h_g[which];
        Ok(h.dot(&reaction) - state.mobility_forces[layout.u_start + which])
    }

    pub fn q_as_vector<'s>(&self, state: &'s State) -> Result<&'s [f64]> {
        let layout = self.check_state(state)?;
        Ok(&state.q[layout.q_range()])
    }

    pub fn u_as_vector<'s>(&self, state: &'s State) -> Result<&'s [f64]> {
        let layout = self.check_state(state)?;
        Ok(&state.u[layout.u_range()])
    }

    pub fn qdot_as_vector<'s>(&self, state: &'s State) -> Result<&'s [f64]> {
        let layout = self.check_state(state)?;
        Ok(&state.qdot()?[layout.q_range()])
    }

    pub fn udot_as_vector<'s>(&self, state: &'s State) -> Result<&'s [f64]> {
        let layout = self.check_state(state)?;
        Ok(&state.udot()?[layout.u_range()])
    }

    pub fn qdotdot_as_vector<'s>(&self, state: &'s State) -> Result<&'s [f64]> {
        let layout = self.check_state(state)?;
        Ok(&state.qdotdot()?[layout.q_range()])
    }

    /// Generalized force the mobilizer must supply beyond the applied
    /// mobility forces to produce the realized motion. Zero for free
    /// mobilizers; the prescribed-motion effort otherwise.
    pub fn tau_as_vector(&self, state: &State) -> Result<Vec<f64>> {
        let layout = self.check_state(state)?;
        let reaction = state
            .acceleration_cache(self.index, "tau_as_vector")?
            .reaction_on_body;
        let h = &state.position_cache(self.index, "tau_as_vector")?.h_g;
        Ok(project_columns(h, &reaction)
            .into_iter()
            .zip(&state.mobility_forces[layout.u_range()])
            .map(|(total, applied)| total - applied)
            .collect())
    }

    pub fn set_one_q(&self, state: &mut State, which: usize, value: f64) -> Result<()> {
        let layout = self.check_state(state)?;
        MultibodyError::check_index("mobilizer q", which, layout.nq)?;
        state.upd_q()[layout.q_start + which] = value;
        Ok(())
    }

    pub fn set_one_u(&self, state: &mut State, which: usize, value: f64) -> Result<()> {
        let layout = self.check_state(state)?;
        MultibodyError::check_index("mobilizer u", which, layout.nu)?;
        state.upd_u()[layout.u_start + which] = value;
        Ok(())
    }

    pub fn set_q_from_vector(&self, state: &mut State, q: &[f64]) -> Result<()> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("mobilizer q", layout.nq, q.len())?;
        state.upd_q()[layout.q_range()].copy_from_slice(q);
        Ok(())
    }

    pub fn set_u_from_vector(&self, state: &mut State, u: &[f64]) -> Result<()> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("mobilizer u", layout.nu, u.len())?;
        state.upd_u()[layout.u_range()].copy_from_slice(u);
        Ok(())
    }

    // Fitting q and u to desired mobilizer motion

    /// Sets q so that `X_FM` matches `x_fm` as closely as the mobilizer allows.
    pub fn set_q_to_fit_transform(&self, state: &mut State, x_fm: &Transform) -> Result<()> {
        let layout = self.check_state(state)?;
        self.mobilizer()
            .set_q_to_fit_transform(x_fm, &mut state.upd_q()[layout.q_range()])
    }

    pub fn set_q_to_fit_rotation(&self, state: &mut State, r_fm: &Rotation) -> Result<()> {
        let layout = self.check_state(state)?;
        self.mobilizer()
            .set_q_to_fit_rotation(r_fm, &mut state.upd_q()[layout.q_range()])
    }

    pub fn set_q_to_fit_translation(&self, state: &mut State, p_fm: DVec3) -> Result<()> {
        let layout = self.check_state(state)?;
        self.mobilizer()
            .set_q_to_fit_translation(p_fm, &mut state.upd_q()[layout.q_range()])
    }

    /// Sets u so that `V_FM` matches `v_fm` as closely as the mobilizer
    /// allows at the current q.
    pub fn set_u_to_fit_velocity(&self, state: &mut State, v_fm: &SpatialVec) -> Result<()> {
        let layout = self.check_state(state)?;
        let q = state.q[layout.q_range()].to_vec();
        self.mobilizer()
            .set_u_to_fit_velocity(&q, v_fm, &mut state.upd_u()[layout.u_range()])
    }

    pub fn set_u_to_fit_angular_velocity(&self, state: &mut State, w_fm: DVec3) -> Result<()> {
        let layout = self.check_state(state)?;
        let q = state.q[layout.q_range()].to_vec();
        self.mobilizer()
            .set_u_to_fit_angular_velocity(&q, w_fm, &mut state.upd_u()[layout.u_range()])
    }

    pub fn set_u_to_fit_linear_velocity(&self, state: &mut State, v_fm: DVec3) -> Result<()> {
        let layout = self.check_state(state)?;
        let q = state.q[layout.q_range()].to_vec();
        self.mobilizer()
            .set_u_to_fit_linear_velocity(&q, v_fm, &mut state.upd_u()[layout.u_range()])
    }

    // Hinge matrix

    /// Column `which` of H: the velocity of B in P, about B's origin and
    /// expressed in Ground, produced by a unit value of that u.
    pub fn h_col(&self, state: &State, which: usize) -> Result<SpatialVec> {
        self.check_state(state)?;
        let h = &state.position_cache(self.index, "h_col")?.h_g;
        h.get(which).copied().ok_or(MultibodyError::IndexOutOfRange {
            what: "hinge column",
            index: which,
            len: h.len(),
        })
    }

    /// Column `which` of `H_FM`, about M's origin, expressed in F.
    pub fn h_fm_col(&self, state: &State, which: usize) -> Result<SpatialVec> {
        self.check_state(state)?;
        let h = &state.position_cache(self.index, "h_fm_col")?.h_fm;
        h.get(which).copied().ok_or(MultibodyError::IndexOutOfRange {
            what: "hinge column",
            index: which,
            len: h.len(),
        })
    }
}
