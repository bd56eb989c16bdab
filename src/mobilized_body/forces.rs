//! Accumulating forces into caller-owned tree-wide vectors.
//!
//! Mobility forces are u-like (`nu` entries); body forces hold one spatial
//! force per body, expressed in Ground with the moment about the body origin.
//! The vectors are installed with `State::set_mobility_forces` and
//! `State::set_body_forces`.

use glam::DVec3;

use super::MobilizedBody;
use crate::error::{MultibodyError, Result};
use crate::state::{Stage, State};
use crate::utils::spatial::SpatialVec;

impl<'t> MobilizedBody<'t> {
    /// This mobilizer's slice of a q-like vector.
    pub fn q_partition<'v>(&self, state: &State, all_q: &'v [f64]) -> Result<&'v [f64]> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("q-like vector", state.nq(), all_q.len())?;
        Ok(&all_q[layout.q_range()])
    }

    pub fn upd_q_partition<'v>(
        &self,
        state: &State,
        all_q: &'v mut [f64],
    ) -> Result<&'v mut [f64]> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("q-like vector", state.nq(), all_q.len())?;
        Ok(&mut all_q[layout.q_range()])
    }

    /// This mobilizer's slice of a u-like vector.
    pub fn u_partition<'v>(&self, state: &State, all_u: &'v [f64]) -> Result<&'v [f64]> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("u-like vector", state.nu(), all_u.len())?;
        Ok(&all_u[layout.u_range()])
    }

    pub fn upd_u_partition<'v>(
        &self,
        state: &State,
        all_u: &'v mut [f64],
    ) -> Result<&'v mut [f64]> {
        let layout = self.check_state(state)?;
        MultibodyError::check_len("u-like vector", state.nu(), all_u.len())?;
        Ok(&mut all_u[layout.u_range()])
    }

    /// Adds `force` to this mobilizer's `which`-th generalized force.
    pub fn apply_one_mobility_force(
        &self,
        state: &State,
        which: usize,
        force: f64,
        mobility_forces: &mut [f64],
    ) -> Result<()> {
        MultibodyError::check_index("mobilizer u", which, self.num_u())?;
        self.upd_u_partition(state, mobility_forces)?[which] += force;
        Ok(())
    }

    /// Maps a generalized force acting on this mobilizer's q to the
    /// equivalent force on its u. Needs Position for the current q.
    pub fn convert_q_force_to_u_force(
        &self,
        state: &State,
        f_q: &[f64],
        f_u: &mut [f64],
    ) -> Result<()> {
        let layout = self.check_state(state)?;
        state.require(Stage::Position, "convert_q_force_to_u_force")?;
        MultibodyError::check_len("q force", layout.nq, f_q.len())?;
        MultibodyError::check_len("u force", layout.nu, f_u.len())?;
        self.mobilizer()
            .multiply_by_n_transpose(&state.q[layout.q_range()], f_q, f_u)
    }

    fn body_force_slot<'v>(
        &self,
        state: &State,
        body_forces: &'v mut [SpatialVec],
    ) -> Result<&'v mut SpatialVec> {
        self.check_state(state)?;
        MultibodyError::check_len("body forces", state.num_bodies(), body_forces.len())?;
        Ok(&mut body_forces[self.index.0])
    }

    /// Adds a spatial force (moment about B's origin, force), in Ground.
    pub fn apply_body_force(
        &self,
        state: &State,
        spatial_force_g: SpatialVec,
        body_forces: &mut [SpatialVec],
    ) -> Result<()> {
        *self.body_force_slot(state, body_forces)? += spatial_force_g;
        Ok(())
    }

    /// Adds a pure torque, in Ground.
    pub fn apply_body_torque(
        &self,
        state: &State,
        torque_g: DVec3,
        body_forces: &mut [SpatialVec],
    ) -> Result<()> {
        self.apply_body_force(state, SpatialVec::new(torque_g, DVec3::ZERO), body_forces)
    }

    /// Adds `force_g` (in Ground) acting at `station_b`; the moment about
    /// B's origin follows from the station's current location, so Position
    /// must be realized.
    pub fn apply_force_to_body_point(
        &self,
        state: &State,
        station_b: DVec3,
        force_g: DVec3,
        body_forces: &mut [SpatialVec],
    ) -> Result<()> {
        let r = self.express_vector_in_ground_frame(state, station_b)?;
        self.apply_body_force(state, SpatialVec::new(r.cross(force_g), force_g), body_forces)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::TreeConfig;
    use crate::core::body_node::BodyNode;
    use crate::core::mobilizer::MobilizerType;
    use crate::core::tree::MatterTree;
    use crate::state::Stage;
    use crate::utils::ids::MobilizedBodyIndex;
    use crate::utils::spatial::SpatialVec;
    use glam::DVec3;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn point_force_produces_moment_about_origin() {
        let mut tree = MatterTree::new(TreeConfig::zero_gravity());
        let idx = tree
            .add_body(BodyNode::new("b", MobilizedBodyIndex::GROUND, MobilizerType::Pin))
            .unwrap();
        let mut state = tree.create_state();
        state.set_q(&[FRAC_PI_2]).unwrap();
        tree.realize(&mut state, Stage::Position).unwrap();

        let b = tree.mobilized_body(idx).unwrap();
        let mut forces = vec![SpatialVec::ZERO; state.num_bodies()];
        // Station on B's x axis sits on Ground's y axis after the quarter turn.
        b.apply_force_to_body_point(&state, DVec3::X, DVec3::X, &mut forces)
            .unwrap();
        b.apply_body_torque(&state, DVec3::Z, &mut forces).unwrap();
        assert!(forces[1].ang.abs_diff_eq(DVec3::new(0.0, 0.0, 0.0), 1e-12));
        assert!(forces[1].lin.abs_diff_eq(DVec3::X, 1e-12));
        state.set_body_forces(&forces).unwrap();
        assert_eq!(state.stage(), Stage::Position);
    }

    #[test]
    fn mobility_force_lands_in_own_partition() {
        let mut tree = MatterTree::default();
        let a = tree
            .add_body(BodyNode::new("a", MobilizedBodyIndex::GROUND, MobilizerType::Planar))
            .unwrap();
        let b = tree.add_body(BodyNode::new("b", a, MobilizerType::Pin)).unwrap();
        let state = tree.create_state();
        let mut tau = vec![0.0; state.nu()];
        let body = tree.mobilized_body(b).unwrap();
        body.apply_one_mobility_force(&state, 0, 2.5, &mut tau).unwrap();
        assert_eq!(tau, vec![0.0, 0.0, 0.0, 2.5]);
        assert!(body.apply_one_mobility_force(&state, 1, 1.0, &mut tau).is_err());
        assert_eq!(body.u_partition(&state, &tau).unwrap(), &[2.5]);
    }
}
