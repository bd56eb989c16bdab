//! Staged State: generalized coordinates, instance variables, force inputs,
//! and the per-stage realization cache.
//!
//! A State is produced by [`MatterTree::create_state`](crate::core::tree::MatterTree::create_state)
//! and only ever advanced by the tree's `realize`. Every mutator drops the
//! realized stage below the lowest stage that depends on what changed, for
//! the whole tree at once.

pub mod cache;
pub mod stage;

pub use cache::{AccelerationCache, DynamicsCache, PositionCache, VelocityCache};
pub use stage::Stage;

use log::debug;

use crate::core::inertia::MassProperties;
use crate::core::motion::Motion;
use crate::core::types::Transform;
use crate::error::{MultibodyError, Result};
use crate::utils::ids::{MobilizedBodyIndex, QIndex, TopologyStamp, UIndex};
use crate::utils::spatial::SpatialVec;

/// Where one body's coordinates live in the tree-wide q and u vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodyLayout {
    pub q_start: usize,
    pub nq: usize,
    pub u_start: usize,
    pub nu: usize,
}

impl BodyLayout {
    pub fn q_range(&self) -> std::ops::Range<usize> {
        self.q_start..self.q_start + self.nq
    }

    pub fn u_range(&self) -> std::ops::Range<usize> {
        self.u_start..self.u_start + self.nu
    }
}

/// Instance-stage variables of one body.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceVars {
    pub mass_properties: MassProperties,
    /// `X_PF`
    pub inboard_frame: Transform,
    /// `X_BM`
    pub outboard_frame: Transform,
    pub motion: Option<Motion>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StateCache {
    pub position: Vec<PositionCache>,
    pub velocity: Vec<VelocityCache>,
    pub qdot: Vec<f64>,
    pub dynamics: Vec<DynamicsCache>,
    pub acceleration: Vec<AccelerationCache>,
    pub udot: Vec<f64>,
    pub qdotdot: Vec<f64>,
}

/// Mutable simulation state for one [`MatterTree`](crate::core::tree::MatterTree).
#[derive(Debug, Clone)]
pub struct State {
    pub(crate) stamp: TopologyStamp,
    pub(crate) stage: Stage,
    pub(crate) time: f64,
    pub(crate) q: Vec<f64>,
    pub(crate) u: Vec<f64>,
    pub(crate) layout: Vec<BodyLayout>,
    pub(crate) instance: Vec<InstanceVars>,
    pub(crate) mobility_forces: Vec<f64>,
    pub(crate) body_forces: Vec<SpatialVec>,
    pub(crate) prescribed_udot: Vec<f64>,
    /// Set once any instance variable is changed away from the tree default.
    pub(crate) instance_overridden: bool,
    pub(crate) cache: StateCache,
}

impl State {
    pub(crate) fn new(
        stamp: TopologyStamp,
        q: Vec<f64>,
        nu: usize,
        layout: Vec<BodyLayout>,
        instance: Vec<InstanceVars>,
    ) -> Self {
        let nb = layout.len();
        Self {
            stamp,
            stage: Stage::Model,
            time: 0.0,
            q,
            u: vec![0.0; nu],
            layout,
            instance,
            mobility_forces: vec![0.0; nu],
            body_forces: vec![SpatialVec::ZERO; nb],
            prescribed_udot: vec![0.0; nu],
            instance_overridden: false,
            cache: StateCache::default(),
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn topology_stamp(&self) -> TopologyStamp {
        self.stamp
    }

    pub fn num_bodies(&self) -> usize {
        self.layout.len()
    }

    pub fn nq(&self) -> usize {
        self.q.len()
    }

    pub fn nu(&self) -> usize {
        self.u.len()
    }

    /// Drops the realized stage so that `stage` and everything above it are invalid.
    pub fn invalidate(&mut self, stage: Stage) {
        if self.stage >= stage {
            let new_stage = stage.prev();
            debug!("state invalidated: {} -> {}", self.stage, new_stage);
            self.stage = new_stage;
        }
    }

    /// Fails with a stage violation unless the State is realized to at least `required`.
    pub fn require(&self, required: Stage, operation: &'static str) -> Result<()> {
        if self.stage >= required {
            Ok(())
        } else {
            Err(MultibodyError::StageViolation {
                operation,
                required,
                current: self.stage,
            })
        }
    }

    pub(crate) fn advance_to(&mut self, stage: Stage) {
        self.stage = stage;
    }

    // Time

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn set_time(&mut self, t: f64) {
        self.invalidate(Stage::Time);
        self.time = t;
    }

    // Generalized coordinates and speeds

    pub fn q(&self) -> &[f64] {
        &self.q
    }

    pub fn u(&self) -> &[f64] {
        &self.u
    }

    /// Writable q; invalidates Position and above.
    pub fn upd_q(&mut self) -> &mut [f64] {
        self.invalidate(Stage::Position);
        &mut self.q
    }

    /// Writable u; invalidates Velocity and above.
    pub fn upd_u(&mut self) -> &mut [f64] {
        self.invalidate(Stage::Velocity);
        &mut self.u
    }

    pub fn set_q(&mut self, q: &[f64]) -> Result<()> {
        MultibodyError::check_len("q", self.q.len(), q.len())?;
        self.upd_q().copy_from_slice(q);
        Ok(())
    }

    pub fn set_u(&mut self, u: &[f64]) -> Result<()> {
        MultibodyError::check_len("u", self.u.len(), u.len())?;
        self.upd_u().copy_from_slice(u);
        Ok(())
    }

    pub fn q_at(&self, index: QIndex) -> Result<f64> {
        MultibodyError::check_index("q", index.0, self.q.len())?;
        Ok(self.q[index.0])
    }

    pub fn u_at(&self, index: UIndex) -> Result<f64> {
        MultibodyError::check_index("u", index.0, self.u.len())?;
        Ok(self.u[index.0])
    }

    pub fn qdot(&self) -> Result<&[f64]> {
        self.require(Stage::Velocity, "qdot")?;
        Ok(&self.cache.qdot)
    }

    pub fn udot(&self) -> Result<&[f64]> {
        self.require(Stage::Acceleration, "udot")?;
        Ok(&self.cache.udot)
    }

    pub fn qdotdot(&self) -> Result<&[f64]> {
        self.require(Stage::Acceleration, "qdotdot")?;
        Ok(&self.cache.qdotdot)
    }

    // Dynamics-stage inputs

    pub fn mobility_forces(&self) -> &[f64] {
        &self.mobility_forces
    }

    pub fn upd_mobility_forces(&mut self) -> &mut [f64] {
        self.invalidate(Stage::Dynamics);
        &mut self.mobility_forces
    }

    /// Applied spatial forces, one per body, about the body origin in Ground.
    pub fn body_forces(&self) -> &[SpatialVec] {
        &self.body_forces
    }

    pub fn upd_body_forces(&mut self) -> &mut [SpatialVec] {
        self.invalidate(Stage::Dynamics);
        &mut self.body_forces
    }

    pub fn set_mobility_forces(&mut self, forces: &[f64]) -> Result<()> {
        MultibodyError::check_len("mobility forces", self.mobility_forces.len(), forces.len())?;
        self.upd_mobility_forces().copy_from_slice(forces);
        Ok(())
    }

    pub fn set_body_forces(&mut self, forces: &[SpatialVec]) -> Result<()> {
        MultibodyError::check_len("body forces", self.body_forces.len(), forces.len())?;
        self.upd_body_forces().copy_from_slice(forces);
        Ok(())
    }

    pub fn prescribed_udot(&self) -> &[f64] {
        &self.prescribed_udot
    }

    pub fn upd_prescribed_udot(&mut self) -> &mut [f64] {
        self.invalidate(Stage::Dynamics);
        &mut self.prescribed_udot
    }

    /// Zeroes every applied force input.
    pub fn clear_forces(&mut self) {
        self.invalidate(Stage::Dynamics);
        self.mobility_forces.iter_mut().for_each(|f| *f = 0.0);
        self.body_forces.iter_mut().for_each(|f| *f = SpatialVec::ZERO);
    }

    /// Inputs that exist only in this State and would be lost if it were
    /// rebuilt from the tree defaults.
    pub(crate) fn state_only_inputs(&self) -> Vec<&'static str> {
        let mut inputs = Vec::new();
        if self.instance_overridden {
            inputs.push("instance overrides");
        }
        if self.mobility_forces.iter().any(|&f| f != 0.0) {
            inputs.push("mobility forces");
        }
        if self.body_forces.iter().any(|f| *f != SpatialVec::ZERO) {
            inputs.push("body forces");
        }
        if self.prescribed_udot.iter().any(|&a| a != 0.0) {
            inputs.push("prescribed udot");
        }
        inputs
    }

    // Per-body access used by the tree and handles

    pub(crate) fn layout_of(&self, body: MobilizedBodyIndex) -> Result<BodyLayout> {
        self.layout
            .get(body.0)
            .copied()
            .ok_or_else(|| MultibodyError::invalid_reference(format!("no body {body} in state")))
    }

    pub(crate) fn instance_of(&self, body: MobilizedBodyIndex) -> Result<&InstanceVars> {
        self.instance
            .get(body.0)
            .ok_or_else(|| MultibodyError::invalid_reference(format!("no body {body} in state")))
    }

    /// Writable instance variables; invalidates Instance and above.
    pub(crate) fn upd_instance_of(
        &mut self,
        body: MobilizedBodyIndex,
    ) -> Result<&mut InstanceVars> {
        if body.0 >= self.instance.len() {
            return Err(MultibodyError::invalid_reference(format!("no body {body} in state")));
        }
        self.invalidate(Stage::Instance);
        self.instance_overridden = true;
        Ok(&mut self.instance[body.0])
    }

    pub(crate) fn position_cache(
        &self,
        body: MobilizedBodyIndex,
        op: &'static str,
    ) -> Result<&PositionCache> {
        self.require(Stage::Position, op)?;
        self.cache
            .position
            .get(body.0)
            .ok_or_else(|| MultibodyError::invalid_reference(format!("no body {body} in state")))
    }

    pub(crate) fn velocity_cache(
        &self,
        body: MobilizedBodyIndex,
        op: &'static str,
    ) -> Result<&VelocityCache> {
        self.require(Stage::Velocity, op)?;
        self.cache
            .velocity
            .get(body.0)
            .ok_or_else(|| MultibodyError::invalid_reference(format!("no body {body} in state")))
    }

    pub(crate) fn acceleration_cache(
        &self,
        body: MobilizedBodyIndex,
        op: &'static str,
    ) -> Result<&AccelerationCache> {
        self.require(Stage::Acceleration, op)?;
        self.cache
            .acceleration
            .get(body.0)
            .ok_or_else(|| MultibodyError::invalid_reference(format!("no body {body} in state")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ids::TreeId;

    fn single_pin_state() -> State {
        let layout = vec![
            BodyLayout { q_start: 0, nq: 0, u_start: 0, nu: 0 },
            BodyLayout { q_start: 0, nq: 1, u_start: 0, nu: 1 },
        ];
        let inst = InstanceVars {
            mass_properties: MassProperties::default(),
            inboard_frame: Transform::IDENTITY,
            outboard_frame: Transform::IDENTITY,
            motion: None,
        };
        State::new(
            TopologyStamp::new(TreeId::next(), 1),
            vec![0.0],
            1,
            layout,
            vec![inst.clone(), inst],
        )
    }

    #[test]
    fn setting_q_drops_below_position() {
        let mut s = single_pin_state();
        s.advance_to(Stage::Acceleration);
        s.upd_q()[0] = 1.0;
        assert_eq!(s.stage(), Stage::Time);
        assert!(matches!(
            s.require(Stage::Position, "test"),
            Err(MultibodyError::StageViolation {
                required: Stage::Position,
                current: Stage::Time,
                ..
            })
        ));
    }

    #[test]
    fn setting_u_keeps_position() {
        let mut s = single_pin_state();
        s.advance_to(Stage::Dynamics);
        s.set_u(&[2.0]).unwrap();
        assert_eq!(s.stage(), Stage::Position);
    }

    #[test]
    fn invalidation_never_raises_the_stage() {
        let mut s = single_pin_state();
        assert_eq!(s.stage(), Stage::Model);
        s.upd_body_forces()[1] = SpatialVec::ZERO;
        assert_eq!(s.stage(), Stage::Model);
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut s = single_pin_state();
        assert!(matches!(s.set_q(&[0.0, 1.0]), Err(MultibodyError::DimensionMismatch { .. })));
    }
}
