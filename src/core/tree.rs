use log::{debug, trace};

use super::body_node::BodyNode;
use super::mobilizer::MobilizerType;
use super::motion::{MotionMethod, MotionMethods};
use crate::config::TreeConfig;
use crate::dynamics::ABASolver;
use crate::error::{MultibodyError, Result};
use crate::mobilized_body::{MobilizedBody, MobilizedBodyMut};
use crate::state::{BodyLayout, PositionCache, Stage, State, VelocityCache};
use crate::utils::ids::{MobilizedBodyIndex, TopologyStamp, TreeId};
use crate::utils::logging::{warn_topology_rebuild, ScopedTimer};

/// Owns every body node of one multibody tree and realizes States for it.
///
/// Nodes live in a single arena in topological order: Ground is index 0 and
/// every parent precedes its children. Structural changes bump the topology
/// version; States stamped with an older version must be re-realized.
#[derive(Debug)]
pub struct MatterTree {
    id: TreeId,
    version: u32,
    config: TreeConfig,
    nodes: Vec<BodyNode>,
    nq: usize,
    nu: usize,
}

impl Default for MatterTree {
    fn default() -> Self {
        Self::new(TreeConfig::default())
    }
}

impl MatterTree {
    pub fn new(config: TreeConfig) -> Self {
        Self {
            id: TreeId::next(),
            version: 1,
            config,
            nodes: vec![BodyNode::ground()],
            nq: 0,
            nu: 0,
        }
    }

    pub fn id(&self) -> TreeId {
        self.id
    }

    pub fn topology_version(&self) -> u32 {
        self.version
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: TreeConfig) {
        self.config = config;
        self.invalidate_topology();
    }

    pub fn num_bodies(&self) -> usize {
        self.nodes.len()
    }

    pub fn nq(&self) -> usize {
        self.nq
    }

    pub fn nu(&self) -> usize {
        self.nu
    }

    /// Appends a body under its (already present) parent and allocates its
    /// slots in the tree-wide q and u vectors.
    pub fn add_body(&mut self, mut node: BodyNode) -> Result<MobilizedBodyIndex> {
        let parent = node.parent.ok_or_else(|| {
            MultibodyError::invalid_reference(format!("body '{}' has no parent", node.name))
        })?;
        if parent.0 >= self.nodes.len() {
            return Err(MultibodyError::invalid_reference(format!(
                "parent {parent} of body '{}' is not in the tree",
                node.name
            )));
        }
        if matches!(node.mobilizer, MobilizerType::Ground) {
            return Err(MultibodyError::invalid_reference(
                "only body 0 may use the Ground mobilizer",
            ));
        }
        MultibodyError::check_len("default q", node.num_q(), node.default_q.len())?;

        let index = MobilizedBodyIndex(self.nodes.len());
        node.children.clear();
        node.level = self.nodes[parent.0].level + 1;
        node.q_start = self.nq;
        node.u_start = self.nu;
        self.nq += node.num_q();
        self.nu += node.num_u();
        debug!(
            "added body '{}' {index} under {parent} via {} (nq={}, nu={})",
            node.name,
            node.mobilizer.name(),
            node.num_q(),
            node.num_u()
        );
        self.nodes[parent.0].children.push(index);
        self.nodes.push(node);
        self.invalidate_topology();
        Ok(index)
    }

    /// Adds a copy of `body`'s definition (mobilizer, frames, mass properties,
    /// motion, default q) as a new child of `new_parent`.
    pub fn clone_for_new_parent(
        &mut self,
        body: MobilizedBodyIndex,
        new_parent: MobilizedBodyIndex,
    ) -> Result<MobilizedBodyIndex> {
        if body.is_ground() {
            return Err(MultibodyError::invalid_reference("Ground cannot be cloned"));
        }
        self.check_body(body)?;
        let mut copy = self.nodes[body.0].clone();
        copy.parent = Some(new_parent);
        self.add_body(copy)
    }

    pub(crate) fn check_body(&self, body: MobilizedBodyIndex) -> Result<()> {
        if body.0 < self.nodes.len() {
            Ok(())
        } else {
            Err(MultibodyError::invalid_reference(format!(
                "body {body} is not in tree (has {} bodies)",
                self.nodes.len()
            )))
        }
    }

    pub(crate) fn node(&self, index: usize) -> &BodyNode {
        &self.nodes[index]
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut BodyNode {
        &mut self.nodes[index]
    }

    pub(crate) fn invalidate_topology(&mut self) {
        self.version = self.version.wrapping_add(1);
        debug!("tree topology now at version {}", self.version);
    }

    pub fn ground(&self) -> MobilizedBody<'_> {
        MobilizedBody::new(self, MobilizedBodyIndex::GROUND)
    }

    pub fn mobilized_body(&self, index: MobilizedBodyIndex) -> Result<MobilizedBody<'_>> {
        self.check_body(index)?;
        Ok(MobilizedBody::new(self, index))
    }

    pub fn mobilized_body_mut(
        &mut self,
        index: MobilizedBodyIndex,
    ) -> Result<MobilizedBodyMut<'_>> {
        self.check_body(index)?;
        Ok(MobilizedBodyMut::new(self, index))
    }

    pub fn bodies(&self) -> impl Iterator<Item = MobilizedBody<'_>> + '_ {
        (0..self.nodes.len()).map(move |i| MobilizedBody::new(self, MobilizedBodyIndex(i)))
    }

    fn layout(&self) -> Vec<BodyLayout> {
        self.nodes
            .iter()
            .map(|n| BodyLayout {
                q_start: n.q_start,
                nq: n.num_q(),
                u_start: n.u_start,
                nu: n.num_u(),
            })
            .collect()
    }

    /// Fresh State at Model stage: default q, zero u, default instance variables.
    pub fn create_state(&self) -> State {
        let mut q = Vec::with_capacity(self.nq);
        for node in &self.nodes {
            q.extend_from_slice(&node.default_q);
        }
        let instance = self.nodes.iter().map(BodyNode::default_instance).collect();
        State::new(
            TopologyStamp::new(self.id, self.version),
            q,
            self.nu,
            self.layout(),
            instance,
        )
    }

    /// Verifies a State belongs to this tree and matches its current topology.
    pub fn check_state(&self, state: &State) -> Result<()> {
        let stamp = state.topology_stamp();
        if stamp.tree != self.id {
            return Err(MultibodyError::invalid_reference("state was created by a different tree"));
        }
        if stamp.version != self.version {
            return Err(MultibodyError::StaleTopology {
                state: stamp.version,
                tree: self.version,
            });
        }
        Ok(())
    }

    /// Realizes `state` through `stage`, one stage at a time. Stages already
    /// realized are not recomputed. A State built for an older topology of
    /// this tree is rebuilt first, keeping q and u of bodies whose layout
    /// still matches.
    pub fn realize(&self, state: &mut State, stage: Stage) -> Result<()> {
        match self.check_state(state) {
            Ok(()) => {}
            Err(MultibodyError::StaleTopology { .. }) => self.rebuild_state(state),
            Err(e) => return Err(e),
        }
        while state.stage() < stage {
            let Some(next) = state.stage().next() else { break };
            self.realize_stage(state, next)?;
            state.advance_to(next);
        }
        Ok(())
    }

    fn rebuild_state(&self, state: &mut State) {
        let mut fresh = self.create_state();
        let mut preserved = 0;
        for (i, old) in state.layout.iter().enumerate().take(fresh.layout.len()) {
            let new = fresh.layout[i];
            if old.nq == new.nq && old.nu == new.nu {
                fresh.q[new.q_range()].copy_from_slice(&state.q[old.q_range()]);
                fresh.u[new.u_range()].copy_from_slice(&state.u[old.u_range()]);
                preserved += 1;
            }
        }
        fresh.time = state.time;
        let discarded = state.state_only_inputs();
        warn_topology_rebuild(
            state.stamp.version,
            self.version,
            preserved,
            fresh.layout.len(),
            &discarded,
        );
        *state = fresh;
    }

    fn realize_stage(&self, state: &mut State, stage: Stage) -> Result<()> {
        let _timer = ScopedTimer::new(stage.name(), self.nodes.len());
        match stage {
            Stage::Empty | Stage::Topology | Stage::Model | Stage::Time => Ok(()),
            Stage::Instance => self.realize_instance(state),
            Stage::Position => {
                self.realize_positions(state);
                Ok(())
            }
            Stage::Velocity => self.realize_velocities(state),
            Stage::Dynamics => {
                state.cache.dynamics = ABASolver::articulate(self, state)?;
                Ok(())
            }
            Stage::Acceleration => ABASolver::accelerate(self, state),
        }
    }

    fn realize_instance(&self, state: &State) -> Result<()> {
        for (i, inst) in state.instance.iter().enumerate().skip(1) {
            let mp = &inst.mass_properties;
            if !(mp.mass() >= 0.0) || mp.is_infinite() {
                return Err(MultibodyError::invalid_mass_properties(format!(
                    "body {} has mass {}",
                    MobilizedBodyIndex(i),
                    mp.mass()
                )));
            }
        }
        trace!("instance variables validated");
        Ok(())
    }

    fn realize_positions(&self, state: &mut State) {
        let mut pos = Vec::with_capacity(self.nodes.len());
        pos.push(PositionCache::ground());
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            let layout = state.layout[i];
            let methods = MotionMethods::from_motion(state.instance[i].motion.as_ref());
            if methods.q == MotionMethod::Zero {
                state.q[layout.q_range()].copy_from_slice(&node.mobilizer.default_q());
            }
            let parent = node.parent.map_or(0, |p| p.0);
            let cache = node.realize_position(
                &state.q[layout.q_range()],
                &state.instance[i],
                &pos[parent],
            );
            pos.push(cache);
        }
        state.cache.position = pos;
    }

    fn realize_velocities(&self, state: &mut State) -> Result<()> {
        let mut vel = Vec::with_capacity(self.nodes.len());
        vel.push(VelocityCache::default());
        let mut qdot = vec![0.0; state.q.len()];
        for (i, node) in self.nodes.iter().enumerate().skip(1) {
            let layout = state.layout[i];
            let methods = MotionMethods::from_motion(state.instance[i].motion.as_ref());
            if methods.u == MotionMethod::Zero {
                state.u[layout.u_range()].iter_mut().for_each(|x| *x = 0.0);
            }
            let parent = node.parent.map_or(0, |p| p.0);
            let cache = node.realize_velocity(
                &state.q[layout.q_range()],
                &state.u[layout.u_range()],
                &state.cache.position[i],
                &state.cache.position[parent],
                &vel[parent],
                &mut qdot[layout.q_range()],
            )?;
            vel.push(cache);
        }
        state.cache.velocity = vel;
        state.cache.qdot = qdot;
        Ok(())
    }
}
