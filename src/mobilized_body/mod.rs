//! Public handles onto the bodies of a [`MatterTree`].
//!
//! [`MobilizedBody`] is a copyable borrowed reference `(tree, index)`; it
//! cannot outlive its tree. Every query takes the [`State`] explicitly and
//! returns a value. [`MobilizedBodyMut`] carries the topology mutators.
//!
//! The operator surface is split across submodules:
//! - `access`: cached per-body quantities and per-mobilizer q/u reads and writes.
//! - `operators`: closed-form relations between two bodies or a body and Ground.
//! - `high_level`: inertia, momentum, and distance calculations with run-time branching.
//! - `forces`: helpers that accumulate forces into u-like and body-force vectors.

mod access;
mod forces;
mod high_level;
mod operators;

use std::fmt;
use std::ptr;

use crate::core::body_node::{BodyNode, Decoration, Decorations, GeometryId};
use crate::core::inertia::MassProperties;
use crate::core::mobilizer::MobilizerType;
use crate::core::motion::{Motion, MotionLevel, MotionMethod};
use crate::core::tree::MatterTree;
use crate::core::types::Transform;
use crate::error::{MultibodyError, Result};
use crate::state::{BodyLayout, State};
use crate::utils::ids::{MobilizedBodyIndex, QIndex, UIndex};

/// Borrowed handle to one body of a tree.
#[derive(Clone, Copy)]
pub struct MobilizedBody<'t> {
    tree: &'t MatterTree,
    index: MobilizedBodyIndex,
}

impl<'t> MobilizedBody<'t> {
    pub(crate) fn new(tree: &'t MatterTree, index: MobilizedBodyIndex) -> Self {
        Self { tree, index }
    }

    pub fn index(&self) -> MobilizedBodyIndex {
        self.index
    }

    pub fn tree(&self) -> &'t MatterTree {
        self.tree
    }

    pub(crate) fn node(&self) -> &'t BodyNode {
        self.tree.node(self.index.0)
    }

    pub fn name(&self) -> &'t str {
        self.node().name()
    }

    /// True only for body 0 of the tree.
    pub fn is_ground(&self) -> bool {
        self.index.is_ground()
    }

    /// Same underlying body node: same tree object and same index.
    pub fn is_same_mobilized_body(&self, other: &MobilizedBody<'_>) -> bool {
        self.is_in_same_tree(other) && self.index == other.index
    }

    pub fn is_in_same_tree(&self, other: &MobilizedBody<'_>) -> bool {
        ptr::eq(self.tree, other.tree)
    }

    pub fn parent(&self) -> Result<MobilizedBody<'t>> {
        match self.node().parent() {
            Some(p) => Ok(MobilizedBody::new(self.tree, p)),
            None => Err(MultibodyError::invalid_reference("Ground has no parent")),
        }
    }

    pub fn children(&self) -> impl Iterator<Item = MobilizedBody<'t>> + 't {
        let tree = self.tree;
        self.node()
            .children()
            .iter()
            .map(move |&c| MobilizedBody::new(tree, c))
    }

    /// Ancestor directly attached to Ground; Ground returns itself.
    pub fn base_mobilized_body(&self) -> MobilizedBody<'t> {
        let mut body = *self;
        while let Some(parent) = body.node().parent() {
            if parent.is_ground() {
                break;
            }
            body = MobilizedBody::new(self.tree, parent);
        }
        body
    }

    /// Number of mobilizers between this body and Ground; 0 for Ground.
    pub fn level_in_tree(&self) -> usize {
        self.node().level
    }

    pub fn mobilizer(&self) -> &'t MobilizerType {
        self.node().mobilizer()
    }

    pub fn num_q(&self) -> usize {
        self.node().num_q()
    }

    pub fn num_u(&self) -> usize {
        self.node().num_u()
    }

    pub fn first_q_index(&self) -> QIndex {
        QIndex(self.node().q_start)
    }

    pub fn first_u_index(&self) -> UIndex {
        UIndex(self.node().u_start)
    }

    pub fn default_mass_properties(&self) -> &'t MassProperties {
        &self.node().mass_properties
    }

    /// `X_PF`
    pub fn default_inboard_frame(&self) -> &'t Transform {
        &self.node().inboard_frame
    }

    /// `X_BM`
    pub fn default_outboard_frame(&self) -> &'t Transform {
        &self.node().outboard_frame
    }

    pub fn default_q(&self) -> &'t [f64] {
        &self.node().default_q
    }

    pub fn motion(&self) -> Option<&'t Motion> {
        self.node().motion.as_ref()
    }

    pub fn has_motion(&self) -> bool {
        self.node().motion.is_some()
    }

    pub fn decorations(&self) -> &'t Decorations {
        &self.node().decorations
    }

    /// Checks that `state` was built for this tree's current topology and
    /// returns this body's slot layout in it.
    pub(crate) fn check_state(&self, state: &State) -> Result<BodyLayout> {
        self.tree.check_state(state)?;
        state.layout_of(self.index)
    }

    pub(crate) fn check_same_tree(&self, other: &MobilizedBody<'_>) -> Result<()> {
        if self.is_in_same_tree(other) {
            Ok(())
        } else {
            Err(MultibodyError::invalid_reference(format!(
                "bodies {} and {} belong to different trees",
                self.index, other.index
            )))
        }
    }
}

impl PartialEq for MobilizedBody<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.is_same_mobilized_body(other)
    }
}

impl Eq for MobilizedBody<'_> {}

impl fmt::Debug for MobilizedBody<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MobilizedBody")
            .field("tree", &self.tree.id())
            .field("index", &self.index)
            .field("name", &self.name())
            .finish()
    }
}

/// Handle with exclusive access to the tree, for topology changes.
///
/// Changing mass properties, default frames, default q, or the attached
/// motion bumps the tree's topology version; every existing State must then
/// be re-realized. Decorations are stored only and leave the version alone.
pub struct MobilizedBodyMut<'t> {
    tree: &'t mut MatterTree,
    index: MobilizedBodyIndex,
}

impl<'t> MobilizedBodyMut<'t> {
    pub(crate) fn new(tree: &'t mut MatterTree, index: MobilizedBodyIndex) -> Self {
        Self { tree, index }
    }

    pub fn index(&self) -> MobilizedBodyIndex {
        self.index
    }

    pub fn as_ref(&self) -> MobilizedBody<'_> {
        MobilizedBody::new(self.tree, self.index)
    }

    fn node_mut(&mut self) -> Result<&mut BodyNode> {
        if self.index.is_ground() {
            return Err(MultibodyError::invalid_reference("Ground cannot be modified"));
        }
        Ok(self.tree.node_mut(self.index.0))
    }

    fn modify(&mut self, f: impl FnOnce(&mut BodyNode)) -> Result<()> {
        f(self.node_mut()?);
        self.tree.invalidate_topology();
        Ok(())
    }

    pub fn set_default_mass_properties(&mut self, mass_properties: MassProperties) -> Result<()> {
        self.modify(|n| n.mass_properties = mass_properties)
    }

    /// Replaces the body: its mass properties and its body-frame decorations.
    pub fn set_body(
        &mut self,
        mass_properties: MassProperties,
        decorations: Vec<Decoration>,
    ) -> Result<()> {
        self.modify(|n| {
            n.mass_properties = mass_properties;
            n.decorations.body = decorations;
        })
    }

    pub fn set_default_inboard_frame(&mut self, x_pf: Transform) -> Result<()> {
        self.modify(|n| n.inboard_frame = x_pf)
    }

    pub fn set_default_outboard_frame(&mut self, x_bm: Transform) -> Result<()> {
        self.modify(|n| n.outboard_frame = x_bm)
    }

    pub fn set_default_q(&mut self, q: &[f64]) -> Result<()> {
        MultibodyError::check_len("default q", self.node_mut()?.num_q(), q.len())?;
        self.modify(|n| n.default_q = q.to_vec())
    }

    pub fn adopt_motion(&mut self, motion: Motion) -> Result<()> {
        self.modify(|n| n.motion = Some(motion))
    }

    pub fn clear_motion(&mut self) -> Result<()> {
        self.modify(|n| n.motion = None)
    }

    pub fn set_default_motion_type(
        &mut self,
        level: MotionLevel,
        method: MotionMethod,
    ) -> Result<()> {
        self.adopt_motion(Motion::new(level, method))
    }

    /// Geometry fixed on the body frame; returns its slot.
    pub fn add_body_decoration(&mut self, x_bd: Transform, geometry: GeometryId) -> usize {
        let decorations = &mut self.tree.node_mut(self.index.0).decorations.body;
        decorations.push(Decoration { transform: x_bd, geometry });
        decorations.len() - 1
    }

    /// Geometry fixed on the inboard frame F.
    pub fn add_inboard_decoration(&mut self, x_fd: Transform, geometry: GeometryId) -> usize {
        let decorations = &mut self.tree.node_mut(self.index.0).decorations.inboard;
        decorations.push(Decoration { transform: x_fd, geometry });
        decorations.len() - 1
    }

    /// Geometry fixed on the outboard frame M.
    pub fn add_outboard_decoration(&mut self, x_md: Transform, geometry: GeometryId) -> usize {
        let decorations = &mut self.tree.node_mut(self.index.0).decorations.outboard;
        decorations.push(Decoration { transform: x_md, geometry });
        decorations.len() - 1
    }
}
