//! mobod – mobilized-body kinematics and staged multibody dynamics for Rust.
//!
//! A [`MatterTree`] owns a tree of bodies connected to their parents by
//! mobilizers. All mutable data lives in a [`State`], which the tree
//! realizes stage by stage (Position, Velocity, Dynamics, Acceleration).
//! [`MobilizedBody`] handles then read realized quantities and combine them
//! into relative poses, velocities, accelerations, momenta, and distances.
//!
//! ```no_run
//! use mobod::{BodyNode, MatterTree, MobilizedBodyIndex, MobilizerType, Stage};
//!
//! let mut tree = MatterTree::default();
//! let arm = tree.add_body(BodyNode::new("arm", MobilizedBodyIndex::GROUND, MobilizerType::Pin))?;
//! let mut state = tree.create_state();
//! state.set_u(&[1.0])?;
//! tree.realize(&mut state, Stage::Acceleration)?;
//! let pose = tree.mobilized_body(arm)?.body_transform(&state)?;
//! # let _ = pose;
//! # Ok::<(), mobod::MultibodyError>(())
//! ```

pub mod config;
pub mod core;
mod dynamics;
pub mod error;
pub mod mobilized_body;
pub mod state;
pub mod utils;

pub use glam::{DMat3, DQuat, DVec3};

pub use config::TreeConfig;
pub use self::core::{
    BodyNode, CustomMobilizer, Decoration, Decorations, GeometryId, Inertia, MassProperties,
    MatterTree, MobilizerType, Motion, MotionLevel, MotionMethod, Rotation, Transform,
};
pub use error::{MultibodyError, Result};
pub use mobilized_body::{MobilizedBody, MobilizedBodyMut};
pub use state::{Stage, State};
pub use utils::{MobilizedBodyIndex, QIndex, SpatialMat, SpatialVec, TopologyStamp, TreeId, UIndex};
