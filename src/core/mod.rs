//! Core types describing the tree: frames, mass properties, mobilizers,
//! motion, body nodes, and the tree that owns them.

pub mod body_node;
pub mod inertia;
pub mod mobilizer;
pub mod motion;
pub mod tree;
pub mod types;

pub use body_node::{BodyNode, Decoration, Decorations, GeometryId};
pub use inertia::{Inertia, MassProperties};
pub use mobilizer::{CustomMobilizer, MobilizerType};
pub use motion::{Motion, MotionLevel, MotionMethod, MotionMethods};
pub use tree::MatterTree;
pub use types::{Rotation, Transform};
