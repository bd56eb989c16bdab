//! Utility helpers: spatial algebra, math extensions, ids, small dense solves, and logging.

pub mod dense;
pub mod ids;
pub mod logging;
pub mod math;
pub mod spatial;

pub use ids::{MobilizedBodyIndex, QIndex, TopologyStamp, TreeId, UIndex};
pub use spatial::{SpatialMat, SpatialVec};
