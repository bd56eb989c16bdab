use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Position of a mobilized body in its tree. Ground is always index 0 and a
/// parent's index is always smaller than any of its children's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct MobilizedBodyIndex(pub usize);

impl MobilizedBodyIndex {
    pub const GROUND: Self = Self(0);

    pub fn index(&self) -> usize {
        self.0
    }

    pub fn is_ground(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for MobilizedBodyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<MobilizedBodyIndex> for usize {
    fn from(value: MobilizedBodyIndex) -> Self {
        value.0
    }
}

/// Index of a generalized coordinate in the tree-wide q vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct QIndex(pub usize);

/// Index of a generalized speed in the tree-wide u vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct UIndex(pub usize);

/// Process-unique identity of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeId(u64);

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

impl TreeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Tree identity plus the topology generation a State was built against.
/// A mismatch in either part makes the stamped State unusable for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopologyStamp {
    pub tree: TreeId,
    pub version: u32,
}

impl TopologyStamp {
    pub fn new(tree: TreeId, version: u32) -> Self {
        Self { tree, version }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_ids_are_unique() {
        let a = TreeId::next();
        let b = TreeId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn ground_index_is_zero() {
        assert!(MobilizedBodyIndex::GROUND.is_ground());
        assert!(!MobilizedBodyIndex(3).is_ground());
        assert_eq!(usize::from(MobilizedBodyIndex(3)), 3);
    }
}
