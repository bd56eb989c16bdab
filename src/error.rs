//! Error types for the mobilized-body engine.
//!
//! Every fallible operator returns [`Result`], built on [`MultibodyError`].
//! All variants describe caller contract violations; none are transient.

use thiserror::Error;

use crate::state::Stage;
use crate::utils::ids::MobilizedBodyIndex;

/// Errors raised by tree construction, realization, and handle operators.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MultibodyError {
    /// A cached quantity was requested before the State reached the stage that produces it.
    #[error("{operation} requires stage {required:?} but the state is at {current:?}")]
    StageViolation {
        operation: &'static str,
        required: Stage,
        current: Stage,
    },

    /// The State was built against an older topology of its tree.
    #[error("state topology version {state} is stale (tree is at {tree}); re-realize it")]
    StaleTopology { state: u32, tree: u32 },

    /// Handle or State does not belong to the tree it is used with.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A declared capability was not supplied.
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// A matrix offered as a rotation is not orthonormal with determinant +1.
    #[error("invalid rotation: {0}")]
    InvalidRotation(String),

    /// Mass or inertia values are not physically meaningful.
    #[error("invalid mass properties: {0}")]
    InvalidMassProperties(String),

    /// An index into a per-mobilizer or per-tree vector was out of range.
    #[error("{what} index {index} out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// A vector argument had the wrong length.
    #[error("{what} has length {found}, expected {expected}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        found: usize,
    },

    /// The articulated inertia across a mobilizer could not be inverted.
    #[error("articulated inertia across mobilizer of body {0} is singular")]
    SingularArticulatedInertia(MobilizedBodyIndex),
}

impl MultibodyError {
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    pub fn not_implemented(msg: impl Into<String>) -> Self {
        Self::NotImplemented(msg.into())
    }

    pub fn invalid_rotation(msg: impl Into<String>) -> Self {
        Self::InvalidRotation(msg.into())
    }

    pub fn invalid_mass_properties(msg: impl Into<String>) -> Self {
        Self::InvalidMassProperties(msg.into())
    }

    pub fn check_len(what: &'static str, expected: usize, found: usize) -> Result<()> {
        if expected == found {
            Ok(())
        } else {
            Err(Self::DimensionMismatch {
                what,
                expected,
                found,
            })
        }
    }

    pub fn check_index(what: &'static str, index: usize, len: usize) -> Result<()> {
        if index < len {
            Ok(())
        } else {
            Err(Self::IndexOutOfRange { what, index, len })
        }
    }
}

/// Convenient Result alias for engine operations.
pub type Result<T> = std::result::Result<T, MultibodyError>;
