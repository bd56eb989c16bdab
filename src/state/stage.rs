use serde::{Deserialize, Serialize};
use std::fmt;

/// Realization stages in dependency order. A State realized to stage S has
/// valid cache entries for every stage up to and including S.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    Empty,
    Topology,
    Model,
    Instance,
    Time,
    Position,
    Velocity,
    Dynamics,
    Acceleration,
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Empty,
        Stage::Topology,
        Stage::Model,
        Stage::Instance,
        Stage::Time,
        Stage::Position,
        Stage::Velocity,
        Stage::Dynamics,
        Stage::Acceleration,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Empty => "Empty",
            Stage::Topology => "Topology",
            Stage::Model => "Model",
            Stage::Instance => "Instance",
            Stage::Time => "Time",
            Stage::Position => "Position",
            Stage::Velocity => "Velocity",
            Stage::Dynamics => "Dynamics",
            Stage::Acceleration => "Acceleration",
        }
    }

    /// Stage immediately below this one; `Empty` is its own predecessor.
    pub fn prev(self) -> Stage {
        let i = self as usize;
        Stage::ALL[i.saturating_sub(1)]
    }

    pub fn next(self) -> Option<Stage> {
        Stage::ALL.get(self as usize + 1).copied()
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered() {
        assert!(Stage::Model < Stage::Instance);
        assert!(Stage::Position < Stage::Velocity);
        assert!(Stage::Dynamics < Stage::Acceleration);
        assert_eq!(Stage::Position.prev(), Stage::Time);
        assert_eq!(Stage::Empty.prev(), Stage::Empty);
        assert_eq!(Stage::Acceleration.next(), None);
    }
}
