use serde::{Deserialize, Serialize};

/// Derivative level at which a mobilizer's motion is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionLevel {
    Position,
    Velocity,
    Acceleration,
}

/// How a group of mobilizer variables (q, u, or udot) is determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionMethod {
    /// Determined by the equations of motion.
    #[default]
    Free,
    /// Externally specified values.
    Prescribed,
    /// Held at zero.
    Zero,
    /// Changed only by discrete events.
    Discrete,
    /// Relaxed to steady state on a fast time scale.
    Fast,
}

/// Motion attached to a mobilizer: the level where it applies and the method there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Motion {
    pub level: MotionLevel,
    pub method: MotionMethod,
}

impl Motion {
    pub fn new(level: MotionLevel, method: MotionMethod) -> Self {
        Self { level, method }
    }

    /// Fully prescribed acceleration (udot supplied through the State).
    pub fn prescribed_acceleration() -> Self {
        Self::new(MotionLevel::Acceleration, MotionMethod::Prescribed)
    }

    /// Locks the mobilizer: q and u held, udot zero.
    pub fn locked() -> Self {
        Self::new(MotionLevel::Velocity, MotionMethod::Zero)
    }

    /// Methods for (q, u, udot) implied by this motion. Levels below the
    /// specified one are free; levels above it follow from the given method.
    pub fn methods(&self) -> (MotionMethod, MotionMethod, MotionMethod) {
        let m = self.method;
        match self.level {
            MotionLevel::Position => (m, m, m),
            MotionLevel::Velocity => {
                let udot = if m == MotionMethod::Prescribed {
                    MotionMethod::Prescribed
                } else {
                    MotionMethod::Zero
                };
                (MotionMethod::Free, m, udot)
            }
            MotionLevel::Acceleration => (MotionMethod::Free, MotionMethod::Free, m),
        }
    }
}

/// Resolved per-variable motion methods for one mobilizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MotionMethods {
    pub q: MotionMethod,
    pub u: MotionMethod,
    pub udot: MotionMethod,
}

impl MotionMethods {
    pub fn from_motion(motion: Option<&Motion>) -> Self {
        match motion {
            Some(m) => {
                let (q, u, udot) = m.methods();
                Self { q, u, udot }
            }
            None => Self::default(),
        }
    }

    pub fn is_velocity_always_zero(&self) -> bool {
        self.u == MotionMethod::Zero
    }

    pub fn is_acceleration_always_zero(&self) -> bool {
        self.udot == MotionMethod::Zero
    }
}
