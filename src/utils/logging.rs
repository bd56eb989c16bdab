use log::{log_enabled, warn, Level};
use std::time::{Duration, Instant};

/// Scoped timer around one realization stage; logs at trace level.
pub struct ScopedTimer {
    label: &'static str,
    bodies: usize,
    start: Instant,
}

impl ScopedTimer {
    pub fn new(label: &'static str, bodies: usize) -> Self {
        if log_enabled!(Level::Trace) {
            log::trace!("realize {label}: start ({bodies} bodies)");
        }
        Self {
            label,
            bodies,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for ScopedTimer {
    fn drop(&mut self) {
        if log_enabled!(Level::Trace) {
            log::trace!(
                "realize {}: done ({} bodies, {} µs)",
                self.label,
                self.bodies,
                self.start.elapsed().as_micros()
            );
        }
    }
}

/// Emits a warning when a State is being rebuilt for a newer topology,
/// naming the state-only inputs that were reset to defaults.
pub fn warn_topology_rebuild(
    state_version: u32,
    tree_version: u32,
    preserved: usize,
    total: usize,
    discarded: &[&str],
) {
    if discarded.is_empty() {
        warn!(
            "state built for topology v{state_version} rebuilt for v{tree_version}; \
             kept coordinates of {preserved}/{total} bodies"
        );
    } else {
        warn!(
            "state built for topology v{state_version} rebuilt for v{tree_version}; \
             kept coordinates of {preserved}/{total} bodies, discarded {}",
            discarded.join(", ")
        );
    }
}
