//! Replay and pacing configuration.

use crate::error::ReplayError;
use std::time::Duration;

/// Tuning for the replay engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Seconds of trace time a packet takes to cross a link.
    pub transit_duration: f64,

    /// Progress at which a packet is retired.
    pub retire_progress: f64,

    /// Admissions are dropped while this many packets are active.
    pub hard_cap: usize,

    /// Active packets above this count are evicted, oldest first.
    pub soft_cap: usize,

    /// Damping factor applied to `visual_progress` on each tick.
    pub smoothing: f64,

    /// The load signal is raised above this many in-flight packets.
    pub load_threshold: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            transit_duration: 1.5,
            retire_progress: 0.95,
            hard_cap: 150,
            soft_cap: 100,
            smoothing: 0.5,
            load_threshold: 50,
        }
    }
}

impl ReplayConfig {
    pub fn with_transit_duration(mut self, seconds: f64) -> Self {
        self.transit_duration = seconds;
        self
    }

    pub fn with_caps(mut self, soft_cap: usize, hard_cap: usize) -> Self {
        self.soft_cap = soft_cap;
        self.hard_cap = hard_cap;
        self
    }

    pub fn with_load_threshold(mut self, load_threshold: usize) -> Self {
        self.load_threshold = load_threshold;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !(self.transit_duration.is_finite() && self.transit_duration > 0.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "transit_duration must be positive, got {}",
                self.transit_duration
            )));
        }
        if !(self.retire_progress > 0.0 && self.retire_progress <= 1.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "retire_progress must be in (0, 1], got {}",
                self.retire_progress
            )));
        }
        if !(self.smoothing > 0.0 && self.smoothing <= 1.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "smoothing must be in (0, 1], got {}",
                self.smoothing
            )));
        }
        if self.soft_cap > self.hard_cap {
            return Err(ReplayError::InvalidConfig(format!(
                "soft_cap {} exceeds hard_cap {}",
                self.soft_cap, self.hard_cap
            )));
        }
        Ok(())
    }
}

/// Tuning for [`TickPacer`](crate::TickPacer).
#[derive(Debug, Clone, PartialEq)]
pub struct PacerConfig {
    /// Tick interval while the engine is not under load.
    pub nominal_interval: Duration,

    /// Upper bound on the widened interval, as a multiple of nominal.
    pub max_stretch: f64,

    /// Factor applied to the stretch on each loaded tick.
    pub stretch_step: f64,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            nominal_interval: Duration::from_millis(40),
            max_stretch: 1.6,
            stretch_step: 1.2,
        }
    }
}

impl PacerConfig {
    pub fn with_nominal_interval(mut self, interval: Duration) -> Self {
        self.nominal_interval = interval;
        self
    }

    pub fn with_stretch(mut self, stretch_step: f64, max_stretch: f64) -> Self {
        self.stretch_step = stretch_step;
        self.max_stretch = max_stretch;
        self
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ReplayError> {
        if !(self.stretch_step.is_finite() && self.stretch_step >= 1.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "stretch_step must be at least 1, got {}",
                self.stretch_step
            )));
        }
        if !(self.max_stretch.is_finite() && self.max_stretch >= 1.0) {
            return Err(ReplayError::InvalidConfig(format!(
                "max_stretch must be at least 1, got {}",
                self.max_stretch
            )));
        }
        Ok(())
    }
}
