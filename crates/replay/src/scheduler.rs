//! Adaptive tick pacing for hosts that drive the engine.

use crate::config::PacerConfig;
use crate::error::ReplayError;
use std::time::Duration;
use tracing::debug;

/// Chooses the interval until the next `tick`.
///
/// While the engine reports load, the interval widens by `stretch_step` per
/// tick up to `max_stretch` times nominal. It drops back to nominal as soon
/// as the load clears.
#[derive(Debug, Clone)]
pub struct TickPacer {
    config: PacerConfig,
    stretch: f64,
}

impl TickPacer {
    pub fn new(config: PacerConfig) -> Result<Self, ReplayError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: PacerConfig) -> Self {
        Self {
            config,
            stretch: 1.0,
        }
    }

    /// Interval to wait before the next tick, given the current load signal.
    pub fn next_interval(&mut self, overloaded: bool) -> Duration {
        let previous = self.stretch;
        self.stretch = if overloaded {
            (self.stretch * self.config.stretch_step).min(self.config.max_stretch)
        } else {
            1.0
        };
        if (previous > 1.0) != (self.stretch > 1.0) {
            debug!(overloaded, stretch = self.stretch, "Tick pacing changed");
        }
        self.current_interval()
    }

    /// Interval last handed out.
    pub fn current_interval(&self) -> Duration {
        self.config.nominal_interval.mul_f64(self.stretch)
    }

    pub fn is_stretched(&self) -> bool {
        self.stretch > 1.0
    }

    pub fn nominal_interval(&self) -> Duration {
        self.config.nominal_interval
    }
}

impl Default for TickPacer {
    fn default() -> Self {
        Self::build(PacerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nominal_without_load() {
        let mut pacer = TickPacer::default();
        assert_eq!(pacer.next_interval(false), Duration::from_millis(40));
        assert!(!pacer.is_stretched());
    }

    #[test]
    fn test_widens_under_load_up_to_cap() {
        let mut pacer = TickPacer::default();
        let first = pacer.next_interval(true);
        assert_eq!(first, Duration::from_millis(40).mul_f64(1.2));
        for _ in 0..10 {
            pacer.next_interval(true);
        }
        assert_eq!(
            pacer.current_interval(),
            Duration::from_millis(40).mul_f64(1.6)
        );
    }

    #[test]
    fn test_restores_when_load_clears() {
        let config = PacerConfig::default().with_nominal_interval(Duration::from_millis(10));
        let mut pacer = TickPacer::new(config).unwrap();
        pacer.next_interval(true);
        pacer.next_interval(true);
        assert!(pacer.is_stretched());
        assert_eq!(pacer.next_interval(false), Duration::from_millis(10));
    }

    #[test]
    fn test_rejects_shrinking_stretch() {
        let config = PacerConfig::default().with_stretch(-2.0, 1.6);
        assert!(matches!(
            TickPacer::new(config),
            Err(ReplayError::InvalidConfig(_))
        ));
    }
}
