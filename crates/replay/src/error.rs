//! Error types for the replay engine.

use thiserror::Error;

/// Errors from replay configuration and driving calls.
///
/// A rejected call leaves the engine untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReplayError {
    /// Tick step was negative or not finite.
    #[error("invalid tick step {0}")]
    InvalidStep(f64),

    /// Seek target was not finite.
    #[error("invalid seek target {0}")]
    InvalidSeek(f64),

    /// Replay end time was not finite.
    #[error("invalid replay end {0}")]
    InvalidEnd(f64),

    /// A configuration value is out of range.
    #[error("invalid replay config: {0}")]
    InvalidConfig(String),
}
