//! Deterministic, seekable timeline replay.
//!
//! [`ReplayEngine`] turns the sorted events of a parsed trace into the set of
//! packets in flight at the cursor. Ticking forward and seeking directly to
//! the same time always produce the same active set.
//!
//! The engine does not own a clock. A host calls [`ReplayEngine::tick`] on a
//! timer, optionally spacing ticks with a [`TickPacer`] that backs off while
//! [`ReplayEngine::is_overloaded`] is set.

mod config;
mod engine;
mod error;
mod scheduler;

pub use config::{PacerConfig, ReplayConfig};
pub use engine::{AnimatedPacket, PacketKey, PlaybackState, ReplayEngine, ReplayStats};
pub use error::ReplayError;
pub use scheduler::TickPacer;
