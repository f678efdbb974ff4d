//! Async collaborators: the remote simulator and the packet generator.
//!
//! Every remote call is bounded by a per-attempt timeout, retried with
//! linear backoff, and cancellable through a `CancellationToken`. Results
//! come back in one piece, either awaited directly or through a
//! [`Completion`] when the call runs as a background task.
//!
//! [`TopologyPacketGenerator`] produces packets offline from a seed when no
//! generator service is available.

mod config;
mod error;
mod generator;
mod handoff;
mod retry;
mod simulator;

pub use config::{ClientConfig, RetryPolicy};
pub use error::ClientError;
pub use generator::{
    node_address, PacketGeneratorClient, Scenario, SnapshotLink, SnapshotNode,
    TopologyPacketGenerator, TopologySnapshot, DEFAULT_SCENARIO_SECS,
};
pub use handoff::{spawn_generation, spawn_simulation, Completion};
pub use retry::with_retry;
pub use simulator::SimulatorClient;
