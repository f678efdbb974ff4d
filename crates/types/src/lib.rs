//! Shared types for the topology editor and trace viewer.
//!
//! This crate holds the plain data every other crate agrees on:
//!
//! - **Identifiers**: [`NodeId`], [`LinkId`]
//! - **Topology**: editor [`Node`] and [`Link`] entities (ids only, no references)
//! - **Trace records**: [`TraceNode`], [`TraceLink`], [`TraceEvent`], [`ParsedTrace`]
//! - **Collaborator results**: [`PacketRecord`], [`SimulationResult`]
//! - **Settings**: [`SimulationSettings`] and its [`ValidationError`]

mod identifiers;
mod records;
mod settings;
mod topology;
mod trace;

pub use identifiers::{LinkId, NodeId};
pub use records::{PacketRecord, SimulationResult};
pub use settings::{
    ApplicationKind, QueueType, SettingsForm, SimulationSettings, TransportProtocol,
    ValidationError,
};
pub use topology::{Link, Node};
pub use trace::{BoundingBox, ParsedTrace, TraceEvent, TraceEventKind, TraceLink, TraceNode};
