//! Error types for graph store operations.

use thiserror::Error;
use topotrace_types::{LinkId, NodeId};

/// Errors from the graph store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node id is not live in the store.
    #[error("{0} not found")]
    NodeNotFound(NodeId),

    /// The link id is not present in the store.
    #[error("{0} not found")]
    LinkNotFound(LinkId),

    /// Tried to insert a node under an id that is already live.
    #[error("{0} is already live")]
    NodeAlreadyLive(NodeId),

    /// Tried to restore a link whose id is already present.
    #[error("{0} is already present")]
    LinkAlreadyPresent(LinkId),

    /// Node ids start at 1.
    #[error("node id 0 is not a valid identifier")]
    InvalidNodeId,
}
