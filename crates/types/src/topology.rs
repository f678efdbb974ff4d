//! Editor topology entities.
//!
//! Nodes and links never hold references to each other. A link names its
//! endpoints by [`NodeId`], so removing a node can never leave a dangling
//! object reference behind; adjacency is tracked centrally by the graph store.

use crate::{LinkId, NodeId};
use serde::{Deserialize, Serialize};

/// A node placed on the editor canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Node {
    /// Unique live identifier (`>= 1`).
    pub id: NodeId,
    /// Canvas x coordinate.
    pub x: i32,
    /// Canvas y coordinate.
    pub y: i32,
}

impl Node {
    /// Create a node at the given position.
    pub fn new(id: NodeId, x: i32, y: i32) -> Self {
        Self { id, x, y }
    }

    /// Current position as an `(x, y)` pair.
    pub fn position(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

/// An undirected link between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub id: LinkId,
    pub node1: NodeId,
    pub node2: NodeId,
}

impl Link {
    /// Create a link between two node ids.
    pub fn new(id: LinkId, node1: NodeId, node2: NodeId) -> Self {
        Self { id, node1, node2 }
    }

    /// Whether either endpoint is `node`.
    pub fn touches(&self, node: NodeId) -> bool {
        self.node1 == node || self.node2 == node
    }

    /// The endpoint opposite to `node`, if `node` is an endpoint.
    pub fn other(&self, node: NodeId) -> Option<NodeId> {
        if self.node1 == node {
            Some(self.node2)
        } else if self.node2 == node {
            Some(self.node1)
        } else {
            None
        }
    }

    /// Both endpoints as a pair.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.node1, self.node2)
    }

    /// Return a copy with every endpoint equal to `from` replaced by `to`.
    ///
    /// Used when a node is reinstated under a different identity.
    pub fn with_endpoint_renamed(mut self, from: NodeId, to: NodeId) -> Self {
        if self.node1 == from {
            self.node1 = to;
        }
        if self.node2 == from {
            self.node2 = to;
        }
        self
    }
}
