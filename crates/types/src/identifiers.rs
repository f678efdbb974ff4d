//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Editor node identifier.
///
/// Issued by the graph store's allocator. Live ids are always `>= 1`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Get the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

/// Editor link identifier.
///
/// Link ids come from a separate monotonic sequence and are never reused.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LinkId(pub u64);

impl LinkId {
    /// Get the raw value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(NodeId(7).to_string(), "Node(7)");
        assert_eq!(LinkId(3).to_string(), "Link(3)");
    }

    #[test]
    fn test_ordering_follows_raw_value() {
        assert!(NodeId(2) < NodeId(10));
        assert_eq!(NodeId(4).get(), 4);
    }

    #[test]
    fn test_serializes_transparently() {
        let json = serde_json::to_string(&NodeId(42)).unwrap();
        assert_eq!(json, "42");
    }
}
