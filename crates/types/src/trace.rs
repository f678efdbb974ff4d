//! Records recovered from a simulator trace.
//!
//! Trace node ids live in the simulator's namespace and are unrelated to the
//! editor's [`NodeId`](crate::NodeId); they are kept as plain `u64`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A node descriptor from the trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub label: String,
    pub shape: String,
    pub color: String,
}

impl TraceNode {
    /// Create a node with the default label (`n<id>`), shape and color.
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            label: format!("n{}", id),
            shape: "circle".to_string(),
            color: "black".to_string(),
        }
    }
}

/// A link descriptor from the trace.
///
/// Endpoints are not checked against the node map; a link may reference a
/// node that was never described.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLink {
    pub src: u64,
    pub dst: u64,
    pub orientation: String,
    pub color: String,
}

impl TraceLink {
    /// Create a link with default orientation and color.
    pub fn new(src: u64, dst: u64) -> Self {
        Self {
            src,
            dst,
            orientation: "right".to_string(),
            color: "black".to_string(),
        }
    }
}

/// Kind of a timestamped packet event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraceEventKind {
    /// `+`: packet entered a link queue.
    Enqueue,
    /// `-`: packet left a link queue.
    Dequeue,
    /// `r`: packet received at the far end.
    Receive,
    /// `d`: packet dropped.
    Drop,
    /// `h`: packet hopped to the next node.
    Hop,
}

impl TraceEventKind {
    /// Map a leading trace token to an event kind.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "+" => Some(Self::Enqueue),
            "-" => Some(Self::Dequeue),
            "r" => Some(Self::Receive),
            "d" => Some(Self::Drop),
            "h" => Some(Self::Hop),
            _ => None,
        }
    }

    /// The leading token for this kind.
    pub fn token(self) -> &'static str {
        match self {
            Self::Enqueue => "+",
            Self::Dequeue => "-",
            Self::Receive => "r",
            Self::Drop => "d",
            Self::Hop => "h",
        }
    }

    /// Whether consuming this event puts a packet in flight.
    pub fn starts_transit(self) -> bool {
        matches!(self, Self::Enqueue | Self::Hop)
    }
}

impl fmt::Display for TraceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Enqueue => "enqueue",
            Self::Dequeue => "dequeue",
            Self::Receive => "receive",
            Self::Drop => "drop",
            Self::Hop => "hop",
        };
        f.write_str(name)
    }
}

/// A timestamped packet event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceEvent {
    /// Simulation time in seconds.
    pub time: f64,
    pub kind: TraceEventKind,
    pub src: u64,
    pub dst: u64,
    /// Packet kind label, e.g. `tcp` or `cbr`.
    pub packet_kind: String,
    /// Packet size in bytes.
    pub size: u32,
}

/// Axis-aligned bounds over trace node coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// A degenerate box around a single point.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    /// Grow the box to include `(x, y)`.
    pub fn include(&mut self, x: f64, y: f64) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// A fully parsed trace.
///
/// Created once per loaded trace and replaced wholesale on the next load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedTrace {
    /// Nodes by id; the last descriptor for an id wins.
    pub nodes: BTreeMap<u64, TraceNode>,
    /// Links in input order.
    pub links: Vec<TraceLink>,
    /// Events sorted by time; equal times keep input order.
    pub events: Vec<TraceEvent>,
    /// Largest event time (0 when there are no events).
    pub max_time: f64,
    /// Bounds over every node descriptor seen, `None` without nodes.
    pub bounds: Option<BoundingBox>,
    /// Number of records skipped as malformed or unrecognized.
    pub skipped_records: usize,
}

impl ParsedTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the trace carries no nodes, links or events.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.links.is_empty() && self.events.is_empty()
    }

    /// Count of events of a given kind.
    pub fn count_kind(&self, kind: TraceEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}
