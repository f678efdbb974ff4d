//! Results handed back by the external collaborators.

use serde::{Deserialize, Serialize};

/// One synthetic packet produced by a packet generator.
///
/// Field names follow the generator's camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PacketRecord {
    pub packet_id: String,
    pub sequence_number: u32,
    /// Seconds from the start of the scenario.
    pub timestamp: f64,

    // Addressing
    #[serde(rename = "sourceIP")]
    pub source_ip: String,
    #[serde(rename = "destIP")]
    pub dest_ip: String,
    pub source_port: u16,
    pub dest_port: u16,
    pub protocol: String,

    // Shape
    pub packet_size: u32,
    pub ttl: u8,
    pub header_length: u32,
    #[serde(default)]
    pub flags: String,
    pub application_type: String,
    #[serde(default)]
    pub payload_size: u32,

    // Classification
    pub traffic_type: String,
    #[serde(default)]
    pub attack_type: Option<String>,

    // Timing
    pub latency: f64,
    pub jitter: f64,
    #[serde(default)]
    pub retransmissions: u32,
    #[serde(default)]
    pub packet_rate: f64,
    #[serde(default)]
    pub error_rate: f64,
    #[serde(default)]
    pub is_fragmented: bool,
}

impl PacketRecord {
    /// Whether the generator classified this packet as attack traffic.
    pub fn is_attack(&self) -> bool {
        self.traffic_type.eq_ignore_ascii_case("attack")
    }
}

/// Outcome of one remote simulation run.
///
/// This is the only shape the core depends on. A failed run carries
/// `success == false` and an `error_message`; it is never raised as an error
/// into caller state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub success: bool,
    pub trace_text: Option<String>,
    pub animation_artifact: Option<Vec<u8>>,
    pub error_message: Option<String>,
}

impl SimulationResult {
    /// A successful run.
    pub fn succeeded(trace_text: Option<String>, animation_artifact: Option<Vec<u8>>) -> Self {
        Self {
            success: true,
            trace_text,
            animation_artifact,
            error_message: None,
        }
    }

    /// A failed run with a human-readable reason.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}
