//! Synthetic packet generation.
//!
//! Two producers share one input, a [`TopologySnapshot`] taken from the
//! graph store:
//!
//! - [`PacketGeneratorClient`] posts the snapshot to a remote generator.
//! - [`TopologyPacketGenerator`] draws packets locally from a seeded RNG.
//!
//! Neither holds a reference back into the store.

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::retry::with_retry;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use topotrace_graph::GraphStore;
use topotrace_types::{NodeId, PacketRecord};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Share of packets sent along an existing link.
const LINK_TRAFFIC_SHARE: f64 = 0.7;

/// Scenario length used to spread timestamps when none is given.
pub const DEFAULT_SCENARIO_SECS: f64 = 100.0;

const TCP_SERVICES: [(&str, u16); 5] = [
    ("HTTP", 80),
    ("HTTPS", 443),
    ("SSH", 22),
    ("FTP", 21),
    ("Telnet", 23),
];

// ═══════════════════════════════════════════════════════════════════════════
// Topology snapshot
// ═══════════════════════════════════════════════════════════════════════════

/// A node as sent to a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotNode {
    pub id: NodeId,
    pub x: i32,
    pub y: i32,
    pub ip: String,
}

/// A link as sent to a generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SnapshotLink {
    pub source: NodeId,
    pub target: NodeId,
}

/// Owned copy of the store's nodes and links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TopologySnapshot {
    pub nodes: Vec<SnapshotNode>,
    pub links: Vec<SnapshotLink>,
}

impl TopologySnapshot {
    pub fn capture(store: &GraphStore) -> Self {
        Self {
            nodes: store
                .nodes()
                .map(|n| SnapshotNode {
                    id: n.id,
                    x: n.x,
                    y: n.y,
                    ip: node_address(n.id),
                })
                .collect(),
            links: store
                .links()
                .map(|l| SnapshotLink {
                    source: l.node1,
                    target: l.node2,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn address_of(&self, id: NodeId) -> String {
        self.nodes
            .iter()
            .find(|n| n.id == id)
            .map(|n| n.ip.clone())
            .unwrap_or_else(|| node_address(id))
    }
}

/// Address a generator assigns to a node: `192.168.<id/254+1>.<id%254+1>`.
pub fn node_address(id: NodeId) -> String {
    format!("192.168.{}.{}", id.0 / 254 + 1, id.0 % 254 + 1)
}

// ═══════════════════════════════════════════════════════════════════════════
// Scenarios
// ═══════════════════════════════════════════════════════════════════════════

/// Traffic scenario requested from a generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scenario {
    Normal,
    Ddos,
    PortScan,
    Mixed,
    WebAttack,
    Malware,
    /// Any other label, passed through verbatim.
    Custom(String),
}

impl Scenario {
    /// Parse a scenario label, case-insensitively.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "normal" | "normal traffic" => Scenario::Normal,
            "ddos" | "ddos attack" => Scenario::Ddos,
            "port scan" | "portscan" | "port-scan" => Scenario::PortScan,
            "mixed" | "mixed traffic" => Scenario::Mixed,
            "web attack" | "web" | "web-attack" => Scenario::WebAttack,
            "malware" | "malware communication" => Scenario::Malware,
            _ => Scenario::Custom(label.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Scenario::Normal => "Normal Traffic",
            Scenario::Ddos => "DDoS Attack",
            Scenario::PortScan => "Port Scan",
            Scenario::Mixed => "Mixed Traffic",
            Scenario::WebAttack => "Web Attack",
            Scenario::Malware => "Malware Communication",
            Scenario::Custom(label) => label,
        }
    }

    /// Chance that a generated packet is attack traffic.
    pub fn attack_probability(&self) -> f64 {
        match self {
            Scenario::Normal => 0.05,
            Scenario::Ddos => 0.8,
            Scenario::PortScan => 0.7,
            Scenario::Mixed => 0.4,
            Scenario::WebAttack => 0.6,
            Scenario::Malware => 0.5,
            Scenario::Custom(_) => 0.3,
        }
    }

    /// Attack labels drawn for attack packets.
    pub fn attack_types(&self) -> &'static [&'static str] {
        match self {
            Scenario::Ddos => &["DDoS", "DoS"],
            Scenario::PortScan => &["PortScan", "Probe"],
            Scenario::WebAttack => &["SQLInjection", "XSS", "BruteForce"],
            Scenario::Malware => &["Malware", "Botnet"],
            _ => &["DoS", "DDoS", "PortScan", "BruteForce", "SQLInjection", "XSS", "Malware"],
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Local generator
// ═══════════════════════════════════════════════════════════════════════════

/// Seeded, offline packet generator.
///
/// The same seed, snapshot and scenario always yield the same packets.
#[derive(Debug, Clone)]
pub struct TopologyPacketGenerator {
    rng: ChaCha8Rng,
    scenario_secs: f64,
}

impl TopologyPacketGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            scenario_secs: DEFAULT_SCENARIO_SECS,
        }
    }

    /// Spread timestamps over `secs` seconds instead of the default.
    pub fn with_scenario_secs(mut self, secs: f64) -> Self {
        self.scenario_secs = secs;
        self
    }

    /// Produce `count` packets over the snapshot. An empty topology yields
    /// no packets.
    pub fn generate(
        &mut self,
        topology: &TopologySnapshot,
        scenario: &Scenario,
        count: usize,
    ) -> Vec<PacketRecord> {
        if topology.is_empty() || count == 0 {
            return Vec::new();
        }
        let spacing = self.scenario_secs / count as f64;
        let packets: Vec<PacketRecord> = (0..count)
            .map(|i| self.packet(topology, scenario, i, spacing))
            .collect();

        debug!(
            count,
            attacks = packets.iter().filter(|p| p.is_attack()).count(),
            scenario = %scenario,
            "Generated packets locally"
        );
        packets
    }

    fn endpoints(&mut self, topology: &TopologySnapshot) -> (NodeId, NodeId) {
        if !topology.links.is_empty() && self.rng.gen_bool(LINK_TRAFFIC_SHARE) {
            if let Some(link) = topology.links.choose(&mut self.rng) {
                return if self.rng.gen_bool(0.5) {
                    (link.target, link.source)
                } else {
                    (link.source, link.target)
                };
            }
        }
        let n = topology.nodes.len();
        let src = self.rng.gen_range(0..n);
        let dst = if n > 1 {
            let pick = self.rng.gen_range(0..n - 1);
            if pick >= src {
                pick + 1
            } else {
                pick
            }
        } else {
            src
        };
        (topology.nodes[src].id, topology.nodes[dst].id)
    }

    fn packet(
        &mut self,
        topology: &TopologySnapshot,
        scenario: &Scenario,
        index: usize,
        spacing: f64,
    ) -> PacketRecord {
        let (src, dst) = self.endpoints(topology);
        let is_attack = self.rng.gen_bool(scenario.attack_probability());
        let attack_type = if is_attack {
            scenario
                .attack_types()
                .choose(&mut self.rng)
                .map(|s| s.to_string())
        } else {
            None
        };

        let rng = &mut self.rng;
        let protocol = if is_attack {
            *["TCP", "UDP", "ICMP"].choose(rng).unwrap_or(&"TCP")
        } else {
            *["TCP", "TCP", "TCP", "UDP", "UDP"].choose(rng).unwrap_or(&"TCP")
        };

        let (application, dest_port, source_port, flags) = match protocol {
            "TCP" => {
                let (app, port) = *TCP_SERVICES.choose(rng).unwrap_or(&("HTTP", 80));
                let flags = if is_attack {
                    ["SYN", "SYN", "RST", "FIN"].choose(rng)
                } else {
                    ["ACK", "PSH-ACK", "SYN-ACK"].choose(rng)
                };
                (app, port, rng.gen_range(1024..61024), flags.copied().unwrap_or_default())
            }
            "UDP" => {
                let (app, port) = *[("DNS", 53), ("DHCP", 67), ("Custom", 8080)]
                    .choose(rng)
                    .unwrap_or(&("DNS", 53));
                (app, port, rng.gen_range(1024..61024), "")
            }
            _ => ("ICMP", 0, 0, ""),
        };

        let packet_size: u32 = if !is_attack {
            rng.gen_range(200..1000)
        } else if rng.gen_bool(0.5) {
            rng.gen_range(64..164)
        } else {
            rng.gen_range(1200..1500)
        };
        let ttl: u8 = rng.gen_range(32..128);
        let header_length: u32 = if protocol == "TCP" {
            rng.gen_range(20..60)
        } else {
            20
        };

        let (latency, jitter, retransmissions, packet_rate, error_rate) = if is_attack {
            (
                0.05 + rng.gen::<f64>() * 0.2,
                0.01 + rng.gen::<f64>() * 0.04,
                rng.gen_range(0..5),
                rng.gen_range(100..1000) as f64,
                0.05 + rng.gen::<f64>() * 0.05,
            )
        } else {
            (
                0.001 + rng.gen::<f64>() * 0.05,
                rng.gen::<f64>() * 0.01,
                rng.gen_range(0..2),
                rng.gen_range(1..101) as f64,
                rng.gen::<f64>() * 0.02,
            )
        };
        let is_fragmented = packet_size > 1000 && rng.gen_bool(0.5);

        PacketRecord {
            packet_id: format!("PKT-{:06}", index + 1),
            sequence_number: index as u32 + 1,
            timestamp: index as f64 * spacing,
            source_ip: topology.address_of(src),
            dest_ip: topology.address_of(dst),
            source_port,
            dest_port,
            protocol: protocol.to_string(),
            packet_size,
            ttl,
            header_length,
            flags: flags.to_string(),
            application_type: application.to_string(),
            payload_size: packet_size.saturating_sub(header_length),
            traffic_type: if is_attack { "Attack" } else { "Normal" }.to_string(),
            attack_type,
            latency,
            jitter,
            retransmissions,
            packet_rate,
            error_rate,
            is_fragmented,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Remote generator
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    nodes: &'a [SnapshotNode],
    links: &'a [SnapshotLink],
    scenario: &'a str,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    packets: Vec<PacketRecord>,
}

/// Client for the remote packet generator.
#[derive(Debug, Clone)]
pub struct PacketGeneratorClient {
    http: reqwest::Client,
    config: ClientConfig,
}

impl PacketGeneratorClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, config })
    }

    /// Ask the service for `count` packets over `topology`.
    ///
    /// An empty topology yields no packets without contacting the service.
    pub async fn generate(
        &self,
        topology: &TopologySnapshot,
        scenario: &Scenario,
        count: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<PacketRecord>, ClientError> {
        if topology.is_empty() || count == 0 {
            return Ok(Vec::new());
        }
        let request = GenerateRequest {
            nodes: &topology.nodes,
            links: &topology.links,
            scenario: scenario.label(),
            count,
        };

        let body = with_retry(&self.config.retry, cancel, "generate", |_| {
            self.post(&request)
        })
        .await?;
        let packets = decode_packets(&body)?;
        info!(count = packets.len(), scenario = %scenario, "Received generated packets");
        Ok(packets)
    }

    async fn post(&self, request: &GenerateRequest<'_>) -> Result<String, ClientError> {
        let response = self.http.post(&self.config.endpoint).json(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(body)
    }
}

fn decode_packets(body: &str) -> Result<Vec<PacketRecord>, ClientError> {
    serde_json::from_str::<GenerateResponse>(body)
        .map(|r| r.packets)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn ring(n: i32) -> GraphStore {
        let mut store = GraphStore::new();
        let ids: Vec<NodeId> = (0..n).map(|i| store.add_node(i * 10, 0).id).collect();
        for i in 0..ids.len() {
            store.add_link(ids[i], ids[(i + 1) % ids.len()]).unwrap();
        }
        store
    }

    #[test]
    fn test_node_address() {
        assert_eq!(node_address(NodeId(1)), "192.168.1.2");
        assert_eq!(node_address(NodeId(254)), "192.168.2.1");
    }

    #[test]
    fn test_snapshot_captures_store() {
        let store = ring(3);
        let snapshot = TopologySnapshot::capture(&store);
        assert_eq!(snapshot.nodes.len(), 3);
        assert_eq!(snapshot.links.len(), 3);
        assert_eq!(snapshot.nodes[0].ip, "192.168.1.2");
    }

    #[test]
    fn test_same_seed_same_packets() {
        let snapshot = TopologySnapshot::capture(&ring(4));
        let a = TopologyPacketGenerator::new(7).generate(&snapshot, &Scenario::Mixed, 50);
        let b = TopologyPacketGenerator::new(7).generate(&snapshot, &Scenario::Mixed, 50);
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert_eq!(a[0].packet_id, "PKT-000001");
        assert_eq!(a[49].sequence_number, 50);
    }

    #[test]
    fn test_packets_use_topology_addresses() {
        let snapshot = TopologySnapshot::capture(&ring(5));
        let known: HashSet<String> = snapshot.nodes.iter().map(|n| n.ip.clone()).collect();
        let packets = TopologyPacketGenerator::new(1).generate(&snapshot, &Scenario::Normal, 200);
        for p in &packets {
            assert!(known.contains(&p.source_ip));
            assert!(known.contains(&p.dest_ip));
            assert_ne!(p.source_ip, p.dest_ip);
            assert!((32..128).contains(&p.ttl));
            assert_eq!(p.payload_size, p.packet_size - p.header_length);
            assert_eq!(p.is_attack(), p.attack_type.is_some());
        }
    }

    #[test]
    fn test_attack_labels_follow_scenario() {
        let snapshot = TopologySnapshot::capture(&ring(3));
        let packets = TopologyPacketGenerator::new(3).generate(&snapshot, &Scenario::Ddos, 300);
        let attacks: Vec<&PacketRecord> = packets.iter().filter(|p| p.is_attack()).collect();
        assert!(attacks.len() > 150);
        for p in attacks {
            assert!(matches!(
                p.attack_type.as_deref(),
                Some("DDoS") | Some("DoS")
            ));
        }
    }

    #[test]
    fn test_empty_topology_yields_nothing() {
        let snapshot = TopologySnapshot::default();
        assert!(TopologyPacketGenerator::new(0)
            .generate(&snapshot, &Scenario::Normal, 10)
            .is_empty());
    }

    #[test]
    fn test_single_node_talks_to_itself() {
        let mut store = GraphStore::new();
        store.add_node(0, 0);
        let snapshot = TopologySnapshot::capture(&store);
        let packets = TopologyPacketGenerator::new(0).generate(&snapshot, &Scenario::Normal, 3);
        assert!(packets.iter().all(|p| p.source_ip == p.dest_ip));
    }

    #[test]
    fn test_scenario_labels() {
        assert_eq!(Scenario::from_label("DDoS Attack"), Scenario::Ddos);
        assert_eq!(Scenario::from_label("port scan"), Scenario::PortScan);
        assert_eq!(
            Scenario::from_label("Insider threat"),
            Scenario::Custom("Insider threat".to_string())
        );
        assert_eq!(
            Scenario::from_label("Insider threat").attack_probability(),
            0.3
        );
        assert_eq!(Scenario::Normal.attack_probability(), 0.05);
    }

    #[test]
    fn test_request_shape() {
        let snapshot = TopologySnapshot::capture(&ring(2));
        let request = GenerateRequest {
            nodes: &snapshot.nodes,
            links: &snapshot.links,
            scenario: Scenario::Malware.label(),
            count: 5,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["scenario"], "Malware Communication");
        assert_eq!(json["nodes"][0]["id"], 1);
        assert_eq!(json["links"][0]["source"], 1);
        assert_eq!(json["count"], 5);
    }

    #[test]
    fn test_decode_packets() {
        let body = r#"{"packets": [{
            "packetId": "PKT-000001", "sequenceNumber": 1, "timestamp": 0.0,
            "sourceIP": "192.168.1.2", "destIP": "192.168.1.3",
            "sourcePort": 1200, "destPort": 53, "protocol": "UDP",
            "packetSize": 300, "ttl": 64, "headerLength": 20,
            "applicationType": "DNS", "trafficType": "Normal",
            "latency": 0.002, "jitter": 0.0
        }]}"#;
        let packets = decode_packets(body).unwrap();
        assert_eq!(packets.len(), 1);
        assert!(!packets[0].is_attack());
        assert!(matches!(decode_packets("[]"), Err(ClientError::Decode(_))));
    }

    #[tokio::test]
    async fn test_remote_empty_topology_short_circuits() {
        let client =
            PacketGeneratorClient::new(ClientConfig::new("http://127.0.0.1:9/generate")).unwrap();
        let packets = client
            .generate(
                &TopologySnapshot::default(),
                &Scenario::Normal,
                10,
                &CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(packets.is_empty());
    }
}
