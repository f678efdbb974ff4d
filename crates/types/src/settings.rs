//! User-facing simulation settings.
//!
//! Settings arrive as raw text fields. [`SettingsForm::parse`] validates every
//! field up front and returns a [`ValidationError`] before anything downstream
//! is touched.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Bad caller-supplied parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A numeric field did not parse.
    #[error("{field}: '{value}' is not a valid number")]
    NotANumber { field: &'static str, value: String },

    /// A numeric field parsed but is outside its allowed range.
    #[error("{field}: {reason}")]
    OutOfRange { field: &'static str, reason: String },

    /// A rate or duration field lacks a recognized unit.
    #[error("{field}: '{value}' must be a number followed by one of {units}")]
    BadUnit {
        field: &'static str,
        value: String,
        units: &'static str,
    },

    /// A choice field holds an unknown option.
    #[error("{field}: unknown option '{value}'")]
    UnknownOption { field: &'static str, value: String },
}

/// Transport agent attached to traffic sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TransportProtocol {
    #[default]
    Tcp,
    Udp,
    TcpReno,
    TcpNewreno,
    TcpVegas,
}

impl FromStr for TransportProtocol {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "tcp/reno" => Ok(Self::TcpReno),
            "tcp/newreno" => Ok(Self::TcpNewreno),
            "tcp/vegas" => Ok(Self::TcpVegas),
            _ => Err(ValidationError::UnknownOption {
                field: "protocol",
                value: s.to_string(),
            }),
        }
    }
}

/// Link queue discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QueueType {
    #[default]
    DropTail,
    Red,
    Fq,
    Sfq,
}

impl FromStr for QueueType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "droptail" => Ok(Self::DropTail),
            "red" => Ok(Self::Red),
            "fq" => Ok(Self::Fq),
            "sfq" => Ok(Self::Sfq),
            _ => Err(ValidationError::UnknownOption {
                field: "queue_type",
                value: s.to_string(),
            }),
        }
    }
}

/// Application generating traffic over the transport agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ApplicationKind {
    #[default]
    Ftp,
    Cbr,
    Telnet,
    Exponential,
}

impl FromStr for ApplicationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ftp" => Ok(Self::Ftp),
            "cbr" => Ok(Self::Cbr),
            "telnet" => Ok(Self::Telnet),
            "exponential" => Ok(Self::Exponential),
            _ => Err(ValidationError::UnknownOption {
                field: "application",
                value: s.to_string(),
            }),
        }
    }
}

/// Validated simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Simulated duration in seconds.
    pub sim_time: f64,
    /// Link bandwidth, e.g. `100.0Mb`.
    pub bandwidth: String,
    /// Link delay, e.g. `10ms`.
    pub delay: String,
    pub protocol: TransportProtocol,
    pub queue_type: QueueType,
    pub application: ApplicationKind,
    /// Packet size in bytes.
    pub packet_size: u32,
    /// Application data rate, e.g. `1Mb`.
    pub data_rate: String,
    pub enable_tracing: bool,
    pub enable_nam: bool,
    pub enable_dataset: bool,
    pub dataset_packet_count: u32,
    pub dataset_scenario: String,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            sim_time: 10.0,
            bandwidth: "100.0Mb".to_string(),
            delay: "10ms".to_string(),
            protocol: TransportProtocol::default(),
            queue_type: QueueType::default(),
            application: ApplicationKind::default(),
            packet_size: 1000,
            data_rate: "1Mb".to_string(),
            enable_tracing: true,
            enable_nam: true,
            enable_dataset: false,
            dataset_packet_count: 100,
            dataset_scenario: "Normal Traffic".to_string(),
        }
    }
}

/// Raw, unvalidated settings as typed by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsForm {
    pub sim_time: String,
    pub bandwidth: String,
    pub delay: String,
    pub protocol: String,
    pub queue_type: String,
    pub application: String,
    pub packet_size: String,
    pub data_rate: String,
    pub enable_tracing: bool,
    pub enable_nam: bool,
    pub enable_dataset: bool,
    pub dataset_packet_count: String,
    pub dataset_scenario: String,
}

impl Default for SettingsForm {
    fn default() -> Self {
        Self {
            sim_time: "10.0".to_string(),
            bandwidth: "100.0Mb".to_string(),
            delay: "10ms".to_string(),
            protocol: "TCP".to_string(),
            queue_type: "DropTail".to_string(),
            application: "FTP".to_string(),
            packet_size: "1000".to_string(),
            data_rate: "1Mb".to_string(),
            enable_tracing: true,
            enable_nam: true,
            enable_dataset: false,
            dataset_packet_count: "100".to_string(),
            dataset_scenario: "Normal Traffic".to_string(),
        }
    }
}

const RATE_UNITS: &[&str] = &["Gb", "Mb", "Kb", "b"];
const DELAY_UNITS: &[&str] = &["ms", "us", "s"];

impl SettingsForm {
    /// Validate every field and produce settings.
    pub fn parse(&self) -> Result<SimulationSettings, ValidationError> {
        let sim_time = parse_number::<f64>("sim_time", &self.sim_time)?;
        if !sim_time.is_finite() || sim_time <= 0.0 {
            return Err(ValidationError::OutOfRange {
                field: "sim_time",
                reason: format!("must be a positive number of seconds, got {}", sim_time),
            });
        }

        let packet_size = parse_number::<u32>("packet_size", &self.packet_size)?;
        if packet_size == 0 {
            return Err(ValidationError::OutOfRange {
                field: "packet_size",
                reason: "must be at least 1 byte".to_string(),
            });
        }

        let dataset_packet_count = if self.enable_dataset {
            let count = parse_number::<u32>("dataset_packet_count", &self.dataset_packet_count)?;
            if count == 0 {
                return Err(ValidationError::OutOfRange {
                    field: "dataset_packet_count",
                    reason: "must be at least 1 when dataset generation is enabled".to_string(),
                });
            }
            count
        } else {
            SimulationSettings::default().dataset_packet_count
        };

        Ok(SimulationSettings {
            sim_time,
            bandwidth: check_unit("bandwidth", &self.bandwidth, RATE_UNITS, "Gb/Mb/Kb/b")?,
            delay: check_unit("delay", &self.delay, DELAY_UNITS, "ms/us/s")?,
            protocol: self.protocol.parse()?,
            queue_type: self.queue_type.parse()?,
            application: self.application.parse()?,
            packet_size,
            data_rate: check_unit("data_rate", &self.data_rate, RATE_UNITS, "Gb/Mb/Kb/b")?,
            enable_tracing: self.enable_tracing,
            enable_nam: self.enable_nam,
            enable_dataset: self.enable_dataset,
            dataset_packet_count,
            dataset_scenario: self.dataset_scenario.trim().to_string(),
        })
    }
}

fn parse_number<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ValidationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

/// Accept `<positive number><unit>` and return the trimmed text.
fn check_unit(
    field: &'static str,
    raw: &str,
    units: &[&str],
    units_label: &'static str,
) -> Result<String, ValidationError> {
    let value = raw.trim();
    let bad_unit = || ValidationError::BadUnit {
        field,
        value: raw.to_string(),
        units: units_label,
    };

    let number = units
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .ok_or_else(bad_unit)?;
    let magnitude: f64 = number.parse().map_err(|_| bad_unit())?;
    if !magnitude.is_finite() || magnitude <= 0.0 {
        return Err(ValidationError::OutOfRange {
            field,
            reason: format!("must be positive, got {}", magnitude),
        });
    }
    Ok(value.to_string())
}
