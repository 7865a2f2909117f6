//! Daemon configuration
//!
//! The session section is handed to every engine unchanged; the other
//! sections only concern the daemon.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use d20_engine::SessionConfig;
use serde::{Deserialize, Serialize};
use v2g_proto::{ExiCodec, JsonCodec};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvsedConfig {
    #[serde(default)]
    pub listener: ListenerConfig,

    #[serde(default)]
    pub codec: CodecKind,

    #[serde(default)]
    pub simulator: SimulatorConfig,

    #[serde(default)]
    pub session: SessionConfig,
}

impl EvsedConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListenerConfig {
    #[serde(default = "default_address")]
    pub address: SocketAddr,

    /// Largest V2GTP payload accepted from the EV
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: u32,
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 15118))
}

fn default_max_payload() -> u32 {
    64 * 1024
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            max_payload_bytes: default_max_payload(),
        }
    }
}

/// Payload encoding spoken on the socket
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodecKind {
    /// JSON documents, for development against simulated EVs
    #[default]
    Json,
}

impl CodecKind {
    pub fn build(self) -> Arc<dyn ExiCodec> {
        match self {
            CodecKind::Json => Arc::new(JsonCodec),
        }
    }
}

/// Simulated charger hardware
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Delay before EIM authorization is accepted (ms)
    #[serde(default = "default_authorization_delay")]
    pub authorization_delay_ms: u64,

    /// Duration of the isolation test (ms)
    #[serde(default = "default_cable_check_delay")]
    pub cable_check_delay_ms: u64,

    /// Time for the contactors to close (ms)
    #[serde(default = "default_contactor_delay")]
    pub contactor_delay_ms: u64,

    /// Current reported while charging (A)
    #[serde(default = "default_current")]
    pub charge_current_a: f32,
}

fn default_authorization_delay() -> u64 {
    2_000
}

fn default_cable_check_delay() -> u64 {
    1_500
}

fn default_contactor_delay() -> u64 {
    200
}

fn default_current() -> f32 {
    100.0
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            authorization_delay_ms: default_authorization_delay(),
            cable_check_delay_ms: default_cable_check_delay(),
            contactor_delay_ms: default_contactor_delay(),
            charge_current_a: default_current(),
        }
    }
}
