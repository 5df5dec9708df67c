//! Plugin handshake with the host process
//!
//! The host launches the provider with a magic cookie in the environment and
//! the list of app protocol versions it speaks. The provider answers with a
//! single line on stdout:
//!
//! ```text
//! CORE-PROTOCOL-VERSION|APP-PROTOCOL-VERSION|NETWORK|ADDRESS|PROTOCOL
//! ```

use crate::error::{PluginError, Result};
use serde::Serialize;
use std::io::Write;

pub const MAGIC_COOKIE_KEY: &str = "TF_PLUGIN_MAGIC_COOKIE";
pub const MAGIC_COOKIE_VALUE: &str =
    "d602bf8f470bc67ca7faa0386276bbdd4330efaf76d1a219cb4d6991ca9872b2";

pub const ENV_PROTOCOL_VERSIONS: &str = "PLUGIN_PROTOCOL_VERSIONS";

pub const CORE_PROTOCOL_VERSION: u32 = 1;

/// Name of the wire protocol spoken on accepted connections
pub const WIRE_PROTOCOL: &str = "jsonl";

/// Verify the host handed us the expected magic cookie
pub fn check_magic_cookie(value: Option<&str>) -> Result<()> {
    match value {
        Some(v) if v == MAGIC_COOKIE_VALUE => Ok(()),
        _ => Err(PluginError::NotLaunchedByHost),
    }
}

/// Pick the highest app protocol version both sides support.
///
/// Without a host list the provider's own highest version is used. Entries
/// that don't parse are skipped.
pub fn negotiate_version(host: Option<&str>, supported: &[u32]) -> Result<u32> {
    let Some(host) = host.filter(|h| !h.trim().is_empty()) else {
        return supported.iter().copied().max().ok_or_else(|| {
            PluginError::InvalidConfig("provider declares no protocol versions".to_string())
        });
    };

    let host_versions: Vec<u32> = host
        .split(',')
        .filter_map(|s| match s.trim().parse::<u32>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid plugin protocol version from host: {:?}", s);
                None
            }
        })
        .collect();

    supported
        .iter()
        .copied()
        .filter(|v| host_versions.contains(v))
        .max()
        .ok_or_else(|| PluginError::UnsupportedProtocol {
            host: host_versions,
            provider: supported.to_vec(),
        })
}

/// Transport the plugin listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Unix,
    Tcp,
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::Unix => write!(f, "unix"),
            Network::Tcp => write!(f, "tcp"),
        }
    }
}

/// The negotiated handshake announced to the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Handshake {
    pub core_version: u32,
    pub app_version: u32,
    pub network: Network,
    pub address: String,
    pub protocol: String,
}

impl Handshake {
    pub fn new(app_version: u32, network: Network, address: impl Into<String>) -> Self {
        Self {
            core_version: CORE_PROTOCOL_VERSION,
            app_version,
            network,
            address: address.into(),
            protocol: WIRE_PROTOCOL.to_string(),
        }
    }

    /// Write the handshake line and flush, so the host sees it immediately
    pub fn announce<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "{}", self)?;
        out.flush()?;
        Ok(())
    }

    /// `TF_REATTACH_PROVIDERS` payload for debug serving
    pub fn reattach_config(&self, provider_address: &str, pid: u32) -> serde_json::Value {
        serde_json::json!({
            provider_address: {
                "Protocol": self.protocol,
                "ProtocolVersion": self.app_version,
                "Pid": pid,
                "Test": true,
                "Addr": {
                    "Network": self.network,
                    "String": self.address,
                }
            }
        })
    }

    /// Human-readable instructions printed instead of the handshake in debug mode
    pub fn announce_debug<W: Write>(&self, out: &mut W, provider_address: &str) -> Result<()> {
        let config = self.reattach_config(provider_address, std::process::id());
        writeln!(
            out,
            "Provider started. To attach Terraform CLI, set the TF_REATTACH_PROVIDERS \
            environment variable with the following:\n"
        )?;
        writeln!(out, "\tTF_REATTACH_PROVIDERS='{}'", serde_json::to_string(&config)?)?;
        out.flush()?;
        Ok(())
    }
}

impl std::fmt::Display for Handshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}|{}|{}|{}|{}",
            self.core_version, self.app_version, self.network, self.address, self.protocol
        )
    }
}
