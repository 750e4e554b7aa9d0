//! Server settings loaded from a YAML file.
//!
//! Every field has a default, so a partial file (or no file at all) is
//! valid. Command-line flags are applied on top by [`crate::cli::Cli`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::http::framer::FrameLimits;

/// Address family of the listening socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AddressFamily {
    /// IPv4
    #[default]
    Inet,
    /// IPv6
    Inet6,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub family: AddressFamily,
    /// Root directory scanned for resources
    pub files: PathBuf,
    /// Bind all interfaces instead of loopback only
    pub internet: bool,
    /// Upper bound on concurrently served connections
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 80,
            family: AddressFamily::Inet,
            files: PathBuf::from("./files"),
            internet: false,
            max_connections: 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_header_bytes: usize,
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = FrameLimits::default();
        Self {
            max_header_bytes: limits.max_header_bytes,
            max_body_bytes: limits.max_body_bytes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
    /// Alias path → canonical resource name
    pub resource_proxies: BTreeMap<String, String>,
}

impl Config {
    /// Reads `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "Settings file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        Self::from_yaml(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        // An empty document deserializes as null
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_connections == 0 {
            anyhow::bail!("max_connections must be >= 1");
        }
        if self.limits.max_header_bytes < 16 {
            anyhow::bail!("max_header_bytes must be >= 16");
        }
        if !self.server.files.is_dir() {
            anyhow::bail!(
                "files directory {} does not exist",
                self.server.files.display()
            );
        }
        Ok(())
    }

    pub fn frame_limits(&self) -> FrameLimits {
        FrameLimits {
            max_header_bytes: self.limits.max_header_bytes,
            max_body_bytes: self.limits.max_body_bytes,
        }
    }
}
