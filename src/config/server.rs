//! Server configuration types.
//!
//! This module defines the listener configuration (address, port, optional
//! metrics endpoint) and the log output format.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_ADDRESS, DEFAULT_PORT};

fn default_address() -> String {
    DEFAULT_ADDRESS.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_address")]
    pub address: String,
    /// Port 0 binds an ephemeral port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path answering with Prometheus metrics instead of being proxied
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics_path: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            port: default_port(),
            metrics_path: None,
        }
    }
}

impl ServerConfig {
    /// `address:port` to bind
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.address.trim().is_empty() {
            return Err("server.address cannot be empty".to_string());
        }
        if let Some(path) = &self.metrics_path {
            if !path.starts_with('/') {
                return Err(format!(
                    "server.metrics_path '{}' must start with /",
                    path
                ));
            }
        }
        Ok(())
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}
