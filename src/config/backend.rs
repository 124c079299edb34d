//! Backend (origin) configuration types.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BACKEND_TIMEOUT_SECS;

fn default_timeout_secs() -> u64 {
    DEFAULT_BACKEND_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Origin as `host:port`; absent means cache-only mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Reach the origin over https
    #[serde(default)]
    pub tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            host: None,
            tls: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(host) = &self.host {
            if host.trim().is_empty() {
                return Err("backend.host cannot be empty when set".to_string());
            }
            if host.contains('/') {
                return Err(format!(
                    "backend.host '{}' must be host:port without scheme or path",
                    host
                ));
            }
        }
        if self.timeout_secs == 0 {
            return Err("backend.timeout_secs must be > 0".to_string());
        }
        Ok(())
    }
}
