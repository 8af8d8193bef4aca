//! Dashboard configuration.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LoadboardError, Result};
use crate::render::DEFAULT_DYGRAPH_SOURCE;

/// Process-wide dashboard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP listener binds to.
    pub bind: SocketAddr,
    /// Interval between periodic log snapshots and page refreshes, in
    /// milliseconds.
    pub refresh_period_ms: u64,
    /// Where rendered pages load the dygraph library from.
    pub dygraph_script_source: String,
    /// Results log file; a name derived from the start time is used when
    /// unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<String>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            refresh_period_ms: 2000,
            dygraph_script_source: DEFAULT_DYGRAPH_SOURCE.to_string(),
            log_file: None,
        }
    }
}

impl DashboardConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| LoadboardError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| LoadboardError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
