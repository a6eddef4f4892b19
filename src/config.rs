//! Configuration loading for the fleet simulator.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{FleetError, Result};

/// Main configuration structure. Every section may be omitted.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct FleetConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the navigation graph comes from.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphConfig {
    /// Path to the JSON graph file (default: data/nav_graph.json)
    #[serde(default = "default_graph_path")]
    pub path: String,

    /// Level to load; the first level in the file when unset
    #[serde(default)]
    pub level: Option<String>,
}

/// How robots are driven.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Movement blocks the caller; one robot animates at a time.
    #[default]
    Inline,
    /// Each robot drains its queue on its own worker thread.
    Threaded,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Delay after each redraw in milliseconds (default: 500)
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,

    #[serde(default)]
    pub mode: ExecutionMode,

    /// Seed for robot colors; random when unset
    #[serde(default)]
    pub color_seed: Option<u64>,
}

impl SimulationConfig {
    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoggingConfig {
    /// Mirror of operator-visible lines, truncated per run; "" disables it
    /// (default: logs/fleet_logs.txt)
    #[serde(default = "default_log_file")]
    pub log_file: Option<String>,

    /// Tracing filter used when RUST_LOG is unset (default: fleet_sim=info)
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            path: default_graph_path(),
            level: None,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            pacing_ms: default_pacing_ms(),
            mode: ExecutionMode::default(),
            color_seed: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            filter: default_filter(),
        }
    }
}

fn default_graph_path() -> String {
    "data/nav_graph.json".to_string()
}

fn default_pacing_ms() -> u64 {
    500
}

fn default_log_file() -> Option<String> {
    Some("logs/fleet_logs.txt".to_string())
}

fn default_filter() -> String {
    "fleet_sim=info".to_string()
}

impl FleetConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            FleetError::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
