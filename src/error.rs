//! Error types for the fleet simulation.

use std::sync::Arc;

use thiserror::Error;

use crate::types::{RobotId, VertexId};

#[derive(Error, Debug, Clone)]
pub enum FleetError {
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("No path found between {start} and {goal}")]
    NoPathFound { start: VertexId, goal: VertexId },

    #[error("Rendering unavailable: {0}")]
    RenderingUnavailable(String),

    #[error("Click does not resolve to any vertex")]
    UnresolvableClick,

    #[error("Unknown robot {0}")]
    UnknownRobot(RobotId),

    #[error("Robot {0} no longer accepts destinations")]
    QueueClosed(RobotId),

    #[error("No robot is armed for assignment")]
    NothingArmed,

    #[error("Graph source error: {0}")]
    GraphSource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<std::io::Error> for FleetError {
    fn from(e: std::io::Error) -> Self {
        FleetError::Io(Arc::new(e))
    }
}

impl From<serde_json::Error> for FleetError {
    fn from(e: serde_json::Error) -> Self {
        FleetError::GraphSource(e.to_string())
    }
}

impl From<toml::de::Error> for FleetError {
    fn from(e: toml::de::Error) -> Self {
        FleetError::Config(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FleetError>;
