//! Fleet simulation engine: robots on a fixed navigation graph, driven by operator
//! clicks that spawn robots and queue destinations for them.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod fleet;
pub mod graph;
pub mod graph_file;
pub mod logging;
pub mod movement;
pub mod planner;
pub mod processor;
pub mod registry;
pub mod render;
pub mod sim;
pub mod task_queue;
pub mod types;

pub use config::{ExecutionMode, FleetConfig};
pub use dispatcher::{Command, CommandDispatcher, Outcome};
pub use error::{FleetError, Result};
pub use fleet::Fleet;
pub use graph::{Lane, NavigationGraph, Vertex, VertexData, VertexKind};
pub use logging::{FleetLog, LogSink};
pub use planner::{BreadthFirstPlanner, PathPlanner};
pub use registry::Robot;
pub use render::{Renderer, RobotFrame, TextRenderer};
pub use types::{Color, Point, RobotId, RobotStatus, VertexId};
