//! Operator input: turns clicked points into spawn or assign commands and tracks
//! which robot is armed for the next assignment.

use std::sync::Arc;

use crate::error::{FleetError, Result};
use crate::fleet::Fleet;
use crate::fleet_info;
use crate::logging::FleetLog;
use crate::types::{Point, RobotId, VertexId};

/// An operator command, resolved against the graph when dispatched.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Create a robot at the vertex nearest the point and arm it.
    Spawn(Point),
    /// Send the armed robot to the vertex nearest the point, then disarm.
    Assign(Point),
}

/// What a dispatched click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The click could not be resolved; nothing changed.
    Ignored,
    Spawned { robot: RobotId, vertex: VertexId },
    Assigned { robot: RobotId, vertex: VertexId },
}

pub struct CommandDispatcher {
    fleet: Arc<Fleet>,
    armed: Option<RobotId>,
    log: FleetLog,
}

impl CommandDispatcher {
    pub fn new(fleet: Arc<Fleet>, log: FleetLog) -> Self {
        Self {
            fleet,
            armed: None,
            log,
        }
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    /// The robot the next click will be assigned to, if any.
    pub fn armed(&self) -> Option<RobotId> {
        self.armed
    }

    /// Handle one click. `None` or a non-finite point is a click outside the map.
    pub fn click(&mut self, point: Option<Point>) -> Result<Outcome> {
        let Some(point) = point.filter(Point::is_finite) else {
            return Ok(Outcome::Ignored);
        };
        let command = self.command_for(point);
        self.dispatch(command)
    }

    /// Spawn when nothing is armed, otherwise assign.
    pub fn command_for(&self, point: Point) -> Command {
        match self.armed {
            None => Command::Spawn(point),
            Some(_) => Command::Assign(point),
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Result<Outcome> {
        match command {
            Command::Spawn(point) => {
                let vertex = self.resolve(point)?;
                let robot = self.fleet.spawn_robot(vertex)?;
                self.armed = Some(robot);
                Ok(Outcome::Spawned { robot, vertex })
            }
            Command::Assign(point) => {
                let vertex = self.resolve(point)?;
                // Disarm before the drain so a failed assignment still clears it.
                let robot = self.armed.take().ok_or(FleetError::NothingArmed)?;
                self.fleet.assign(robot, vertex)?;
                Ok(Outcome::Assigned { robot, vertex })
            }
        }
    }

    fn resolve(&self, point: Point) -> Result<VertexId> {
        if !point.is_finite() || self.fleet.graph().is_empty() {
            return Err(FleetError::UnresolvableClick);
        }
        let vertex = self.fleet.graph().nearest_vertex(point);
        fleet_info!(self.log, "Clicked on node: {vertex}");
        Ok(vertex)
    }
}
