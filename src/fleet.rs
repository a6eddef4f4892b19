//! The simulation engine: shared graph, robot registry, and the queue processor
//! driven either inline or by one worker thread per robot.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::{ExecutionMode, SimulationConfig};
use crate::error::{FleetError, Result};
use crate::fleet_info;
use crate::graph::NavigationGraph;
use crate::logging::FleetLog;
use crate::movement::MovementExecutor;
use crate::planner::PathPlanner;
use crate::processor::{FleetStats, TaskQueueProcessor};
use crate::registry::{Robot, RobotHandle, RobotRegistry};
use crate::render::Renderer;
use crate::types::{RobotId, VertexId};

/// Robots on a shared navigation graph, each working through its own queue.
///
/// A renderer failure is fatal: once any robot hits one, every later command and
/// `shutdown` report that same error.
pub struct Fleet {
    graph: Arc<NavigationGraph>,
    registry: Arc<RobotRegistry>,
    processor: Arc<TaskQueueProcessor>,
    mode: ExecutionMode,
    workers: Mutex<Vec<JoinHandle<()>>>,
    fault: Arc<Mutex<Option<FleetError>>>,
    log: FleetLog,
}

impl Fleet {
    /// Build a fleet and render the static map once.
    pub fn new(
        graph: Arc<NavigationGraph>,
        planner: Arc<dyn PathPlanner>,
        renderer: Arc<dyn Renderer>,
        config: &SimulationConfig,
        log: FleetLog,
    ) -> Result<Self> {
        renderer.render_graph(&graph)?;
        let executor = MovementExecutor::new(
            Arc::clone(&graph),
            renderer,
            config.pacing(),
            log.clone(),
        );
        let processor = TaskQueueProcessor::new(Arc::clone(&graph), planner, executor, log.clone());
        let registry = match config.color_seed {
            Some(seed) => RobotRegistry::with_color_seed(seed),
            None => RobotRegistry::new(),
        };
        tracing::debug!(
            vertices = graph.len(),
            lanes = graph.lanes().len(),
            mode = ?config.mode,
            "fleet ready"
        );
        Ok(Self {
            graph,
            registry: Arc::new(registry),
            processor: Arc::new(processor),
            mode: config.mode,
            workers: Mutex::new(Vec::new()),
            fault: Arc::new(Mutex::new(None)),
            log,
        })
    }

    /// The navigation graph robots move on.
    pub fn graph(&self) -> &NavigationGraph {
        &self.graph
    }

    /// Counters shared with the queue processor.
    pub fn stats(&self) -> Arc<FleetStats> {
        self.processor.stats()
    }

    /// Snapshot of one robot.
    pub fn robot(&self, id: RobotId) -> Result<Robot> {
        Ok(self.registry.get(id)?.snapshot())
    }

    /// Snapshots of every robot in id order.
    pub fn robots(&self) -> Vec<Robot> {
        self.registry.snapshot()
    }

    /// Create an idle robot at `vertex` and draw it there.
    ///
    /// If the robot cannot be drawn or started, its queue is closed and the failure
    /// becomes the fleet's fault.
    pub fn spawn_robot(&self, vertex: VertexId) -> Result<RobotId> {
        self.check_fault()?;
        if !self.graph.contains(vertex) {
            return Err(FleetError::InvalidTopology(format!(
                "cannot spawn at unknown vertex {vertex}"
            )));
        }
        let robot = self.registry.spawn(vertex);
        fleet_info!(
            self.log,
            "Spawned robot {} at node {} with color {}",
            robot.id(),
            vertex,
            robot.color()
        );
        let started = self.processor.executor().redraw(&robot).and_then(|()| {
            match self.mode {
                ExecutionMode::Threaded => self.start_worker(Arc::clone(&robot)),
                ExecutionMode::Inline => Ok(()),
            }
        });
        if let Err(e) = started {
            record_fault(&self.fault, &e);
            robot.close_queue();
            return Err(e);
        }
        Ok(robot.id())
    }

    /// Append `destination` to the robot's queue.
    ///
    /// Inline mode drains the whole queue before returning; in threaded mode the
    /// robot's worker picks the destination up.
    pub fn assign(&self, robot: RobotId, destination: VertexId) -> Result<()> {
        self.check_fault()?;
        let handle = self.registry.get(robot)?;
        // A worker that failed meanwhile has closed its queue after recording why.
        handle
            .enqueue(destination)
            .map_err(|e| self.fault().unwrap_or(e))?;
        fleet_info!(self.log, "Added task for robot {robot}: Move to {destination}");
        if self.mode == ExecutionMode::Inline {
            // A drain running on another thread holds the robot's driver lock; this
            // one waits for it and picks up whatever is left.
            if let Err(e) = self.processor.drain(&handle) {
                record_fault(&self.fault, &e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Close every robot queue, wait for workers to finish what is queued, and
    /// report the fleet's fault if one occurred.
    pub fn shutdown(&self) -> Result<()> {
        for robot in self.registry.handles() {
            robot.close_queue();
        }
        let workers: Vec<_> = self
            .workers
            .lock()
            .expect("worker list mutex poisoned")
            .drain(..)
            .collect();
        for worker in workers {
            let name = worker.thread().name().unwrap_or("robot").to_string();
            if worker.join().is_err() {
                tracing::error!("{name} worker thread panicked");
            }
        }
        self.check_fault()
    }

    fn fault(&self) -> Option<FleetError> {
        self.fault.lock().expect("fault mutex poisoned").clone()
    }

    fn check_fault(&self) -> Result<()> {
        match self.fault() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn start_worker(&self, robot: Arc<RobotHandle>) -> Result<()> {
        let processor = Arc::clone(&self.processor);
        let fault = Arc::clone(&self.fault);
        let handle = thread::Builder::new()
            .name(format!("robot-{}", robot.id()))
            .spawn(move || match processor.run_worker(&robot) {
                Ok(report) => tracing::debug!(
                    robot = robot.id(),
                    reached = report.reached.len(),
                    skipped = report.skipped.len(),
                    "worker finished"
                ),
                Err(e) => {
                    tracing::error!(robot = robot.id(), "robot worker stopped: {e}");
                    record_fault(&fault, &e);
                    robot.close_queue();
                }
            })?;
        self.workers
            .lock()
            .expect("worker list mutex poisoned")
            .push(handle);
        Ok(())
    }
}

/// Keep the first fatal error; later ones are only logged by their reporters.
fn record_fault(fault: &Mutex<Option<FleetError>>, error: &FleetError) {
    fault
        .lock()
        .expect("fault mutex poisoned")
        .get_or_insert_with(|| error.clone());
}

impl Drop for Fleet {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            tracing::debug!("fleet dropped after failure: {e}");
        }
    }
}
