//! Per-robot sequential consumption of queued destinations.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::{FleetError, Result};
use crate::graph::NavigationGraph;
use crate::logging::FleetLog;
use crate::movement::MovementExecutor;
use crate::planner::PathPlanner;
use crate::registry::RobotHandle;
use crate::types::VertexId;
use crate::{fleet_info, fleet_warn};

/// Fleet-wide task counters.
#[derive(Debug, Default)]
pub struct FleetStats {
    paths_completed: AtomicUsize,
    tasks_skipped: AtomicUsize,
}

impl FleetStats {
    pub fn paths_completed(&self) -> usize {
        self.paths_completed.load(Ordering::SeqCst)
    }

    pub fn tasks_skipped(&self) -> usize {
        self.tasks_skipped.load(Ordering::SeqCst)
    }
}

/// Destinations handled by one drain.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub reached: Vec<VertexId>,
    pub skipped: Vec<VertexId>,
}

pub struct TaskQueueProcessor {
    graph: Arc<NavigationGraph>,
    planner: Arc<dyn PathPlanner>,
    executor: MovementExecutor,
    stats: Arc<FleetStats>,
    log: FleetLog,
}

impl TaskQueueProcessor {
    pub fn new(
        graph: Arc<NavigationGraph>,
        planner: Arc<dyn PathPlanner>,
        executor: MovementExecutor,
        log: FleetLog,
    ) -> Self {
        Self {
            graph,
            planner,
            executor,
            stats: Arc::new(FleetStats::default()),
            log,
        }
    }

    /// The executor paths are handed to.
    pub fn executor(&self) -> &MovementExecutor {
        &self.executor
    }

    /// Counters updated as destinations are reached or skipped.
    pub fn stats(&self) -> Arc<FleetStats> {
        Arc::clone(&self.stats)
    }

    /// Process the robot's queue until it is empty.
    ///
    /// Destinations with no route are dropped with a warning; anything else that
    /// fails stops the drain and is returned.
    pub fn drain(&self, robot: &RobotHandle) -> Result<DrainReport> {
        let _driving = robot.drive();
        let mut report = DrainReport::default();
        while let Some(destination) = robot.pop_destination() {
            self.process(robot, destination, &mut report)?;
        }
        Ok(report)
    }

    /// Block on the robot's queue, processing destinations as they arrive, until the
    /// queue is closed and empty.
    pub fn run_worker(&self, robot: &RobotHandle) -> Result<DrainReport> {
        let mut report = DrainReport::default();
        while let Some(destination) = robot.wait_destination() {
            let _driving = robot.drive();
            self.process(robot, destination, &mut report)?;
        }
        Ok(report)
    }

    fn process(
        &self,
        robot: &RobotHandle,
        destination: VertexId,
        report: &mut DrainReport,
    ) -> Result<()> {
        let start = robot.current_vertex();
        match self.planner.shortest_path(&self.graph, start, destination) {
            Ok(path) => {
                fleet_info!(
                    self.log,
                    "Computed shortest path from {start} to {destination}: {path:?}"
                );
                self.executor.execute(robot, &path)?;
                self.stats.paths_completed.fetch_add(1, Ordering::SeqCst);
                report.reached.push(destination);
            }
            Err(FleetError::NoPathFound { .. }) => {
                fleet_warn!(self.log, "No path found between {start} and {destination}");
                fleet_warn!(
                    self.log,
                    "Skipping task for robot {} due to no valid path.",
                    robot.id()
                );
                self.stats.tasks_skipped.fetch_add(1, Ordering::SeqCst);
                report.skipped.push(destination);
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Lane, VertexData};
    use crate::logging::MemoryLogSink;
    use crate::planner::BreadthFirstPlanner;
    use crate::registry::RobotRegistry;
    use crate::render::TextRenderer;
    use crate::types::RobotStatus;
    use std::sync::Mutex;
    use std::thread;
    use std::time::Duration;

    /// Records every planning request before delegating to BFS.
    #[derive(Default)]
    struct RecordingPlanner {
        calls: Mutex<Vec<(VertexId, VertexId)>>,
    }

    impl PathPlanner for RecordingPlanner {
        fn shortest_path(
            &self,
            graph: &NavigationGraph,
            start: VertexId,
            goal: VertexId,
        ) -> Result<Vec<VertexId>> {
            self.calls
                .lock()
                .expect("calls mutex poisoned")
                .push((start, goal));
            BreadthFirstPlanner.shortest_path(graph, start, goal)
        }
    }

    /// 0 - 1 - 2 - 3 and an island 4 - 5.
    fn graph() -> Arc<NavigationGraph> {
        let vertices = (0..6).map(|i| VertexData::new(i as f64, 0.0)).collect();
        let lanes = vec![
            Lane::new(0, 1),
            Lane::new(1, 2),
            Lane::new(2, 3),
            Lane::new(4, 5),
        ];
        Arc::new(NavigationGraph::load(vertices, lanes).expect("valid graph"))
    }

    fn processor(
        planner: Arc<dyn PathPlanner>,
        sink: Arc<MemoryLogSink>,
    ) -> TaskQueueProcessor {
        let graph = graph();
        let log = FleetLog::new().with_sink(sink);
        let executor = MovementExecutor::new(
            Arc::clone(&graph),
            Arc::new(TextRenderer::new(std::io::sink())),
            Duration::ZERO,
            log.clone(),
        );
        TaskQueueProcessor::new(graph, planner, executor, log)
    }

    #[test]
    fn drains_in_fifo_order() {
        let planner = Arc::new(RecordingPlanner::default());
        let processor = processor(planner.clone(), Arc::new(MemoryLogSink::new()));
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(0);
        robot.enqueue(2).expect("enqueue");
        robot.enqueue(3).expect("enqueue");

        let report = processor.drain(&robot).expect("drain");

        assert_eq!(report.reached, vec![2, 3]);
        assert_eq!(
            *planner.calls.lock().expect("calls mutex poisoned"),
            vec![(0, 2), (2, 3)]
        );
        assert_eq!(robot.current_vertex(), 3);
        assert_eq!(robot.status(), RobotStatus::Idle);
        assert_eq!(processor.stats().paths_completed(), 2);
    }

    #[test]
    fn unreachable_destination_is_skipped_and_drain_continues() {
        let sink = Arc::new(MemoryLogSink::new());
        let processor = processor(Arc::new(BreadthFirstPlanner), sink.clone());
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(1);
        robot.enqueue(5).expect("enqueue");
        robot.enqueue(0).expect("enqueue");

        let report = processor.drain(&robot).expect("drain");

        assert_eq!(report.skipped, vec![5]);
        assert_eq!(report.reached, vec![0]);
        assert_eq!(robot.current_vertex(), 0);
        assert!(sink.contains("WARNING: No path found between 1 and 5"));
        assert!(sink.contains("Skipping task for robot 1 due to no valid path."));
        assert_eq!(processor.stats().tasks_skipped(), 1);
    }

    #[test]
    fn skipped_task_leaves_robot_untouched() {
        let processor = processor(Arc::new(BreadthFirstPlanner), Arc::new(MemoryLogSink::new()));
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(2);
        robot.enqueue(4).expect("enqueue");

        processor.drain(&robot).expect("drain");

        assert_eq!(robot.current_vertex(), 2);
        assert_eq!(robot.status(), RobotStatus::Idle);
        assert_eq!(robot.pending(), 0);
    }

    #[test]
    fn worker_drains_until_queue_closes() {
        let processor = Arc::new(processor(
            Arc::new(BreadthFirstPlanner),
            Arc::new(MemoryLogSink::new()),
        ));
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(0);

        let worker = {
            let processor = Arc::clone(&processor);
            let robot = Arc::clone(&robot);
            thread::spawn(move || processor.run_worker(&robot))
        };
        robot.enqueue(3).expect("enqueue");
        robot.enqueue(1).expect("enqueue");
        robot.close_queue();

        let report = worker
            .join()
            .expect("worker panicked")
            .expect("worker result");
        assert_eq!(report.reached, vec![3, 1]);
        assert_eq!(robot.current_vertex(), 1);
    }
}
