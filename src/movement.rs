//! Turns a computed path into paced, per-vertex redraws and a final position update.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::error::{FleetError, Result};
use crate::fleet_info;
use crate::graph::NavigationGraph;
use crate::logging::FleetLog;
use crate::registry::RobotHandle;
use crate::render::{Renderer, RobotFrame};
use crate::types::VertexId;

pub struct MovementExecutor {
    graph: Arc<NavigationGraph>,
    renderer: Arc<dyn Renderer>,
    pacing: Duration,
    log: FleetLog,
}

impl MovementExecutor {
    pub fn new(
        graph: Arc<NavigationGraph>,
        renderer: Arc<dyn Renderer>,
        pacing: Duration,
        log: FleetLog,
    ) -> Self {
        Self {
            graph,
            renderer,
            pacing,
            log,
        }
    }

    /// Draw the robot at its current vertex without moving it.
    pub fn redraw(&self, robot: &RobotHandle) -> Result<()> {
        self.draw(robot, robot.current_vertex())
    }

    /// Walk `path` leg by leg, redrawing at every vertex including the first.
    ///
    /// The robot is `Moving` for the duration and ends `Idle` at the last vertex.
    /// A renderer failure stops the walk; the robot keeps its previous vertex.
    pub fn execute(&self, robot: &RobotHandle, path: &[VertexId]) -> Result<()> {
        let Some(&destination) = path.last() else {
            return Ok(());
        };

        robot.begin_path();
        fleet_info!(self.log, "Robot {} moving along path: {:?}", robot.id(), path);

        for &vertex in path {
            if let Err(e) = self.draw(robot, vertex) {
                robot.halt();
                tracing::error!(robot = robot.id(), vertex, "movement aborted: {e}");
                return Err(e);
            }
            if !self.pacing.is_zero() {
                thread::sleep(self.pacing);
            }
        }

        robot.finish_path(destination);
        fleet_info!(self.log, "Robot {} reached destination: {}", robot.id(), destination);
        Ok(())
    }

    fn draw(&self, robot: &RobotHandle, vertex: VertexId) -> Result<()> {
        let position = self
            .graph
            .vertex(vertex)
            .map(|v| v.position)
            .ok_or_else(|| {
                FleetError::InvalidTopology(format!("path references unknown vertex {vertex}"))
            })?;
        self.renderer.draw_robot(&RobotFrame {
            robot: robot.id(),
            vertex,
            position,
            color: robot.color(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Lane, VertexData};
    use crate::logging::MemoryLogSink;
    use crate::registry::RobotRegistry;
    use crate::types::RobotStatus;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        frames: Mutex<Vec<RobotFrame>>,
        fail_after: Option<usize>,
        calls: AtomicUsize,
    }

    impl Renderer for Recorder {
        fn render_graph(&self, _graph: &NavigationGraph) -> Result<()> {
            Ok(())
        }

        fn draw_robot(&self, frame: &RobotFrame) -> Result<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_after.is_some_and(|limit| call >= limit) {
                return Err(FleetError::RenderingUnavailable("window closed".into()));
            }
            self.frames.lock().expect("frames mutex poisoned").push(*frame);
            Ok(())
        }
    }

    fn line_graph() -> Arc<NavigationGraph> {
        let vertices = (0..4).map(|i| VertexData::new(i as f64, 0.0)).collect();
        let lanes = vec![Lane::new(0, 1), Lane::new(1, 2), Lane::new(2, 3)];
        Arc::new(NavigationGraph::load(vertices, lanes).expect("valid graph"))
    }

    #[test]
    fn redraws_every_vertex_and_lands_on_last() {
        let recorder = Arc::new(Recorder::default());
        let sink = Arc::new(MemoryLogSink::new());
        let executor = MovementExecutor::new(
            line_graph(),
            recorder.clone(),
            Duration::ZERO,
            FleetLog::new().with_sink(sink.clone()),
        );
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(0);

        executor.execute(&robot, &[0, 1, 2, 3]).expect("execute");

        let visited: Vec<VertexId> = recorder
            .frames
            .lock()
            .expect("frames mutex poisoned")
            .iter()
            .map(|f| f.vertex)
            .collect();
        assert_eq!(visited, vec![0, 1, 2, 3]);
        assert_eq!(robot.current_vertex(), 3);
        assert_eq!(robot.status(), RobotStatus::Idle);
        assert!(sink.contains("Robot 1 moving along path: [0, 1, 2, 3]"));
        assert!(sink.contains("Robot 1 reached destination: 3"));
    }

    #[test]
    fn single_vertex_path_draws_once_without_moving() {
        let recorder = Arc::new(Recorder::default());
        let executor =
            MovementExecutor::new(line_graph(), recorder.clone(), Duration::ZERO, FleetLog::new());
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(2);

        executor.execute(&robot, &[2]).expect("execute");

        assert_eq!(recorder.frames.lock().expect("frames mutex poisoned").len(), 1);
        assert_eq!(robot.current_vertex(), 2);
        assert_eq!(robot.status(), RobotStatus::Idle);
    }

    #[test]
    fn renderer_failure_is_fatal_and_keeps_position() {
        let recorder = Arc::new(Recorder {
            fail_after: Some(2),
            ..Recorder::default()
        });
        let executor =
            MovementExecutor::new(line_graph(), recorder.clone(), Duration::ZERO, FleetLog::new());
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(0);

        let result = executor.execute(&robot, &[0, 1, 2, 3]);

        assert!(matches!(result, Err(FleetError::RenderingUnavailable(_))));
        assert_eq!(robot.current_vertex(), 0);
        assert_eq!(robot.status(), RobotStatus::Idle);
    }

    #[test]
    fn empty_path_is_a_no_op() {
        let recorder = Arc::new(Recorder::default());
        let executor =
            MovementExecutor::new(line_graph(), recorder.clone(), Duration::ZERO, FleetLog::new());
        let registry = RobotRegistry::with_color_seed(1);
        let robot = registry.spawn(1);
        executor.execute(&robot, &[]).expect("execute");
        assert!(recorder.frames.lock().expect("frames mutex poisoned").is_empty());
        assert_eq!(robot.current_vertex(), 1);
    }
}
