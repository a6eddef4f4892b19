//! End-to-end behaviour of the engine through the public API.

use std::sync::{Arc, Mutex};

use fleet_sim::config::SimulationConfig;
use fleet_sim::logging::MemoryLogSink;
use fleet_sim::{
    BreadthFirstPlanner, CommandDispatcher, ExecutionMode, Fleet, FleetError, FleetLog, Lane,
    NavigationGraph, Outcome, PathPlanner, Point, Renderer, RobotFrame, RobotStatus, VertexData,
    VertexId,
};

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
    ) -> fleet_sim::Result<Vec<VertexId>> {
        self.calls.lock().expect("calls mutex poisoned").push((start, goal));
        BreadthFirstPlanner.shortest_path(graph, start, goal)
    }
}

#[derive(Default)]
struct RecordingRenderer {
    graphs: Mutex<usize>,
    frames: Mutex<Vec<RobotFrame>>,
}

impl RecordingRenderer {
    fn frames(&self) -> Vec<RobotFrame> {
        self.frames.lock().expect("frames mutex poisoned").clone()
    }
}

impl Renderer for RecordingRenderer {
    fn render_graph(&self, _graph: &NavigationGraph) -> fleet_sim::Result<()> {
        *self.graphs.lock().expect("graphs mutex poisoned") += 1;
        Ok(())
    }

    fn draw_robot(&self, frame: &RobotFrame) -> fleet_sim::Result<()> {
        self.frames.lock().expect("frames mutex poisoned").push(*frame);
        Ok(())
    }
}

/// Two components: A(0) - B(1) - C(2) - D(3) along y = 0, and E(4) - F(5) at y = 10.
fn two_islands() -> NavigationGraph {
    NavigationGraph::load(
        vec![
            VertexData::new(0.0, 0.0).named("A"),
            VertexData::new(1.0, 0.0),
            VertexData::new(2.0, 0.0),
            VertexData::new(3.0, 0.0).charging(),
            VertexData::new(0.0, 10.0),
            VertexData::new(1.0, 10.0),
        ],
        vec![Lane::new(0, 1), Lane::new(1, 2), Lane::new(2, 3), Lane::new(4, 5)],
    )
    .expect("valid graph")
}

struct Harness {
    fleet: Arc<Fleet>,
    planner: Arc<RecordingPlanner>,
    renderer: Arc<RecordingRenderer>,
    sink: Arc<MemoryLogSink>,
    log: FleetLog,
}

fn harness(mode: ExecutionMode) -> Harness {
    let planner = Arc::new(RecordingPlanner::default());
    let renderer = Arc::new(RecordingRenderer::default());
    let sink = Arc::new(MemoryLogSink::new());
    let log = FleetLog::new().with_sink(sink.clone());
    let config = SimulationConfig {
        pacing_ms: 0,
        mode,
        color_seed: Some(99),
    };
    let fleet = Fleet::new(
        Arc::new(two_islands()),
        planner.clone(),
        renderer.clone(),
        &config,
        log.clone(),
    )
    .expect("fleet");
    Harness {
        fleet: Arc::new(fleet),
        planner,
        renderer,
        sink,
        log,
    }
}

#[test]
fn static_graph_is_rendered_once() {
    let h = harness(ExecutionMode::Inline);
    assert_eq!(*h.renderer.graphs.lock().expect("graphs mutex poisoned"), 1);
}

#[test]
fn spawn_then_idle_at_nearest_vertex() {
    let h = harness(ExecutionMode::Inline);
    let mut dispatcher = CommandDispatcher::new(Arc::clone(&h.fleet), h.log.clone());
    let outcome = dispatcher.click(Some(Point::new(2.2, 0.4))).expect("click");
    assert_eq!(outcome, Outcome::Spawned { robot: 1, vertex: 2 });

    let robot = h.fleet.robot(1).expect("robot");
    assert_eq!(robot.current_vertex, 2);
    assert_eq!(robot.status, RobotStatus::Idle);
    assert!(robot.queue.is_empty());
    assert!(h.sink.contains("Spawned robot 1 at node 2 with color #"));
}

#[test]
fn queued_destinations_drain_in_order() {
    let h = harness(ExecutionMode::Inline);
    let id = h.fleet.spawn_robot(0).expect("spawn");
    h.fleet.assign(id, 1).expect("assign B");
    h.fleet.assign(id, 3).expect("assign D");

    let robot = h.fleet.robot(id).expect("robot");
    assert_eq!(robot.current_vertex, 3);
    assert_eq!(robot.status, RobotStatus::Idle);
    assert_eq!(
        *h.planner.calls.lock().expect("calls mutex poisoned"),
        vec![(0, 1), (1, 3)]
    );
}

#[test]
fn unreachable_destination_is_skipped_without_moving() {
    let h = harness(ExecutionMode::Inline);
    let id = h.fleet.spawn_robot(1).expect("spawn");
    h.fleet.assign(id, 5).expect("assign");

    let robot = h.fleet.robot(id).expect("robot");
    assert_eq!(robot.current_vertex, 1);
    assert_eq!(robot.status, RobotStatus::Idle);
    assert!(h.sink.contains("WARNING: No path found between 1 and 5"));
    assert_eq!(h.fleet.stats().tasks_skipped(), 1);

    // Later destinations are still attempted.
    h.fleet.assign(id, 3).expect("assign");
    assert_eq!(h.fleet.robot(id).expect("robot").current_vertex, 3);
}

#[test]
fn threaded_worker_keeps_going_after_a_skip() {
    let h = harness(ExecutionMode::Threaded);
    let id = h.fleet.spawn_robot(0).expect("spawn");
    h.fleet.assign(id, 4).expect("assign unreachable");
    h.fleet.assign(id, 2).expect("assign reachable");
    h.fleet.shutdown().expect("shutdown");

    assert_eq!(h.fleet.robot(id).expect("robot").current_vertex, 2);
    assert_eq!(
        *h.planner.calls.lock().expect("calls mutex poisoned"),
        vec![(0, 4), (0, 2)]
    );
}

#[test]
fn single_vertex_assignment_redraws_once() {
    let h = harness(ExecutionMode::Inline);
    let id = h.fleet.spawn_robot(2).expect("spawn");
    let drawn_at_spawn = h.renderer.frames().len();
    h.fleet.assign(id, 2).expect("assign");

    let frames = h.renderer.frames();
    assert_eq!(frames.len(), drawn_at_spawn + 1);
    assert_eq!(frames.last().map(|f| f.vertex), Some(2));
    let robot = h.fleet.robot(id).expect("robot");
    assert_eq!(robot.current_vertex, 2);
    assert_eq!(robot.status, RobotStatus::Idle);
}

#[test]
fn every_leg_is_drawn_in_order() {
    let h = harness(ExecutionMode::Inline);
    let id = h.fleet.spawn_robot(0).expect("spawn");
    h.fleet.assign(id, 3).expect("assign");
    let visited: Vec<VertexId> = h.renderer.frames().iter().map(|f| f.vertex).collect();
    // Spawn marker, then one redraw per path vertex.
    assert_eq!(visited, vec![0, 0, 1, 2, 3]);
}

#[test]
fn assignment_always_disarms() {
    let h = harness(ExecutionMode::Inline);
    let mut dispatcher = CommandDispatcher::new(Arc::clone(&h.fleet), h.log.clone());

    dispatcher.click(Some(Point::new(0.0, 0.0))).expect("spawn");
    dispatcher.click(Some(Point::new(0.0, 10.0))).expect("unreachable assign");
    assert_eq!(dispatcher.armed(), None);

    dispatcher.click(Some(Point::new(0.0, 9.0))).expect("spawn");
    dispatcher.click(Some(Point::new(1.0, 10.0))).expect("reachable assign");
    assert_eq!(dispatcher.armed(), None);
    assert_eq!(h.fleet.robot(2).expect("robot").current_vertex, 5);
}

#[test]
fn robots_may_share_a_vertex() {
    let h = harness(ExecutionMode::Inline);
    let a = h.fleet.spawn_robot(0).expect("spawn");
    let b = h.fleet.spawn_robot(3).expect("spawn");
    h.fleet.assign(b, 0).expect("assign");
    assert_eq!(h.fleet.robot(a).expect("robot").current_vertex, 0);
    assert_eq!(h.fleet.robot(b).expect("robot").current_vertex, 0);
}

#[test]
fn invalid_topology_never_builds_a_fleet() {
    let result = NavigationGraph::load(vec![VertexData::new(0.0, 0.0)], vec![Lane::new(0, 3)]);
    assert!(matches!(result, Err(FleetError::InvalidTopology(_))));
}
