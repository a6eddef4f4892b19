//! Live robots, their per-robot state machine and destination queues.

use std::sync::{Arc, Mutex, MutexGuard};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{FleetError, Result};
use crate::task_queue::TaskQueue;
use crate::types::{Color, RobotId, RobotStatus, VertexId};

/// Point-in-time copy of a robot.
#[derive(Clone, Debug, PartialEq)]
pub struct Robot {
    pub id: RobotId,
    pub current_vertex: VertexId,
    pub status: RobotStatus,
    pub queue: Vec<VertexId>,
    pub color: Color,
}

struct RobotState {
    current_vertex: VertexId,
    status: RobotStatus,
}

/// Shared handle to one live robot.
///
/// The dispatcher appends to the queue, the processor pops from it, and only the
/// movement executor writes position and status.
pub struct RobotHandle {
    id: RobotId,
    color: Color,
    state: Mutex<RobotState>,
    queue: TaskQueue<VertexId>,
    driver: Mutex<()>,
}

impl RobotHandle {
    fn new(id: RobotId, vertex: VertexId, color: Color) -> Self {
        Self {
            id,
            color,
            state: Mutex::new(RobotState {
                current_vertex: vertex,
                status: RobotStatus::Idle,
            }),
            queue: TaskQueue::new(),
            driver: Mutex::new(()),
        }
    }

    /// Unique id, starting at 1.
    pub fn id(&self) -> RobotId {
        self.id
    }

    /// Color assigned at spawn.
    pub fn color(&self) -> Color {
        self.color
    }

    /// Vertex the robot last reached.
    pub fn current_vertex(&self) -> VertexId {
        self.state().current_vertex
    }

    /// Whether the robot is walking a path.
    pub fn status(&self) -> RobotStatus {
        self.state().status
    }

    /// Number of destinations still queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Copy of the robot's current state and queue.
    pub fn snapshot(&self) -> Robot {
        let state = self.state();
        Robot {
            id: self.id,
            current_vertex: state.current_vertex,
            status: state.status,
            queue: self.queue.snapshot(),
            color: self.color,
        }
    }

    /// Append a destination. Fails once the fleet has shut the robot down.
    pub fn enqueue(&self, destination: VertexId) -> Result<()> {
        self.queue
            .push(destination)
            .map_err(|_| FleetError::QueueClosed(self.id))
    }

    pub(crate) fn pop_destination(&self) -> Option<VertexId> {
        self.queue.try_pop()
    }

    pub(crate) fn wait_destination(&self) -> Option<VertexId> {
        self.queue.pop_blocking_or_closed()
    }

    pub(crate) fn close_queue(&self) {
        self.queue.close();
    }

    /// Serializes all queue processing for this robot.
    pub(crate) fn drive(&self) -> MutexGuard<'_, ()> {
        self.driver.lock().expect("robot driver mutex poisoned")
    }

    pub(crate) fn begin_path(&self) {
        self.state().status = RobotStatus::Moving;
    }

    pub(crate) fn finish_path(&self, vertex: VertexId) {
        let mut state = self.state();
        state.current_vertex = vertex;
        state.status = RobotStatus::Idle;
    }

    pub(crate) fn halt(&self) {
        self.state().status = RobotStatus::Idle;
    }

    fn state(&self) -> MutexGuard<'_, RobotState> {
        self.state.lock().expect("robot state mutex poisoned")
    }
}

/// The set of robots spawned during a run. Robots are never removed.
pub struct RobotRegistry {
    robots: Mutex<Vec<Arc<RobotHandle>>>,
    rng: Mutex<StdRng>,
}

impl RobotRegistry {
    /// Registry with randomly seeded robot colors.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Registry whose robot colors are reproducible.
    pub fn with_color_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            robots: Mutex::new(Vec::new()),
            rng: Mutex::new(rng),
        }
    }

    /// Create an idle robot at `vertex`. Ids are `count + 1`, assigned under the lock.
    pub fn spawn(&self, vertex: VertexId) -> Arc<RobotHandle> {
        let color = {
            let mut rng = self.rng.lock().expect("color rng mutex poisoned");
            Color::new(rng.random(), rng.random(), rng.random())
        };
        let mut robots = self.robots.lock().expect("registry mutex poisoned");
        let id = robots.len() as RobotId + 1;
        let handle = Arc::new(RobotHandle::new(id, vertex, color));
        robots.push(Arc::clone(&handle));
        handle
    }

    /// Look up a robot by id.
    pub fn get(&self, id: RobotId) -> Result<Arc<RobotHandle>> {
        let robots = self.robots.lock().expect("registry mutex poisoned");
        id.checked_sub(1)
            .and_then(|index| robots.get(index as usize))
            .cloned()
            .ok_or(FleetError::UnknownRobot(id))
    }

    /// Handles to every robot in id order.
    pub fn handles(&self) -> Vec<Arc<RobotHandle>> {
        self.robots.lock().expect("registry mutex poisoned").clone()
    }

    /// Snapshots of every robot in id order.
    pub fn snapshot(&self) -> Vec<Robot> {
        self.handles().iter().map(|robot| robot.snapshot()).collect()
    }

    /// Number of robots spawned so far.
    pub fn len(&self) -> usize {
        self.robots.lock().expect("registry mutex poisoned").len()
    }

    /// Whether no robot has been spawned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RobotRegistry {
    fn default() -> Self {
        Self::new()
    }
}
