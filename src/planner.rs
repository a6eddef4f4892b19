//! Route computation over the navigation graph.

use std::collections::VecDeque;

use crate::error::{FleetError, Result};
use crate::graph::NavigationGraph;
use crate::types::VertexId;

/// Produces a shortest vertex sequence between two vertices.
///
/// A returned path starts at `start`, ends at `goal`, and every consecutive pair
/// shares a lane. [`FleetError::NoPathFound`] is an ordinary outcome, not a fault.
pub trait PathPlanner: Send + Sync {
    fn shortest_path(
        &self,
        graph: &NavigationGraph,
        start: VertexId,
        goal: VertexId,
    ) -> Result<Vec<VertexId>>;
}

/// Unweighted breadth-first search; neighbours expand in ascending id order.
#[derive(Clone, Copy, Debug, Default)]
pub struct BreadthFirstPlanner;

impl PathPlanner for BreadthFirstPlanner {
    fn shortest_path(
        &self,
        graph: &NavigationGraph,
        start: VertexId,
        goal: VertexId,
    ) -> Result<Vec<VertexId>> {
        let no_path = FleetError::NoPathFound { start, goal };
        if !graph.contains(start) || !graph.contains(goal) {
            return Err(no_path);
        }
        if start == goal {
            return Ok(vec![start]);
        }

        let mut parent: Vec<Option<VertexId>> = vec![None; graph.len()];
        let mut visited = vec![false; graph.len()];
        let mut frontier = VecDeque::from([start]);
        visited[start] = true;

        while let Some(current) = frontier.pop_front() {
            for &next in graph.neighbors(current) {
                if visited[next] {
                    continue;
                }
                visited[next] = true;
                parent[next] = Some(current);
                if next == goal {
                    return Ok(reconstruct(&parent, start, goal));
                }
                frontier.push_back(next);
            }
        }
        Err(no_path)
    }
}

fn reconstruct(parent: &[Option<VertexId>], start: VertexId, goal: VertexId) -> Vec<VertexId> {
    let mut path = vec![goal];
    let mut cursor = goal;
    while cursor != start {
        match parent[cursor] {
            Some(previous) => {
                path.push(previous);
                cursor = previous;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
