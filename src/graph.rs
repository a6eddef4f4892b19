//! Immutable navigation graph: vertices, lanes, adjacency and nearest-vertex lookup.

use std::collections::BTreeSet;

use crate::error::{FleetError, Result};
use crate::types::{Point, VertexId};

static NO_NEIGHBORS: BTreeSet<VertexId> = BTreeSet::new();

/// Classification of a vertex, fixed at load time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VertexKind {
    Regular,
    Named,
    Charging,
}

impl VertexKind {
    /// Charging takes precedence over a name.
    pub fn classify(name: Option<&str>, charging: bool) -> Self {
        if charging {
            VertexKind::Charging
        } else if name.is_some() {
            VertexKind::Named
        } else {
            VertexKind::Regular
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            VertexKind::Regular => "regular",
            VertexKind::Named => "named",
            VertexKind::Charging => "charging",
        }
    }
}

/// Raw vertex description handed to [`NavigationGraph::load`].
#[derive(Clone, Debug, PartialEq)]
pub struct VertexData {
    pub position: Point,
    pub name: Option<String>,
    pub charging: bool,
}

impl VertexData {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            name: None,
            charging: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn charging(mut self) -> Self {
        self.charging = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    pub position: Point,
    pub name: Option<String>,
    pub charging: bool,
    pub kind: VertexKind,
}

/// Undirected connection between two vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Lane {
    pub from: VertexId,
    pub to: VertexId,
}

impl Lane {
    pub const fn new(from: VertexId, to: VertexId) -> Self {
        Self { from, to }
    }
}

/// Read-only topology shared by every component of the simulation.
#[derive(Clone, Debug)]
pub struct NavigationGraph {
    vertices: Vec<Vertex>,
    lanes: Vec<Lane>,
    adjacency: Vec<BTreeSet<VertexId>>,
}

impl NavigationGraph {
    /// Build a graph, rejecting empty input and lanes with out-of-range endpoints.
    pub fn load(vertices: Vec<VertexData>, lanes: Vec<Lane>) -> Result<Self> {
        if vertices.is_empty() {
            return Err(FleetError::InvalidTopology("vertex list is empty".into()));
        }
        if lanes.is_empty() {
            return Err(FleetError::InvalidTopology("lane list is empty".into()));
        }

        let count = vertices.len();
        let mut adjacency = vec![BTreeSet::new(); count];
        for (index, lane) in lanes.iter().enumerate() {
            if lane.from >= count || lane.to >= count {
                return Err(FleetError::InvalidTopology(format!(
                    "lane {index} ({} -> {}) references a vertex outside 0..{count}",
                    lane.from, lane.to
                )));
            }
            // Self-loops never shorten a route.
            if lane.from != lane.to {
                adjacency[lane.from].insert(lane.to);
                adjacency[lane.to].insert(lane.from);
            }
        }

        let vertices = vertices
            .into_iter()
            .enumerate()
            .map(|(id, data)| {
                let kind = VertexKind::classify(data.name.as_deref(), data.charging);
                Vertex {
                    id,
                    position: data.position,
                    name: data.name,
                    charging: data.charging,
                    kind,
                }
            })
            .collect();

        Ok(Self {
            vertices,
            lanes,
            adjacency,
        })
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn contains(&self, id: VertexId) -> bool {
        id < self.vertices.len()
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// Vertex closest to `point`; ties go to the lowest id.
    pub fn nearest_vertex(&self, point: Point) -> VertexId {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for vertex in &self.vertices {
            let distance = vertex.position.distance_squared(&point);
            if distance < best_distance {
                best = vertex.id;
                best_distance = distance;
            }
        }
        best
    }

    /// Vertices sharing a lane with `id`, in ascending order.
    pub fn neighbors(&self, id: VertexId) -> &BTreeSet<VertexId> {
        self.adjacency.get(id).unwrap_or(&NO_NEIGHBORS)
    }

    pub fn degree(&self, id: VertexId) -> usize {
        self.neighbors(id).len()
    }

    /// Vertices with three or more distinct neighbours.
    pub fn intersections(&self) -> Vec<VertexId> {
        (0..self.vertices.len())
            .filter(|&id| self.degree(id) >= 3)
            .collect()
    }
}
