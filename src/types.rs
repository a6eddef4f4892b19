//! Shared identifiers and small value types used across the simulation.

use std::fmt;

/// Stable index of a vertex in the navigation graph.
pub type VertexId = usize;
/// Robot identity, assigned at spawn and never reused.
pub type RobotId = u64;

/// A point in map coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: &Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Both coordinates are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Display color of a robot marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Motion status of a robot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RobotStatus {
    /// No path in progress.
    Idle,
    /// Executing a computed path.
    Moving,
}

impl fmt::Display for RobotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RobotStatus::Idle => write!(f, "Idle"),
            RobotStatus::Moving => write!(f, "Moving"),
        }
    }
}
