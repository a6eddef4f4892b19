//! Rendering collaborator interface and a line-oriented text renderer.

use std::io::Write;
use std::sync::Mutex;

use crate::error::{FleetError, Result};
use crate::graph::NavigationGraph;
use crate::types::{Color, Point, RobotId, VertexId};

/// One robot marker redraw.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RobotFrame {
    pub robot: RobotId,
    pub vertex: VertexId,
    pub position: Point,
    pub color: Color,
}

/// Display surface fed by the simulation.
///
/// Any error is treated as [`FleetError::RenderingUnavailable`] by callers.
pub trait Renderer: Send + Sync {
    /// Draw the static map once: vertices by kind, lanes, intersections.
    fn render_graph(&self, graph: &NavigationGraph) -> Result<()>;

    fn draw_robot(&self, frame: &RobotFrame) -> Result<()>;
}

/// Writes each draw call as a text line to any writer.
pub struct TextRenderer<W: Write + Send> {
    out: Mutex<W>,
}

impl<W: Write + Send> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().expect("renderer mutex poisoned")
    }

    fn write_lines(&self, lines: &[String]) -> Result<()> {
        let mut out = self.out.lock().expect("renderer mutex poisoned");
        for line in lines {
            writeln!(out, "{line}").map_err(|e| FleetError::RenderingUnavailable(e.to_string()))?;
        }
        out.flush()
            .map_err(|e| FleetError::RenderingUnavailable(e.to_string()))
    }
}

impl<W: Write + Send> Renderer for TextRenderer<W> {
    fn render_graph(&self, graph: &NavigationGraph) -> Result<()> {
        let mut lines = Vec::with_capacity(graph.len() + graph.lanes().len() + 1);
        for vertex in graph.vertices() {
            let name = vertex
                .name
                .as_deref()
                .map(|n| format!(" name={n}"))
                .unwrap_or_default();
            lines.push(format!(
                "[MAP] vertex {} ({:.2}, {:.2}) kind={}{name}",
                vertex.id,
                vertex.position.x,
                vertex.position.y,
                vertex.kind.as_str()
            ));
        }
        for lane in graph.lanes() {
            lines.push(format!("[MAP] lane {} - {}", lane.from, lane.to));
        }
        lines.push(format!("[MAP] intersections {:?}", graph.intersections()));
        self.write_lines(&lines)
    }

    fn draw_robot(&self, frame: &RobotFrame) -> Result<()> {
        self.write_lines(&[format!(
            "[DRAW] R{} at vertex {} ({:.2}, {:.2}) color={}",
            frame.robot, frame.vertex, frame.position.x, frame.position.y, frame.color
        )])
    }
}
