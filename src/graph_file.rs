//! Navigation graph ingestion from the JSON level format.
//!
//! ```json
//! { "levels": { "L1": {
//!     "vertices": [[x, y, {"name": "dock", "charging": true}], ...],
//!     "lanes": [[from, to, {}], ...] } } }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{FleetError, Result};
use crate::graph::{Lane, NavigationGraph, VertexData};
use crate::types::Point;

#[derive(Debug, Deserialize)]
struct NavGraphFile {
    levels: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct LevelData {
    vertices: Vec<(f64, f64, Value)>,
    lanes: Vec<(usize, usize, Value)>,
}

/// Read and parse a graph file. Without `level`, the first level in the document is used.
pub fn load_nav_graph(path: &Path, level: Option<&str>) -> Result<NavigationGraph> {
    let text = fs::read_to_string(path).map_err(|e| {
        FleetError::GraphSource(format!("cannot read {}: {e}", path.display()))
    })?;
    parse_nav_graph(&text, level)
}

pub fn parse_nav_graph(text: &str, level: Option<&str>) -> Result<NavigationGraph> {
    let file: NavGraphFile = serde_json::from_str(text)?;
    let level_value = match level {
        Some(name) => file
            .levels
            .get(name)
            .ok_or_else(|| FleetError::GraphSource(format!("level {name:?} not found")))?,
        None => file
            .levels
            .values()
            .next()
            .ok_or_else(|| FleetError::GraphSource("graph file has no levels".into()))?,
    };
    let data: LevelData = serde_json::from_value(level_value.clone())?;

    let vertices = data
        .vertices
        .into_iter()
        .map(|(x, y, attrs)| VertexData {
            position: Point::new(x, y),
            name: vertex_name(&attrs),
            charging: attrs.get("charging").is_some_and(is_truthy),
        })
        .collect();
    let lanes = data
        .lanes
        .into_iter()
        .map(|(from, to, _)| Lane::new(from, to))
        .collect();

    NavigationGraph::load(vertices, lanes)
}

fn vertex_name(attrs: &Value) -> Option<String> {
    match attrs.get("name")? {
        Value::String(name) => Some(name.clone()),
        other => Some(other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}
