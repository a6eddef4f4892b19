//! Host runners: scripted demo, click-driven session, and the threaded benchmark.

use std::collections::BTreeMap;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ExecutionMode, FleetConfig, SimulationConfig};
use crate::dispatcher::{CommandDispatcher, Outcome};
use crate::error::{FleetError, Result};
use crate::fleet::Fleet;
use crate::graph::{Lane, NavigationGraph, VertexData};
use crate::graph_file::load_nav_graph;
use crate::logging::{FileLogSink, FleetLog};
use crate::planner::BreadthFirstPlanner;
use crate::render::TextRenderer;
use crate::types::Point;

// Short pacing so the demo finishes quickly.
const DEMO_PACING_MS: u64 = 10;
const DEMO_COLOR_SEED: u64 = 2432;

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    use libc::{RUSAGE_SELF, getrusage, rusage};
    // SAFETY: rusage is plain old data; getrusage fills it in.
    let mut usage: rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { getrusage(RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Small depot: a corridor with a side branch, plus an unconnected parking island.
///
/// ```text
///   5 - 6            (island)
///
///           4
///           |
///   0 - 1 - 2 - 3
/// ```
pub fn demo_graph() -> Result<NavigationGraph> {
    NavigationGraph::load(
        vec![
            VertexData::new(0.0, 0.0).named("dock"),
            VertexData::new(1.0, 0.0),
            VertexData::new(2.0, 0.0),
            VertexData::new(3.0, 0.0).named("charger").charging(),
            VertexData::new(2.0, 1.0).named("shelf"),
            VertexData::new(0.0, 3.0),
            VertexData::new(1.0, 3.0).named("parking"),
        ],
        vec![
            Lane::new(0, 1),
            Lane::new(1, 2),
            Lane::new(2, 3),
            Lane::new(2, 4),
            Lane::new(5, 6),
        ],
    )
}

/// `size` x `size` lattice with lanes between horizontal and vertical neighbours.
pub fn grid_graph(size: usize) -> Result<NavigationGraph> {
    let mut vertices = Vec::with_capacity(size * size);
    let mut lanes = Vec::new();
    for row in 0..size {
        for col in 0..size {
            let id = row * size + col;
            vertices.push(VertexData::new(col as f64, row as f64));
            if col + 1 < size {
                lanes.push(Lane::new(id, id + 1));
            }
            if row + 1 < size {
                lanes.push(Lane::new(id, id + size));
            }
        }
    }
    NavigationGraph::load(vertices, lanes)
}

/// Parse one input line: `x y` (or `x,y`) is a click, `-` is a click outside the map.
/// Returns `None` for lines that are neither.
pub fn parse_click(line: &str) -> Option<Option<Point>> {
    let line = line.trim();
    if line == "-" {
        return Some(None);
    }
    let mut parts = line
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty());
    let x = parts.next()?.parse::<f64>().ok()?;
    let y = parts.next()?.parse::<f64>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Some(Point::new(x, y)))
}

/// Run the scripted demo on the built-in graph and print a summary.
pub fn run_demo() -> Result<()> {
    tracing::debug!("[DEMO] start");
    let config = SimulationConfig {
        pacing_ms: DEMO_PACING_MS,
        mode: ExecutionMode::Inline,
        color_seed: Some(DEMO_COLOR_SEED),
    };
    let log = FleetLog::new();
    let fleet = Arc::new(Fleet::new(
        Arc::new(demo_graph()?),
        Arc::new(BreadthFirstPlanner),
        Arc::new(TextRenderer::new(io::stdout())),
        &config,
        log.clone(),
    )?);
    let mut dispatcher = CommandDispatcher::new(Arc::clone(&fleet), log);

    let script = [
        Some(Point::new(0.1, -0.1)), // spawn R1 at the dock
        Some(Point::new(3.2, 0.1)),  // R1 -> charger
        Some(Point::new(1.0, 2.9)),  // spawn R2 on the island
        Some(Point::new(0.0, 0.2)),  // R2 -> dock, unreachable
        Some(Point::new(2.1, 1.1)),  // spawn R3 at the shelf
        None,                        // click outside the map
        Some(Point::new(-0.3, 0.0)), // R3 -> dock
    ];

    let start = Instant::now();
    let mut ignored = 0usize;
    for click in script {
        if dispatcher.click(click)? == Outcome::Ignored {
            ignored += 1;
        }
    }
    fleet.shutdown()?;
    tracing::debug!("[DEMO] finished in {}ms", start.elapsed().as_millis());

    let positions: BTreeMap<_, _> = fleet
        .robots()
        .iter()
        .map(|robot| (robot.id, robot.current_vertex))
        .collect();
    let stats = fleet.stats();
    println!("DEMO SUMMARY");
    println!("robots={}", positions.len());
    println!("positions={positions:?}");
    println!("paths_completed={}", stats.paths_completed());
    println!("skipped_tasks={}", stats.tasks_skipped());
    println!("ignored_clicks={ignored}");
    Ok(())
}

/// Load a graph, then feed clicks read from `input` through the dispatcher.
pub fn run_session(
    graph_path: &Path,
    config: &FleetConfig,
    input: impl BufRead,
    mut out: impl Write,
) -> Result<()> {
    let graph = load_nav_graph(graph_path, config.graph.level.as_deref())?;
    let mut log = FleetLog::new();
    if let Some(path) = config.logging.log_file.as_deref().filter(|p| !p.is_empty()) {
        log = log.with_sink(Arc::new(FileLogSink::create(Path::new(path))?));
    }
    let fleet = Arc::new(Fleet::new(
        Arc::new(graph),
        Arc::new(BreadthFirstPlanner),
        Arc::new(TextRenderer::new(io::stdout())),
        &config.simulation,
        log.clone(),
    )?);
    let mut dispatcher = CommandDispatcher::new(Arc::clone(&fleet), log);

    for (number, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        match parse_click(&line) {
            Some(click) => {
                dispatcher.click(click)?;
            }
            None => tracing::warn!("line {}: expected `x y` or `-`, got {line:?}", number + 1),
        }
    }
    fleet.shutdown()?;

    writeln!(out, "robot,vertex,status,color")?;
    for robot in fleet.robots() {
        writeln!(
            out,
            "R{},{},{},{}",
            robot.id, robot.current_vertex, robot.status, robot.color
        )?;
    }
    Ok(())
}

/// Aggregated metrics from a single benchmark run.
struct BenchResult {
    robots: usize,
    tasks_per_robot: usize,
    grid: usize,
    total_tasks: usize,
    elapsed_ms: f64,
    throughput: f64,
    cpu_user_s: Option<f64>,
    cpu_sys_s: Option<f64>,
    paths_completed: usize,
    skipped_tasks: usize,
}

fn benchmark_once(robots: usize, tasks_per_robot: usize, grid: usize, seed: u64) -> Result<BenchResult> {
    let graph = Arc::new(grid_graph(grid)?);
    let config = SimulationConfig {
        pacing_ms: 0,
        mode: ExecutionMode::Threaded,
        color_seed: Some(seed),
    };
    let fleet = Fleet::new(
        Arc::clone(&graph),
        Arc::new(BreadthFirstPlanner),
        Arc::new(TextRenderer::new(io::sink())),
        &config,
        FleetLog::new(),
    )?;

    let mut rng = StdRng::seed_from_u64(seed);
    let vertex_count = graph.len();
    let mut ids = Vec::with_capacity(robots);
    for _ in 0..robots {
        ids.push(fleet.spawn_robot(rng.random_range(0..vertex_count))?);
    }

    let cpu_start = cpu_times_seconds();
    let start = Instant::now();
    for _ in 0..tasks_per_robot {
        for &id in &ids {
            fleet.assign(id, rng.random_range(0..vertex_count))?;
        }
    }
    fleet.shutdown()?;

    let total_tasks = robots * tasks_per_robot;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    let throughput = if elapsed_ms > 0.0 {
        (total_tasks as f64) / (elapsed_ms / 1000.0)
    } else {
        0.0
    };
    let (cpu_user_s, cpu_sys_s) = match (cpu_start, cpu_times_seconds()) {
        (Some((user_start, sys_start)), Some((user_end, sys_end))) => {
            (Some(user_end - user_start), Some(sys_end - sys_start))
        }
        _ => (None, None),
    };
    let stats = fleet.stats();

    Ok(BenchResult {
        robots,
        tasks_per_robot,
        grid,
        total_tasks,
        elapsed_ms,
        throughput,
        cpu_user_s,
        cpu_sys_s,
        paths_completed: stats.paths_completed(),
        skipped_tasks: stats.tasks_skipped(),
    })
}

/// Run the threaded benchmark with optional parameter overrides and print CSV.
pub fn run_benchmark(
    robots: Option<usize>,
    tasks_per_robot: Option<usize>,
    grid: Option<usize>,
) -> Result<()> {
    let robots = robots.unwrap_or(8);
    let tasks_per_robot = tasks_per_robot.unwrap_or(25);
    let grid = grid.unwrap_or(16);
    if robots == 0 || tasks_per_robot == 0 || grid < 2 {
        return Err(FleetError::Config(
            "benchmark needs robots > 0, tasks_per_robot > 0 and grid >= 2".into(),
        ));
    }
    let result = benchmark_once(robots, tasks_per_robot, grid, DEMO_COLOR_SEED)?;

    println!(
        "robots,tasks_per_robot,grid,total_tasks,elapsed_ms,throughput_tasks_per_s,cpu_user_s,cpu_sys_s,paths_completed,skipped_tasks"
    );
    let cpu_user = result
        .cpu_user_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    let cpu_sys = result
        .cpu_sys_s
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "NA".to_string());
    println!(
        "{},{},{},{},{:.2},{:.2},{},{},{},{}",
        result.robots,
        result.tasks_per_robot,
        result.grid,
        result.total_tasks,
        result.elapsed_ms,
        result.throughput,
        cpu_user,
        cpu_sys,
        result.paths_completed,
        result.skipped_tasks
    );
    if result.paths_completed + result.skipped_tasks != result.total_tasks {
        eprintln!(
            "# warning,unprocessed_tasks,{}",
            result.total_tasks - result.paths_completed - result.skipped_tasks
        );
    }
    Ok(())
}
