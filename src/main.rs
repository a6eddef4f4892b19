use std::io;
use std::path::Path;
use std::process::ExitCode;

use fleet_sim::FleetConfig;
use fleet_sim::logging::init_tracing;
use fleet_sim::sim;

fn print_usage(program: &str) {
    println!("Fleet Simulator CLI");
    println!("Usage:");
    println!("  {program} (run demo)");
    println!("  {program} run [graph.json] [config.toml]");
    println!("  {program} bench [robots] [tasks_per_robot] [grid]");
    println!("  {program} --help");
    println!();
    println!("run reads clicks from stdin, one per line: \"x y\", or \"-\" for a click outside the map.");
    println!("Defaults:");
    println!("  bench  robots=8 tasks_per_robot=25 grid=16");
    println!("Without a config file, fleet.toml in the working directory is used when present;");
    println!("without a graph file, the graph path from the config is used.");
}

fn exit_with_usage(program: &str, message: &str) -> ExitCode {
    eprintln!("{message}");
    print_usage(program);
    ExitCode::from(2)
}

fn load_config(path: Option<String>) -> fleet_sim::Result<FleetConfig> {
    match path {
        Some(path) => FleetConfig::load(Path::new(&path)),
        None if Path::new("fleet.toml").exists() => FleetConfig::load(Path::new("fleet.toml")),
        None => Ok(FleetConfig::default()),
    }
}

fn report(result: fleet_sim::Result<()>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let program = std::env::args()
        .next()
        .unwrap_or_else(|| "fleet_sim".to_string());
    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("run") => {
            let graph = args.next();
            let config = match load_config(args.next()) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("error: {e}");
                    return ExitCode::FAILURE;
                }
            };
            if let Some(extra) = args.next() {
                return exit_with_usage(&program, &format!("run: unexpected argument: {extra}"));
            }
            let graph = graph.unwrap_or_else(|| config.graph.path.clone());
            init_tracing(&config.logging.filter);
            tracing::info!("fleet_sim v{}", env!("CARGO_PKG_VERSION"));
            report(sim::run_session(
                Path::new(&graph),
                &config,
                io::stdin().lock(),
                io::stdout(),
            ))
        }
        Some("bench") => {
            let mut values = Vec::new();
            for arg in args {
                match arg.parse::<usize>() {
                    Ok(value) if values.len() < 3 => values.push(value),
                    Ok(_) => {
                        return exit_with_usage(&program, &format!("bench: unexpected argument: {arg}"));
                    }
                    Err(_) => {
                        return exit_with_usage(&program, &format!("bench: invalid value: {arg}"));
                    }
                }
            }
            init_tracing("fleet_sim=warn");
            report(sim::run_benchmark(
                values.first().copied(),
                values.get(1).copied(),
                values.get(2).copied(),
            ))
        }
        Some("--help") | Some("-h") | Some("help") => {
            print_usage(&program);
            ExitCode::SUCCESS
        }
        Some(other) => exit_with_usage(&program, &format!("unknown command: {other}")),
        None => {
            init_tracing("fleet_sim=warn");
            report(sim::run_demo())
        }
    }
}
