/// Simulate — run the ambience scheduler over its horizon and print the
/// resulting event log and phase summary.
///
/// Usage: simulate [--tuning <path>] [--bindings <path>] [--seed <n>] [--json]

use ambience_engine::core::bindings::EmitterBindings;
use ambience_engine::core::report::SimulationReport;
use ambience_engine::core::scheduler::AmbienceSimulation;
use ambience_engine::core::tuning::{RonTuningFile, TuningConfig};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    let mut tuning_path = None;
    let mut bindings_path = None;
    let mut seed: u64 = 42;
    let mut json = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage();
                return;
            }
            "--tuning" if i + 1 < args.len() => {
                i += 1;
                tuning_path = Some(PathBuf::from(&args[i]));
            }
            "--bindings" if i + 1 < args.len() => {
                i += 1;
                bindings_path = Some(args[i].clone());
            }
            "--seed" if i + 1 < args.len() => {
                i += 1;
                seed = match args[i].parse() {
                    Ok(s) => s,
                    Err(_) => {
                        eprintln!("Invalid seed: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            "--json" => json = true,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let builder = AmbienceSimulation::builder().seed(seed);
    let builder = match tuning_path {
        Some(path) => builder.tuning_source(RonTuningFile(path)),
        None => builder.with_tuning(TuningConfig::ashveil_default()),
    };

    let mut sim = match builder.build() {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    sim.run();

    let mut report = SimulationReport::from_simulation(&sim);
    if let Some(ref path) = bindings_path {
        match EmitterBindings::load_from_json(Path::new(path)) {
            Ok(bindings) => {
                let names = bindings.emitters();
                report = report.with_bindings(&bindings, &names);
            }
            Err(e) => {
                eprintln!("ERROR loading bindings {}: {}", path, e);
                process::exit(1);
            }
        }
    }

    if json {
        match report.to_json() {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        }
    } else {
        print!("{}", report.render_text());
    }
}

fn print_usage() {
    println!("Usage: simulate [--tuning <path>] [--bindings <path>] [--seed <n>] [--json]");
    println!();
    println!("  --tuning <path>    RON tuning file (default: built-in Ashveil tuning)");
    println!("  --bindings <path>  JSON emitter bindings to list in the report");
    println!("  --seed <n>         RNG seed (default: 42)");
    println!("  --json             Print the report as JSON");
}
