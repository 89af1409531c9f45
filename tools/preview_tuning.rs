/// Preview Tuning — sweep intensity and print each category's level and
/// pitch, for checking curves without running the scheduler.
///
/// Usage: preview_tuning [--tuning <path>] [--steps <n>]

use ambience_engine::core::tuning::TuningConfig;
use std::path::Path;
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
    let mut steps: usize = 6;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                println!("Usage: preview_tuning [--tuning <path>] [--steps <n>]");
                return;
            }
            "--tuning" if i + 1 < args.len() => {
                i += 1;
                tuning_path = Some(args[i].clone());
            }
            "--steps" if i + 1 < args.len() => {
                i += 1;
                steps = match args[i].parse() {
                    Ok(n) => n,
                    Err(_) => {
                        eprintln!("Invalid steps: {}", args[i]);
                        process::exit(1);
                    }
                };
            }
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let tuning = match tuning_path {
        Some(ref path) => match TuningConfig::load_from_ron(Path::new(path)) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
        None => TuningConfig::ashveil_default(),
    };

    println!("Preview tuning sweep ({} steps)", steps);
    let denom = steps.saturating_sub(1).max(1) as f64;
    for step in 0..steps {
        let t = step as f64 / denom;
        let mut line = format!("t={:.2} ->", t);
        for kind in &tuning.order {
            if let Some(cat) = tuning.category(*kind) {
                line.push_str(&format!(
                    " {}_db={:.2} dB, {}_pitch={:.3}",
                    kind.name(),
                    cat.decibels_at(t),
                    kind.name(),
                    cat.pitch_at(t)
                ));
            }
        }
        println!("{}", line);
    }
}
