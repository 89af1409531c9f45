/// Tuning Linter — validates tuning files and flags suspicious curves.
///
/// Usage: tuning_linter <tuning.ron>... [--bindings <path>]

use ambience_engine::core::bindings::{EmitterBindings, EmitterResolver};
use ambience_engine::core::tuning::TuningConfig;
use std::path::Path;
use std::process;
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        println!("Usage: tuning_linter <tuning.ron>... [--bindings <path>]");
        process::exit(0);
    }

    let mut files = Vec::new();
    let mut bindings_path = None;

    let mut i = 1;
    while i < args.len() {
        if args[i] == "--bindings" && i + 1 < args.len() {
            i += 1;
            bindings_path = Some(args[i].clone());
        } else {
            files.push(args[i].clone());
        }
        i += 1;
    }

    let bindings = match bindings_path {
        Some(ref path) => match EmitterBindings::load_from_json(Path::new(path)) {
            Ok(b) => Some(b),
            Err(e) => {
                eprintln!("ERROR: Failed to load bindings {}: {}", path, e);
                process::exit(1);
            }
        },
        None => None,
    };

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    for file in &files {
        match TuningConfig::load_from_ron(Path::new(file)) {
            Ok(tuning) => {
                println!("  Loaded: {}", file);
                warnings.extend(lint_tuning(file, &tuning, bindings.as_ref()));
            }
            Err(e) => errors.push(format!("{}: {}", file, e)),
        }
    }

    println!("\n=== Tuning Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        warn!("{}", warning);
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

fn lint_tuning(file: &str, tuning: &TuningConfig, bindings: Option<&EmitterBindings>) -> Vec<String> {
    let mut warnings = Vec::new();

    for cat in &tuning.categories {
        let name = cat.kind.name();

        if !tuning.order.contains(&cat.kind) {
            warnings.push(format!(
                "{}: category '{}' is defined but never scheduled (not in order)",
                file, name
            ));
        }

        for (label, curve) in [("volume_curve", &cat.volume_curve), ("pitch_curve", &cat.pitch_curve)] {
            if !curve.is_monotone() {
                warnings.push(format!(
                    "{}: {}.{} decreases as intensity rises",
                    file, name, label
                ));
            }
            if curve.points().last().map(|p| p.position) != Some(1.0) {
                warnings.push(format!(
                    "{}: {}.{} does not reach position 1.0 (flat above its last point)",
                    file, name, label
                ));
            }
        }

        if cat.shrink_factor(1.0) <= cat.shrink_floor {
            warnings.push(format!(
                "{}: {} interval shrink is clamped to its floor ({}) at full intensity",
                file, name, cat.shrink_floor
            ));
        }

        if let Some(bindings) = bindings {
            for emitter in &cat.emitters {
                if bindings.resolve(emitter).is_none() {
                    warnings.push(format!(
                        "{}: {} emitter '{}' has no binding",
                        file, name, emitter
                    ));
                }
            }
        }
    }

    warnings
}
