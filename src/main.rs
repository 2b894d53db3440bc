use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;

mod config;
mod models;
mod report;
mod sorter;
mod source;


use crate::config::{load_config, load_sort_config};
use crate::report::{SortReport, sort_playlist};
use crate::sorter::{Feature, SortConfig};
use crate::source::{JsonFileSource, write_json};

#[derive(Parser)]
#[command(name = "playlist-sorter")]
#[command(about = "Reorder a playlist so neighbouring tracks flow into each other")]
#[command(version)]
struct Args {
    /// Path to the sorter configuration JSON file
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,

    /// Path to the track features JSON file
    #[arg(short = 't', long = "tracks")]
    tracks_file: Option<PathBuf>,

    /// Where to write the sorted report
    #[arg(short = 'o', long = "output")]
    output_file: Option<PathBuf>,

    /// Debug mode - print every transition and skip writing the report
    #[arg(short = 'd', long = "debug")]
    debug: bool,

    /// Quiet mode - reduce output verbosity
    #[arg(short = 'q', long = "quiet")]
    quiet: bool,

    /// Fix the random seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Number of swarm particles
    #[arg(long)]
    particles: Option<usize>,

    /// Number of swarm iterations
    #[arg(long)]
    iterations: Option<usize>,

    /// Override a feature weight, e.g. --weight energy=2.5 (repeatable)
    #[arg(short = 'w', long = "weight", value_parser = parse_weight)]
    weights: Vec<(String, f64)>,
}

fn parse_weight(arg: &str) -> Result<(String, f64), String> {
    let (name, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{arg}'"))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| format!("weight for '{name}' is not a number: '{value}'"))?;
    Ok((name.trim().to_string(), value))
}

/// Fold command-line overrides into the loaded configuration
fn apply_overrides(config: &mut SortConfig, args: &Args) {
    if let Some(seed) = args.seed {
        config.optimizer.random_seed = Some(seed);
    }
    if let Some(particles) = args.particles {
        config.optimizer.num_particles = particles;
    }
    if let Some(iterations) = args.iterations {
        config.optimizer.iterations = iterations;
    }
    for (name, weight) in &args.weights {
        match Feature::from_name(name) {
            Some(feature) => config.weights.set(feature, *weight),
            None => warn!("Ignoring --weight for unknown feature '{name}'"),
        }
    }
}

fn init_logging(args: &Args) {
    let level = if args.debug {
        "debug"
    } else if args.quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn print_summary(report: &SortReport) {
    let metadata = &report.metadata;
    println!("\n=== SORT RESULTS ===");
    println!(
        "Tracks: {} | Strategy: {:?} | Iterations: {}",
        metadata.total_tracks, report.strategy, report.iterations_run
    );
    if let Some(seed) = report.seed {
        println!("Seed: {seed}");
    }
    println!(
        "Cost: {:.3} (input order {:.3}, improvement {:.3})",
        metadata.total_cost,
        metadata.input_cost,
        metadata.improvement()
    );
    if let Some(tour_cost) = metadata.tour_cost {
        println!("Greedy tour cost: {tour_cost:.3}");
    }
    println!(
        "Normalized cost: {:.3} | Average per track: {:.4}",
        metadata.normalized_cost, metadata.average_cost_per_track
    );
    if !report.repairs.is_empty() {
        println!("Repaired {} feature values", report.repairs.len());
    }
    println!("Moves needed to apply: {}", report.moves.len());
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    // Paths from .env, overridden by flags
    let env_config = load_config();
    let config_path = args.config_file.clone().unwrap_or(env_config.config_path);
    let tracks_path = args.tracks_file.clone().unwrap_or(env_config.tracks_path);
    let report_path = args.output_file.clone().unwrap_or(env_config.report_path);

    let mut sort_config = load_sort_config(&config_path)?;
    apply_overrides(&mut sort_config, &args);
    info!(
        "Sorting {} with {} particles x {} iterations",
        tracks_path.display(),
        sort_config.optimizer.num_particles,
        sort_config.optimizer.iterations
    );

    let source = JsonFileSource::new(&tracks_path);
    let report = sort_playlist(&source, &sort_config)?;

    if !args.quiet {
        print_summary(&report);
    }

    if args.debug {
        println!("\n🔍 DEBUG MODE: transitions (report not written)");
        for (i, row) in report.tracks.iter().enumerate() {
            println!("     {}. \"{}\" (was #{}) | ID: {}", i + 1, row.name, row.old_order, row.id);
        }
        for transition in &report.transitions {
            println!("   {transition}");
        }
        return Ok(());
    }

    write_json(&report_path, &report)
        .with_context(|| format!("Could not save sorted playlist to {}", report_path.display()))?;
    println!("✓ Sorted playlist written to {}", report_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sorter::WeightConfig;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_weight() {
        assert_eq!(parse_weight("energy=2.5").unwrap(), ("energy".to_string(), 2.5));
        assert!(parse_weight("energy").is_err());
        assert!(parse_weight("energy=loud").is_err());
    }

    #[test]
    fn test_cli_overrides_apply_on_top_of_file() {
        let args = Args::parse_from([
            "playlist-sorter",
            "--seed",
            "42",
            "--iterations",
            "5",
            "-w",
            "tempo=1.5",
            "--weight",
            "Energy=0",
            "-w",
            "sparkle=9",
        ]);
        let mut config = SortConfig::with_weights(WeightConfig::recommended());
        apply_overrides(&mut config, &args);

        assert_eq!(config.optimizer.random_seed, Some(42));
        assert_eq!(config.optimizer.iterations, 5);
        assert_eq!(config.optimizer.num_particles, 30);
        assert_relative_eq!(config.weights.tempo, 1.5);
        assert_relative_eq!(config.weights.energy, 0.0);
        assert_relative_eq!(config.weights.valence, 4.0);
    }
}
