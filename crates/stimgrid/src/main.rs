//! stimgrid: CLI for generating stimulation schedule vector files.
//!
//! Generates a grid of single-spot stimulus patterns, orders them so
//! that temporally adjacent stimuli stay spatially separated, and
//! writes the result in the Mightex vector text format.
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin stimgrid -- [OPTIONS] <OUTPUT_FILE>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use stimgrid_schedule::{GridSpec, OrderingKind, ScheduleConfig};

/// Generate a spatially separated stimulation schedule and write it as
/// a Mightex vector file.
#[derive(Parser)]
#[command(name = "stimgrid", version)]
struct Cli {
    /// Destination path for the vector file.
    output_file: PathBuf,

    /// Logical grid rows.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_ROWS)]
    stim_rows: u32,

    /// Logical grid columns.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_COLS)]
    stim_columns: u32,

    /// Spot size in raster cells, relative to the one-cell blank
    /// separator between spots.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_RESOLUTION)]
    grid_resolution: u32,

    /// Append the composite "all spots on" pattern.
    #[arg(long)]
    all_stims: bool,

    /// Keep plain grid-scan order (skip the separation search).
    #[arg(long)]
    no_separation: bool,

    /// 0-indexed pattern id the separation search starts from.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_START_PATTERN)]
    start_pattern: u32,

    /// Lower bound of the adjacent-pair distance band (exclusive).
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_MIN_DISTANCE)]
    min_distance: f64,

    /// Upper bound of the adjacent-pair distance band (exclusive).
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_MAX_DISTANCE)]
    max_distance: f64,

    /// Outer attempt budget for the separation search.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_ITERATIONS)]
    iterations: u64,

    /// Round budget for the relocation refinement pass.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_REFINE_ROUNDS)]
    refine_rounds: u32,

    /// RNG seed for a reproducible search.
    #[arg(long)]
    seed: Option<u64>,

    /// Print search diagnostics as JSON instead of the human report.
    #[arg(long)]
    json: bool,

    /// Full schedule config as a JSON string.
    ///
    /// When provided, all other schedule parameter flags are ignored.
    /// The JSON must be a valid `ScheduleConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`ScheduleConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored. Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<ScheduleConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(ScheduleConfig {
        grid: GridSpec::new(cli.stim_rows, cli.stim_columns, cli.grid_resolution),
        all_stims: cli.all_stims,
        ordering: if cli.no_separation {
            OrderingKind::Scan
        } else {
            OrderingKind::Separated
        },
        start_pattern: cli.start_pattern,
        min_distance: cli.min_distance,
        max_distance: cli.max_distance,
        iterations: cli.iterations,
        refine_rounds: cli.refine_rounds,
    })
}

/// Write `contents` to `path` via a temporary sibling file and an
/// atomic rename, so a failed run never leaves a partial file behind.
fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    let Some(file_name) = path.file_name() else {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "output path has no file name",
        ));
    };
    let tmp = path.with_file_name(format!("{}.tmp", file_name.to_string_lossy()));
    std::fs::write(&tmp, contents)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let mut rng = match cli.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    let spec = config.grid;
    eprintln!(
        "Grid: {}x{} at resolution {} ({} patterns, {}x{} raster)",
        spec.rows,
        spec.cols,
        spec.resolution,
        spec.pattern_count(),
        spec.raster_width(),
        spec.raster_height(),
    );

    let start = Instant::now();
    let schedule = match stimgrid_schedule::generate(&config, &mut rng) {
        Ok(schedule) => schedule,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };
    eprintln!("Schedule generated in {:.3}s", start.elapsed().as_secs_f64());

    if let Some(ref diagnostics) = schedule.diagnostics {
        if diagnostics.fallback {
            eprintln!(
                "Warning: separation search exhausted after {} attempts; \
                 falling back to grid-scan order",
                diagnostics.attempts,
            );
        }
        if cli.json {
            match serde_json::to_string_pretty(diagnostics) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("Error serializing diagnostics: {e}");
                    return ExitCode::FAILURE;
                }
            }
        } else {
            eprintln!("{}", diagnostics.report());
        }
    }

    let description = format!(
        "Mightex vector file for {} x {} grid scan with space between stimuli.",
        spec.cols, spec.rows,
    );
    let metadata = stimgrid_export::VectorMetadata {
        description: Some(&description),
        min_distance: schedule
            .diagnostics
            .as_ref()
            .map(|d| d.final_min_distance),
        mean_distance: schedule.diagnostics.as_ref().map(|d| d.mean_distance),
    };
    let text = stimgrid_export::to_vector(
        &schedule.rasters,
        &schedule.labels,
        spec.raster_width(),
        spec.raster_height(),
        &metadata,
    );

    match write_atomic(&cli.output_file, &text) {
        Ok(()) => {
            eprintln!(
                "Vector file written to {} ({} patterns, {} bytes)",
                cli.output_file.display(),
                schedule.rasters.len(),
                text.len(),
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error writing {}: {e}", cli.output_file.display());
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn defaults_mirror_library_constants() {
        let cli = parse(&["stimgrid", "out.txt"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(
            config,
            ScheduleConfig {
                all_stims: false,
                ..ScheduleConfig::default()
            },
        );
    }

    #[test]
    fn no_separation_selects_scan_order() {
        let cli = parse(&["stimgrid", "out.txt", "--no-separation"]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.ordering, OrderingKind::Scan);
    }

    #[test]
    fn config_json_overrides_flags() {
        let json = r#"{
            "grid": {"rows": 2, "cols": 2, "resolution": 1},
            "all_stims": false,
            "ordering": "scan",
            "start_pattern": 0,
            "min_distance": 0.0,
            "max_distance": 10.0,
            "iterations": 5,
            "refine_rounds": 5
        }"#;
        let cli = parse(&["stimgrid", "out.txt", "--stim-rows", "24", "--config-json", json]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.grid, GridSpec::new(2, 2, 1));
        assert_eq!(config.iterations, 5);
    }

    #[test]
    fn bad_config_json_reports_an_error() {
        let cli = parse(&["stimgrid", "out.txt", "--config-json", "{not json"]);
        let err = config_from_cli(&cli).unwrap_err();
        assert!(err.contains("--config-json"));
    }

    #[test]
    fn write_atomic_rejects_pathless_target() {
        assert!(write_atomic(Path::new("/"), "x").is_err());
    }
}
