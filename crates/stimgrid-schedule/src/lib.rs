//! stimgrid-schedule: Pure stimulation schedule generation (sans-IO).
//!
//! Converts a logical stimulus grid into binary spot rasters and a
//! presentation order that keeps temporally adjacent stimuli spatially
//! separated:
//! banded-path construction -> local refinement -> rasterization ->
//! reindexing -> optional composite pattern.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! configuration and returns structured data. File formats live in
//! `stimgrid-export`; file writing and rendering live in the binaries.

pub mod construct;
pub mod diagnostics;
pub mod grid;
pub mod raster;
pub mod refine;
pub mod types;

use rand::Rng;

pub use diagnostics::OrderingDiagnostics;
pub use raster::{Raster, RasterStack};
pub use types::{GridSpec, OrderingKind, Position, Schedule, ScheduleConfig, ScheduleError};

/// Generate a complete stimulation schedule.
///
/// # Pipeline steps
///
/// 1. Validate the configuration
/// 2. Produce the presentation order (grid scan, or banded construction
///    plus relocation refinement)
/// 3. Build the canonical rasters in grid-scan order
/// 4. Reindex the rasters by the presentation order
/// 5. Append the composite "all spots on" pattern when enabled
///
/// An exhausted separation search is not an error: the order falls back
/// to grid scan and `diagnostics.fallback` is raised. Callers that
/// require a banded order must check the flag.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidConfig`] when the configuration
/// fails [`ScheduleConfig::validate`].
pub fn generate<R: Rng + ?Sized>(
    config: &ScheduleConfig,
    rng: &mut R,
) -> Result<Schedule, ScheduleError> {
    config.validate()?;
    let spec = config.grid;
    let n = spec.pattern_count();

    // 1. Presentation order.
    let (mut order, diagnostics) = match config.ordering {
        OrderingKind::Scan => (construct::scan_order(n), None),
        OrderingKind::Separated => {
            let constructed = construct::build_separated_order(
                spec,
                config.start_pattern,
                config.min_distance,
                config.max_distance,
                config.iterations,
                rng,
            );
            // The refinement pass also runs on the scan fallback.
            let refined = refine::refine_order(&constructed.order, spec.cols, config.refine_rounds);
            let stats = grid::distance_stats(&grid::pair_distances(&refined.order, spec.cols));
            let diagnostics = OrderingDiagnostics {
                attempts: constructed.attempts,
                fallback: constructed.fallback,
                best_min_distance: refined.best_min_distance,
                final_min_distance: refined.final_min_distance,
                mean_distance: stats.map_or(0.0, |s| s.mean),
                refine_rounds: refined.rounds,
                early_stop: refined.early_stop,
            };
            (refined.order, Some(diagnostics))
        }
    };

    // 2. Canonical rasters, then reindex into presentation order.
    let canonical = raster::canonical_rasters(spec);
    let mut rasters = raster::reindex(&canonical, &order);

    // 3. Optional composite pattern, logically id N. Display only --
    // it never participates in the distance band.
    if config.all_stims {
        rasters.push(raster::composite_raster(&canonical, spec));
        order.push(n);
    }

    let labels: Vec<Position> = order
        .iter()
        .map(|&id| grid::position_of(id, spec.cols))
        .collect();

    Ok(Schedule {
        spec,
        order,
        labels,
        rasters,
        diagnostics,
    })
}
