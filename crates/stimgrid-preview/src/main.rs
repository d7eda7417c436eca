//! Render a stimulation schedule as a PNG contact sheet: one tile per
//! pattern in presentation order, spot cells white on black, so the
//! temporal spread of the ordering can be inspected at a glance.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;

use clap::Parser;
use image::{GrayImage, Luma};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use stimgrid_schedule::{GridSpec, OrderingKind, Raster, ScheduleConfig};

/// Render a stimulation schedule as a PNG contact sheet.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Output image path (PNG recommended).
    #[arg(short, long)]
    output: PathBuf,

    /// Logical grid rows.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_ROWS)]
    stim_rows: u32,

    /// Logical grid columns.
    #[arg(long, default_value_t = ScheduleConfig::DEFAULT_COLS)]
    stim_columns: u32,

    /// Spot size in raster cells.
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

    /// RNG seed for a reproducible search.
    #[arg(long)]
    seed: Option<u64>,

    /// Pixels per raster cell.
    #[arg(long, default_value_t = 4)]
    cell_scale: u32,

    /// Tiles per sheet row.
    #[arg(long, default_value_t = 12)]
    sheet_columns: u32,

    /// Gap between tiles in pixels.
    #[arg(long, default_value_t = 8)]
    gutter: u32,
}

// ---------------------------------------------------------------------------
// Sheet layout
// ---------------------------------------------------------------------------

/// Pixel dimensions of the contact sheet, plus the tile grid actually
/// used: `(sheet_width, sheet_height, tile_columns)`.
const fn sheet_dimensions(
    count: u32,
    tile_width: u32,
    tile_height: u32,
    columns: u32,
    gutter: u32,
) -> (u32, u32, u32) {
    let tile_columns = if count < columns { count } else { columns };
    if tile_columns == 0 {
        return (gutter, gutter, 0);
    }
    let tile_rows = count.div_ceil(tile_columns);
    let width = tile_columns * (tile_width + gutter) + gutter;
    let height = tile_rows * (tile_height + gutter) + gutter;
    (width, height, tile_columns)
}

/// Render the raster stack into one grayscale contact sheet.
///
/// Tiles are laid out left-to-right, top-to-bottom in presentation
/// order. Spot cells render white, everything else stays black.
fn render_sheet(rasters: &[Raster], cell_scale: u32, columns: u32, gutter: u32) -> GrayImage {
    let tile_width = rasters.first().map_or(0, Raster::width) * cell_scale;
    let tile_height = rasters.first().map_or(0, Raster::height) * cell_scale;
    let (sheet_width, sheet_height, tile_columns) = sheet_dimensions(
        rasters.len() as u32,
        tile_width,
        tile_height,
        columns,
        gutter,
    );

    let mut sheet = GrayImage::from_pixel(sheet_width.max(1), sheet_height.max(1), Luma([0]));
    if tile_columns == 0 {
        return sheet;
    }

    for (index, raster) in rasters.iter().enumerate() {
        let tile_col = index as u32 % tile_columns;
        let tile_row = index as u32 / tile_columns;
        let origin_x = gutter + tile_col * (tile_width + gutter);
        let origin_y = gutter + tile_row * (tile_height + gutter);

        for (cell_row, row) in raster.rows().enumerate() {
            for (cell_col, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    continue;
                }
                let base_x = origin_x + cell_col as u32 * cell_scale;
                let base_y = origin_y + cell_row as u32 * cell_scale;
                for dy in 0..cell_scale {
                    for dx in 0..cell_scale {
                        sheet.put_pixel(base_x + dx, base_y + dy, Luma([255]));
                    }
                }
            }
        }
    }

    sheet
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = ScheduleConfig {
        grid: GridSpec::new(args.stim_rows, args.stim_columns, args.grid_resolution),
        all_stims: args.all_stims,
        ordering: if args.no_separation {
            OrderingKind::Scan
        } else {
            OrderingKind::Separated
        },
        start_pattern: args.start_pattern,
        min_distance: args.min_distance,
        max_distance: args.max_distance,
        iterations: args.iterations,
        refine_rounds: ScheduleConfig::DEFAULT_REFINE_ROUNDS,
    };

    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };

    eprintln!(
        "Generating schedule for a {}x{} grid...",
        config.grid.rows, config.grid.cols,
    );
    let schedule = stimgrid_schedule::generate(&config, &mut rng)?;

    if let Some(ref diagnostics) = schedule.diagnostics {
        if diagnostics.fallback {
            eprintln!("Warning: separation search exhausted; showing grid-scan order");
        }
        eprintln!(
            "Min distance {:.3}, mean distance {:.3}",
            diagnostics.final_min_distance, diagnostics.mean_distance,
        );
    }

    eprintln!("Rendering {} tiles...", schedule.rasters.len());
    let sheet = render_sheet(
        &schedule.rasters,
        args.cell_scale,
        args.sheet_columns,
        args.gutter,
    );

    eprintln!(
        "Saving {}x{} sheet to {}",
        sheet.width(),
        sheet.height(),
        args.output.display(),
    );
    sheet.save(&args.output)?;

    eprintln!("Done.");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stimgrid_schedule::raster::canonical_rasters;

    use super::*;

    #[test]
    fn sheet_dimensions_full_rows() {
        // 6 tiles of 10x20 in 3 columns with a 2px gutter:
        // width 3*12+2 = 38, height 2*22+2 = 46.
        assert_eq!(sheet_dimensions(6, 10, 20, 3, 2), (38, 46, 3));
    }

    #[test]
    fn sheet_dimensions_partial_last_row() {
        // 7 tiles in 3 columns occupy 3 rows.
        let (_, height, _) = sheet_dimensions(7, 10, 20, 3, 2);
        assert_eq!(height, 3 * 22 + 2);
    }

    #[test]
    fn sheet_dimensions_fewer_tiles_than_columns() {
        assert_eq!(sheet_dimensions(2, 10, 10, 12, 2), (2 * 12 + 2, 14, 2));
    }

    #[test]
    fn rendered_spot_pixels_are_white() {
        let spec = GridSpec::new(2, 2, 1);
        let rasters = canonical_rasters(spec);
        let sheet = render_sheet(&rasters, 2, 4, 1);

        // Tile 0 starts at (1,1); its spot is raster cell (0,0), so the
        // 2x2 pixel block at (1,1) is white.
        assert_eq!(sheet.get_pixel(1, 1), &Luma([255]));
        assert_eq!(sheet.get_pixel(2, 2), &Luma([255]));
        // The blank separator cell next to it stays black.
        assert_eq!(sheet.get_pixel(3, 1), &Luma([0]));
    }

    #[test]
    fn empty_stack_renders_a_minimal_sheet() {
        let sheet = render_sheet(&[], 4, 12, 8);
        assert_eq!(sheet.width(), 8);
        assert_eq!(sheet.height(), 8);
    }
}
