//! Shared types for the stimgrid schedule generation pipeline.

use serde::{Deserialize, Serialize};

use crate::diagnostics::OrderingDiagnostics;
use crate::raster::Raster;

/// Geometry of the logical stimulus grid.
///
/// Raster dimensions are derived: every spot occupies a `resolution` x
/// `resolution` block, blocks are separated by one blank cell, and the
/// trailing blank row/column is omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Logical grid rows.
    pub rows: u32,
    /// Logical grid columns.
    pub cols: u32,
    /// Spot size in raster cells, relative to the one-cell blank separator.
    pub resolution: u32,
}

impl GridSpec {
    /// Create a new grid specification.
    #[must_use]
    pub const fn new(rows: u32, cols: u32, resolution: u32) -> Self {
        Self {
            rows,
            cols,
            resolution,
        }
    }

    /// Size of one spot block including its blank separator cell.
    #[must_use]
    pub const fn block_size(self) -> u32 {
        self.resolution + 1
    }

    /// Raster width in cells. The `-1` drops the unnecessary blank
    /// column after the last spot.
    #[must_use]
    pub const fn raster_width(self) -> u32 {
        self.block_size() * self.cols - 1
    }

    /// Raster height in cells. The `-1` drops the unnecessary blank
    /// row below the last spot.
    #[must_use]
    pub const fn raster_height(self) -> u32 {
        self.block_size() * self.rows - 1
    }

    /// Number of single-spot patterns (excluding the optional composite).
    #[must_use]
    pub const fn pattern_count(self) -> u32 {
        self.rows * self.cols
    }
}

/// A 1-indexed (row, column) location on the logical stimulus grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Row on the logical grid, starting at 1.
    pub row: u32,
    /// Column on the logical grid, starting at 1.
    pub col: u32,
}

impl Position {
    /// Create a new position.
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    /// Squared Euclidean distance to another position.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dr = f64::from(self.row) - f64::from(other.row);
        let dc = f64::from(self.col) - f64::from(other.col);
        dr.mul_add(dr, dc * dc)
    }

    /// Euclidean distance to another position.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }
}

/// Selects how the presentation order is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OrderingKind {
    /// Plain grid-scan order (row-major, id 0..N-1). The separation
    /// search and refinement are skipped entirely.
    Scan,

    /// Randomized banded-path construction followed by local refinement,
    /// maximizing the distance between temporally adjacent stimuli.
    #[default]
    Separated,
}

/// Configuration for schedule generation.
///
/// All parameters have defaults matching a 24x12 grid protocol. Call
/// [`validate`](Self::validate) before generation; [`crate::generate`]
/// does so on entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Logical grid geometry.
    pub grid: GridSpec,

    /// Append the composite "all spots on" pattern after the ordered
    /// single-spot patterns.
    pub all_stims: bool,

    /// Presentation ordering strategy.
    pub ordering: OrderingKind,

    /// 0-indexed pattern id the separation search starts from.
    ///
    /// Must lie in `0..rows*cols`. Conventionally a spot near the grid
    /// center.
    pub start_pattern: u32,

    /// Lower bound of the adjacent-pair distance band (exclusive).
    pub min_distance: f64,

    /// Upper bound of the adjacent-pair distance band (exclusive).
    pub max_distance: f64,

    /// Outer attempt budget for the banded-path construction. Zero
    /// forces the grid-scan fallback.
    pub iterations: u64,

    /// Round budget for the relocation refinement pass.
    pub refine_rounds: u32,
}

impl ScheduleConfig {
    /// Default logical grid rows.
    pub const DEFAULT_ROWS: u32 = 24;
    /// Default logical grid columns.
    pub const DEFAULT_COLS: u32 = 12;
    /// Default spot resolution in raster cells.
    pub const DEFAULT_RESOLUTION: u32 = 3;
    /// Default search start pattern (near the center of a 24x12 grid).
    pub const DEFAULT_START_PATTERN: u32 = 137;
    /// Default lower distance bound.
    pub const DEFAULT_MIN_DISTANCE: f64 = 5.0;
    /// Default upper distance bound.
    pub const DEFAULT_MAX_DISTANCE: f64 = 40.0;
    /// Default outer attempt budget.
    pub const DEFAULT_ITERATIONS: u64 = 1_000_000;
    /// Default refinement round budget.
    pub const DEFAULT_REFINE_ROUNDS: u32 = 1000;

    /// Check the configuration invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ScheduleError::InvalidConfig`] when a grid dimension or
    /// the spot resolution is zero, when `min_distance >= max_distance`,
    /// or when `start_pattern` lies outside `0..rows*cols`.
    pub fn validate(&self) -> Result<(), ScheduleError> {
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(ScheduleError::InvalidConfig(format!(
                "grid dimensions must be positive, got {}x{}",
                self.grid.rows, self.grid.cols,
            )));
        }
        if self.grid.resolution == 0 {
            return Err(ScheduleError::InvalidConfig(
                "spot resolution must be positive".to_string(),
            ));
        }
        if self.min_distance >= self.max_distance {
            return Err(ScheduleError::InvalidConfig(format!(
                "min_distance ({}) must be below max_distance ({})",
                self.min_distance, self.max_distance,
            )));
        }
        let n = self.grid.pattern_count();
        if self.start_pattern >= n {
            return Err(ScheduleError::InvalidConfig(format!(
                "start_pattern {} is outside the grid (0..{n})",
                self.start_pattern,
            )));
        }
        Ok(())
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            grid: GridSpec::new(
                Self::DEFAULT_ROWS,
                Self::DEFAULT_COLS,
                Self::DEFAULT_RESOLUTION,
            ),
            all_stims: true,
            ordering: OrderingKind::default(),
            start_pattern: Self::DEFAULT_START_PATTERN,
            min_distance: Self::DEFAULT_MIN_DISTANCE,
            max_distance: Self::DEFAULT_MAX_DISTANCE,
            iterations: Self::DEFAULT_ITERATIONS,
            refine_rounds: Self::DEFAULT_REFINE_ROUNDS,
        }
    }
}

/// Result of schedule generation.
///
/// Contains everything a serializer needs: rasters in presentation
/// order, the id order that produced them, per-entry grid-position
/// labels for the human-readable headers, and the search diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    /// The grid geometry the schedule was generated for.
    pub spec: GridSpec,

    /// Pattern ids in presentation order. When the composite pattern is
    /// enabled, its logical id `rows*cols` is appended at the end.
    pub order: Vec<u32>,

    /// Grid-position label for each presentation entry, parallel to
    /// [`order`](Self::order).
    pub labels: Vec<Position>,

    /// Rasters in presentation order.
    pub rasters: Vec<Raster>,

    /// Ordering search diagnostics. `None` when scan order was selected.
    pub diagnostics: Option<OrderingDiagnostics>,
}

/// Errors that can occur during schedule generation.
///
/// An exhausted separation search is deliberately NOT an error: the
/// generator falls back to grid-scan order and raises the `fallback`
/// diagnostics flag instead.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Schedule configuration is invalid.
    #[error("invalid schedule configuration: {0}")]
    InvalidConfig(String),
}
