//! Readback of device output listings.
//!
//! After a run, Polygon-class controllers emit a listing with one row
//! per displayed pattern: whitespace-separated integer columns where
//! the second column carries the raster column count and the fourth
//! carries the 1-indexed linear cell index of the displayed spot's
//! top-left corner. This module recovers the presentation order as
//! 0-indexed grid pattern ids by mapping each cell index back through
//! the grid geometry.
//!
//! Lines beginning with `#` and blank lines are skipped.

use stimgrid_schedule::GridSpec;

/// Errors that can occur while parsing a device output listing.
#[derive(Debug, thiserror::Error)]
pub enum ReadbackError {
    /// A data line did not have the expected integer columns.
    #[error("malformed listing line {line}: {reason}")]
    MalformedLine {
        /// 1-indexed line number in the listing.
        line: usize,
        /// What went wrong.
        reason: String,
    },

    /// A cell index pointed outside the raster.
    #[error("cell index {index} on line {line} is outside the {width}x{height} raster")]
    OutOfRange {
        /// 1-indexed line number in the listing.
        line: usize,
        /// The offending 1-indexed cell index.
        index: u32,
        /// Raster width in cells.
        width: u32,
        /// Raster height in cells.
        height: u32,
    },
}

/// Parse a device output listing into 0-indexed grid pattern ids, in
/// the order the device displayed them.
///
/// # Errors
///
/// Returns [`ReadbackError::MalformedLine`] when a data line has fewer
/// than four columns, a non-integer field, or a column count that does
/// not match `spec`, and [`ReadbackError::OutOfRange`] when a cell
/// index falls outside the raster.
pub fn read_order(listing: &str, spec: GridSpec) -> Result<Vec<u32>, ReadbackError> {
    let width = spec.raster_width();
    let height = spec.raster_height();
    let block = spec.block_size();
    let mut order = Vec::new();

    for (line_index, line) in listing.lines().enumerate() {
        let line_number = line_index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let fields: Vec<u32> = trimmed
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<_, _>>()
            .map_err(|e| ReadbackError::MalformedLine {
                line: line_number,
                reason: format!("non-integer field: {e}"),
            })?;

        if fields.len() < 4 {
            return Err(ReadbackError::MalformedLine {
                line: line_number,
                reason: format!("expected at least 4 columns, got {}", fields.len()),
            });
        }
        if fields[1] != width {
            return Err(ReadbackError::MalformedLine {
                line: line_number,
                reason: format!(
                    "column count {} does not match the {width}-cell raster",
                    fields[1],
                ),
            });
        }

        // 1-indexed linear cell index of the spot's top-left corner.
        let index = fields[3];
        if index == 0 || index > width * height {
            return Err(ReadbackError::OutOfRange {
                line: line_number,
                index,
                width,
                height,
            });
        }
        let cell = index - 1;
        let raster_row = cell / width;
        let raster_col = cell % width;
        let grid_row = raster_row / block;
        let grid_col = raster_col / block;
        order.push(grid_row * spec.cols + grid_col);
    }

    Ok(order)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stimgrid_schedule::grid::position_of;

    use super::*;

    /// Build a synthetic listing line for a pattern id: the 1-indexed
    /// cell index of its spot's top-left corner.
    fn listing_line(sequence: usize, id: u32, spec: GridSpec) -> String {
        let block = spec.block_size();
        let position = position_of(id, spec.cols);
        let raster_row = (position.row - 1) * block;
        let raster_col = (position.col - 1) * block;
        let cell = raster_row * spec.raster_width() + raster_col + 1;
        format!(
            "{} {} {} {}",
            sequence,
            spec.raster_width(),
            spec.raster_height(),
            cell,
        )
    }

    fn listing_for(order: &[u32], spec: GridSpec) -> String {
        order
            .iter()
            .enumerate()
            .map(|(i, &id)| listing_line(i + 1, id, spec))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn round_trips_a_presentation_order() {
        let spec = GridSpec::new(4, 3, 2);
        let order = [5, 0, 11, 3, 8, 1, 10, 2, 7, 4, 9, 6];
        let listing = listing_for(&order, spec);
        let parsed = read_order(&listing, spec).unwrap();
        assert_eq!(parsed, order);
    }

    #[test]
    fn round_trips_the_default_protocol_geometry() {
        let spec = GridSpec::new(24, 12, 3);
        let order = [137, 22, 257, 51, 177, 0, 287];
        let listing = listing_for(&order, spec);
        let parsed = read_order(&listing, spec).unwrap();
        assert_eq!(parsed, order);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let spec = GridSpec::new(2, 2, 1);
        let listing = format!(
            "# device log\n\n{}\n# trailing comment\n{}\n",
            listing_line(1, 2, spec),
            listing_line(2, 1, spec),
        );
        let parsed = read_order(&listing, spec).unwrap();
        assert_eq!(parsed, vec![2, 1]);
    }

    #[test]
    fn empty_listing_yields_empty_order() {
        let spec = GridSpec::new(2, 2, 1);
        assert!(read_order("", spec).unwrap().is_empty());
    }

    #[test]
    fn short_line_is_malformed() {
        let spec = GridSpec::new(2, 2, 1);
        let err = read_order("1 3 3", spec).unwrap_err();
        assert!(matches!(err, ReadbackError::MalformedLine { line: 1, .. }));
        assert!(err.to_string().contains("at least 4 columns"));
    }

    #[test]
    fn non_integer_field_is_malformed() {
        let spec = GridSpec::new(2, 2, 1);
        let err = read_order("1 3 3 x", spec).unwrap_err();
        assert!(matches!(err, ReadbackError::MalformedLine { line: 1, .. }));
    }

    #[test]
    fn mismatched_column_count_is_malformed() {
        // Listing claims 5 raster columns, spec says 3.
        let spec = GridSpec::new(2, 2, 1);
        let err = read_order("1 5 3 1", spec).unwrap_err();
        assert!(err.to_string().contains("does not match"));
    }

    #[test]
    fn cell_index_outside_the_raster_errors() {
        let spec = GridSpec::new(2, 2, 1);
        // 3x3 raster has cells 1..=9.
        let err = read_order("1 3 3 10", spec).unwrap_err();
        assert!(matches!(
            err,
            ReadbackError::OutOfRange {
                line: 1,
                index: 10,
                ..
            }
        ));
    }

    #[test]
    fn zero_cell_index_errors() {
        let spec = GridSpec::new(2, 2, 1);
        let err = read_order("1 3 3 0", spec).unwrap_err();
        assert!(matches!(err, ReadbackError::OutOfRange { index: 0, .. }));
    }

    #[test]
    fn error_line_numbers_count_all_lines() {
        let spec = GridSpec::new(2, 2, 1);
        let listing = format!("# header\n{}\nbad line\n", listing_line(1, 0, spec));
        let err = read_order(&listing, spec).unwrap_err();
        assert!(matches!(err, ReadbackError::MalformedLine { line: 3, .. }));
    }
}
