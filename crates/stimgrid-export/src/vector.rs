//! Mightex vector export serializer.
//!
//! Converts a raster stack into the plain-text vector format consumed
//! by Polygon400-class pattern projectors.
//!
//! The format is line oriented:
//! - a `MightexVector1.0` signature,
//! - free-text `#` comment lines,
//! - the pattern type (`Grid`), bit depth (`1`), and the raster column
//!   and row counts,
//! - one `#========` block per pattern in presentation order, carrying
//!   the 1-indexed pattern number and the grid row/column of the
//!   pattern's original id, followed by the raster as space-separated
//!   0/1 tokens, one `;`-terminated line per raster row with rows
//!   after the first indented by four spaces.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use std::fmt::Write;

use stimgrid_schedule::{Position, Raster};

/// Metadata to embed as `#`-prefixed comment lines below the signature.
///
/// All fields are optional. When present, the corresponding comment
/// line is emitted. Device firmware skips any line beginning with `#`.
#[derive(Debug, Clone, Default)]
pub struct VectorMetadata<'a> {
    /// Free-text description -- emitted as one `#` line per input line.
    pub description: Option<&'a str>,

    /// Minimum adjacent-pair distance of the presentation order, from
    /// the ordering diagnostics.
    pub min_distance: Option<f64>,

    /// Mean adjacent-pair distance of the presentation order.
    pub mean_distance: Option<f64>,
}

/// Serialize a raster stack into the Mightex vector text format.
///
/// `rasters` and `labels` are parallel: one grid-position label per
/// raster, both in presentation order. `width` and `height` are the
/// raster dimensions in cells and must match every raster in the
/// stack.
#[must_use]
pub fn to_vector(
    rasters: &[Raster],
    labels: &[Position],
    width: u32,
    height: u32,
    metadata: &VectorMetadata<'_>,
) -> String {
    debug_assert_eq!(rasters.len(), labels.len());

    let mut out = String::new();

    // --- Signature and metadata header ---
    let _ = writeln!(out, "MightexVector1.0");
    if let Some(description) = metadata.description {
        for line in description.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    if let (Some(min), Some(mean)) = (metadata.min_distance, metadata.mean_distance) {
        let _ = writeln!(out, "# Minimum distance = {min:.2}, average distance = {mean:.2}");
    }

    // --- Pattern type, bit depth, raster dimensions ---
    let _ = writeln!(out, "Grid");
    let _ = writeln!(out, "1");
    let _ = writeln!(out, "{width}");
    let _ = writeln!(out, "{height}");

    // --- One block per pattern, in presentation order ---
    for (index, (raster, label)) in rasters.iter().zip(labels).enumerate() {
        let _ = writeln!(
            out,
            "#======== Pattern {}, Row = {}, Column = {} ========",
            index + 1,
            label.row,
            label.col,
        );
        for (row_index, row) in raster.rows().enumerate() {
            if row_index == 0 {
                let _ = write!(out, "Bin ");
            } else {
                let _ = write!(out, "    ");
            }
            for (col_index, cell) in row.iter().enumerate() {
                if col_index > 0 {
                    let _ = write!(out, " ");
                }
                let _ = write!(out, "{cell}");
            }
            let _ = writeln!(out, ";");
        }
    }

    out
}
