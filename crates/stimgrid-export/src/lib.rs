//! stimgrid-export: Pure format serializers and parsers (sans-IO)
//!
//! Converts raster schedules into the Mightex vector text format and
//! reads device output listings back into grid order. All functions
//! operate on in-memory data; file I/O lives in the binaries.

pub mod readback;
pub mod vector;

pub use readback::{ReadbackError, read_order};
pub use vector::{VectorMetadata, to_vector};
