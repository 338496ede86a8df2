//! jpegsimp core - JPEG re-encoding library
//!
//! This crate opens a JPEG from a file or any reader, reports its
//! attributes, re-encodes it at a bounded quality with optional metadata
//! stripping, and accounts for the bytes read and written.
//!
//! # Module Structure
//!
//! - `attr` - Image attributes, write options and the quality floor
//! - `codec` - Decode/encode primitives over the `image` crate
//! - `counter` - Byte counting reader/writer wrappers
//! - `handle` - The opened-image handle
//! - `io` - File vs. stream endpoints
//! - `logging` - Injectable logging handle
//! - `optimize` - The transcode entry points
//!
//! # Examples
//!
//! ```ignore
//! use jpegsimp_core::{optimize, WriteOption};
//!
//! let input = std::fs::read("photo.jpg").unwrap();
//! let mut output = Vec::new();
//! let result = optimize(input.as_slice(), &mut output, &WriteOption::new(80, true)).unwrap();
//! println!("{} -> {} bytes", result.size_in, result.size_out);
//! ```

pub mod attr;
pub mod codec;
pub mod counter;
pub mod error;
pub mod handle;
pub mod io;
pub mod logging;
pub mod optimize;

pub use attr::{effective_quality, Attr, Dimension, Quality, WriteOption, MIN_QUALITY};
pub use counter::{ByteCounter, MultiWriter, TeeReader};
pub use error::{Error, OptimizeError, Result};
pub use handle::ImageHandle;
pub use io::{Sink, Source};
pub use logging::Logger;
pub use optimize::{optimize, optimize_files, optimize_files_with, optimize_with, Optimized};

/// Estimate the quality a JPEG was encoded at without decoding it.
///
/// Only the header is read. Returns 0 when `bytes` is not a JPEG or carries
/// no quantization tables.
pub fn estimate_quality(bytes: &[u8]) -> Quality {
    codec::markers::read_header(&mut &bytes[..])
        .map(|header| codec::quality::estimate(&header))
        .unwrap_or(0)
}
