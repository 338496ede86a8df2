//! Transcode orchestration: open, apply options, write, account bytes.

use std::fs::File;
use std::io::{Read, Seek, Write};

use serde::Serialize;
use tracing::{info, warn};

use crate::attr::WriteOption;
use crate::counter::{ByteCounter, MultiWriter, TeeReader};
use crate::error::{Error, OptimizeError};
use crate::handle::ImageHandle;
use crate::io::{Sink, Source};
use crate::logging::Logger;

/// Byte counts of a successful optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Optimized {
    /// Bytes read from the input.
    pub size_in: u64,
    /// Bytes written to the output.
    pub size_out: u64,
}

impl Optimized {
    /// Space saved as a percentage of the input: `(in - out) * 100 / in`.
    ///
    /// Negative when the output grew. `None` for empty input.
    pub fn ratio(&self) -> Option<f64> {
        if self.size_in == 0 {
            return None;
        }
        Some((self.size_in as f64 - self.size_out as f64) * 100.0 / self.size_in as f64)
    }

    fn log(&self) {
        match self.ratio() {
            Some(ratio) => info!(
                "{} --> {} bytes ({:.2}%), optimized.",
                self.size_in, self.size_out, ratio
            ),
            None => warn!("{} --> {} bytes, empty input", self.size_in, self.size_out),
        }
    }
}

/// Re-encode a JPEG from `input` into `output` with `opt` applied.
///
/// The input is drained into memory while being counted; the output is
/// counted as it is written.
///
/// # Errors
///
/// Any [`Error`] from opening or writing. Open failures report zero sizes;
/// write failures carry the bytes counted up to the failure.
pub fn optimize<R: Read, W: Write>(
    input: R,
    output: W,
    opt: &WriteOption,
) -> Result<Optimized, OptimizeError> {
    optimize_with(input, output, opt, &Logger::global())
}

/// [`optimize`] with log events routed through `logger`.
pub fn optimize_with<R: Read, W: Write>(
    mut input: R,
    mut output: W,
    opt: &WriteOption,
    logger: &Logger,
) -> Result<Optimized, OptimizeError> {
    let mut counted_in = ByteCounter::new();
    let opened = {
        let mut tee = TeeReader::new(&mut input, &mut counted_in);
        ImageHandle::open_with(Source::stream(&mut tee), logger.clone())
    };
    // nothing is counted until the image opens
    let mut handle = opened.map_err(|e| OptimizeError::new(e, 0, 0))?;

    handle.set_option(*opt);

    let mut counted_out = ByteCounter::new();
    let written = {
        let mut fan_out = MultiWriter::new(&mut output, &mut counted_out);
        handle.write_to(Sink::stream(&mut fan_out))
    };
    let closed = handle.close();

    written
        .and(closed)
        .map_err(|e| OptimizeError::new(e, counted_in.len(), counted_out.len()))?;

    let result = Optimized {
        size_in: counted_in.len(),
        size_out: counted_out.len(),
    };
    logger.scope(|| result.log());
    Ok(result)
}

/// [`optimize`] over files, using the codec's direct file paths.
///
/// `size_in` is the length of `input`; `size_out` is how far the codec
/// advanced `output` from its position at the call.
pub fn optimize_files(
    input: &File,
    output: &File,
    opt: &WriteOption,
) -> Result<Optimized, OptimizeError> {
    optimize_files_with(input, output, opt, &Logger::global())
}

/// [`optimize_files`] with log events routed through `logger`.
pub fn optimize_files_with(
    input: &File,
    mut output: &File,
    opt: &WriteOption,
    logger: &Logger,
) -> Result<Optimized, OptimizeError> {
    let size_in = input
        .metadata()
        .map_err(|e| OptimizeError::new(Error::Read(e), 0, 0))?
        .len();

    let mut handle = ImageHandle::open_with(Source::file(input), logger.clone())
        .map_err(|e| OptimizeError::new(e, 0, 0))?;
    handle.set_option(*opt);

    let start = output
        .stream_position()
        .map_err(|e| OptimizeError::new(Error::Write(e), size_in, 0))?;
    let written = handle.write_to(Sink::file(output));
    let closed = handle.close();
    let end = output.stream_position().unwrap_or(start);
    let size_out = end.saturating_sub(start);

    written
        .and(closed)
        .map_err(|e| OptimizeError::new(e, size_in, size_out))?;

    let result = Optimized { size_in, size_out };
    logger.scope(|| result.log());
    Ok(result)
}
