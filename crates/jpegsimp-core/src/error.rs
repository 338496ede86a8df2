//! Error types for opening, re-encoding and writing images.

use std::io;

use thiserror::Error;

/// Errors returned by [`ImageHandle`](crate::ImageHandle) and the optimizer.
#[derive(Debug, Error)]
pub enum Error {
    /// The input stream could not be drained or repositioned.
    #[error("Failed to read input: {0}")]
    Read(#[source] io::Error),

    /// The codec rejected the input as unparseable or corrupt.
    #[error("Failed to open image: {0}")]
    Open(String),

    /// The codec failed during re-encode or produced no output.
    #[error("Failed to encode image: {0}")]
    Encode(String),

    /// The destination could not be written.
    #[error("Failed to write output: {0}")]
    Write(#[source] io::Error),

    /// The handle was already released.
    #[error("Image handle already released")]
    Released,
}

/// Convenience result type for image operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A failed [`optimize`](crate::optimize) call with the byte counts
/// accumulated before the failure. Both are zero when the input never
/// opened.
#[derive(Debug, Error)]
#[error("{error} (read {size_in} bytes, wrote {size_out} bytes)")]
pub struct OptimizeError {
    /// What went wrong.
    #[source]
    pub error: Error,
    /// Bytes read from the input before the failure.
    pub size_in: u64,
    /// Bytes written to the output before the failure.
    pub size_out: u64,
}

impl OptimizeError {
    pub(crate) fn new(error: Error, size_in: u64, size_out: u64) -> Self {
        Self {
            error,
            size_in,
            size_out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Open("not a JPEG".to_string());
        assert_eq!(err.to_string(), "Failed to open image: not a JPEG");

        let err = Error::Released;
        assert_eq!(err.to_string(), "Image handle already released");
    }

    #[test]
    fn test_io_error_is_source() {
        let err = Error::Write(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"));
        let source = std::error::Error::source(&err).expect("io source");
        assert_eq!(source.to_string(), "pipe closed");
    }

    #[test]
    fn test_optimize_error_carries_counts() {
        let err = OptimizeError::new(Error::Encode("boom".into()), 1024, 12);
        assert_eq!(err.size_in, 1024);
        assert_eq!(err.size_out, 12);
        assert_eq!(
            err.to_string(),
            "Failed to encode image: boom (read 1024 bytes, wrote 12 bytes)"
        );
        assert!(matches!(err.error, Error::Encode(_)));
    }
}
