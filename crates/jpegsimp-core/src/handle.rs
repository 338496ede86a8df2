//! Opened-image handle.
//!
//! An [`ImageHandle`] exclusively owns one [`CodecHandle`] together with the
//! attributes read at open time and the write options applied since. It is
//! move-only; the codec handle is released exactly once, either by
//! [`ImageHandle::close`] or when the handle is dropped.

use std::io::Read;

use tracing::{debug, info, warn};

use crate::attr::{effective_quality, Attr, WriteOption};
use crate::codec::{CodecError, CodecHandle};
use crate::error::{Error, Result};
use crate::io::{Sink, Source};
use crate::logging::Logger;

fn open_error(err: CodecError) -> Error {
    match err {
        CodecError::Io(e) => Error::Read(e),
        CodecError::Decode(msg) | CodecError::Encode(msg) => Error::Open(msg),
    }
}

fn output_error(err: CodecError) -> Error {
    match err {
        CodecError::Io(e) => Error::Write(e),
        CodecError::Decode(msg) | CodecError::Encode(msg) => Error::Encode(msg),
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// One opened JPEG image.
pub struct ImageHandle {
    codec: Option<CodecHandle>,
    attr: Attr,
    option: WriteOption,
    logger: Logger,
}

impl ImageHandle {
    /// Open an image, logging to the global subscriber.
    ///
    /// # Errors
    ///
    /// Returns `Error::Read` if the source cannot be read or repositioned,
    /// `Error::Open` if it is empty or not a decodable JPEG.
    pub fn open(source: Source<'_>) -> Result<Self> {
        Self::open_with(source, Logger::global())
    }

    /// Open an image, logging through `logger` for the handle's lifetime.
    pub fn open_with(source: Source<'_>, logger: Logger) -> Result<Self> {
        let codec = logger.scope(|| open_codec(source))?;

        let attr = Attr::new(codec.width(), codec.height(), codec.quality());
        logger.scope(|| {
            info!(
                "image open, w: {}, h: {}, q: {}",
                attr.width, attr.height, attr.quality
            )
        });

        Ok(Self {
            codec: Some(codec),
            attr,
            option: WriteOption::default(),
            logger,
        })
    }

    /// Attributes read when the image was opened.
    pub fn attr(&self) -> &Attr {
        &self.attr
    }

    /// The options applied by the last [`set_option`](Self::set_option),
    /// with the quality floor already resolved.
    pub fn option(&self) -> &WriteOption {
        &self.option
    }

    /// Apply write options.
    ///
    /// Quality is resolved through [`effective_quality`] and pushed into the
    /// codec right away; `strip_all` is consulted when writing. Each call
    /// replaces the previous options.
    pub fn set_option(&mut self, opt: WriteOption) {
        let Self {
            codec,
            option,
            logger,
            ..
        } = self;

        logger.scope(|| {
            debug!("set option: q {}, strip {}", opt.quality, opt.strip_all);
            let Some(codec) = codec.as_mut() else {
                warn!("set option on a released image handle ignored");
                return;
            };

            option.quality = effective_quality(opt.quality);
            option.strip_all = opt.strip_all;
            codec.set_quality(option.quality);
            debug!("set quality: {}", option.quality);
        });
    }

    /// Encode the image into `sink`.
    ///
    /// Files are written by the codec directly; other streams receive the
    /// output of [`blob`](Self::blob). Both deliver identical bytes.
    ///
    /// # Errors
    ///
    /// `Error::Encode` if the codec fails, `Error::Write` if the sink fails,
    /// `Error::Released` after [`close`](Self::close).
    pub fn write_to(&self, sink: Sink<'_>) -> Result<()> {
        self.logger.scope(|| match sink {
            Sink::File(file) => {
                debug!("write to file");
                let codec = self.codec.as_ref().ok_or(Error::Released)?;
                codec
                    .output_file(file, self.option.strip_all)
                    .map_err(output_error)
                    .inspect_err(|e| warn!("file output failed: {}", e))
            }
            Sink::Stream(writer) => {
                debug!("write to stream");
                let data = self.encode_blob()?;
                writer
                    .write_all(&data)
                    .and_then(|()| writer.flush())
                    .map_err(Error::Write)?;
                debug!("wrote {} bytes", data.len());
                Ok(())
            }
        })
    }

    /// Encode the image into an owned buffer.
    ///
    /// # Errors
    ///
    /// `Error::Encode` if the codec fails or produces nothing,
    /// `Error::Released` after [`close`](Self::close).
    pub fn blob(&self) -> Result<Vec<u8>> {
        self.logger.scope(|| self.encode_blob())
    }

    fn encode_blob(&self) -> Result<Vec<u8>> {
        let codec = self.codec.as_ref().ok_or(Error::Released)?;
        let data = codec
            .output_mem(self.option.strip_all)
            .map_err(output_error)
            .inspect_err(|e| warn!("memory output failed: {}", e))?;
        debug!("codec output {} bytes", data.len());
        Ok(data)
    }

    /// Release the codec handle. Calling it again does nothing.
    pub fn close(&mut self) -> Result<()> {
        if self.codec.take().is_some() {
            self.logger.scope(|| debug!("image handle released"));
        }
        Ok(())
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.codec.is_none()
    }
}

impl Drop for ImageHandle {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageHandle")
            .field("attr", &self.attr)
            .field("option", &self.option)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn open_codec(source: Source<'_>) -> Result<CodecHandle> {
    debug!("open {} source", source.kind());
    match source {
        Source::File(file) => CodecHandle::open_file(file).map_err(|e| {
            warn!("file open failed: {}", e);
            open_error(e)
        }),
        Source::Stream(reader) => {
            let mut blob = Vec::new();
            reader.read_to_end(&mut blob).map_err(|e| {
                warn!("read error: {}", e);
                Error::Read(e)
            })?;

            let len = blob.len();
            if len == 0 {
                return Err(Error::Open("empty input".to_string()));
            }
            debug!(
                "jpeg blob ({}) head: {}, tail: {}",
                len,
                hex(&blob[..len.min(8)]),
                hex(&blob[len.saturating_sub(2)..])
            );

            CodecHandle::open_mem(&blob).map_err(|e| {
                warn!("memory open failed: {}", e);
                open_error(e)
            })
        }
    }
}
