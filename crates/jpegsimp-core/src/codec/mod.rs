//! Codec handle: the decode/encode primitives the rest of the crate builds on.
//!
//! A [`CodecHandle`] owns everything that belongs to one opened JPEG: the
//! decoded pixels, the estimated source quality, the quality the next encode
//! will use and the metadata segments that may be carried over. Pixel
//! decode and encode are done by the `image` crate.
//!
//! # Primitives
//!
//! - [`CodecHandle::open_file`] / [`CodecHandle::open_mem`]
//! - [`CodecHandle::width`], [`CodecHandle::height`], [`CodecHandle::quality`]
//! - [`CodecHandle::set_quality`]
//! - [`CodecHandle::output_file`] / [`CodecHandle::output_mem`]
//!
//! Closing a handle is dropping it.

pub mod markers;
pub mod quality;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Seek, SeekFrom, Write};

use image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::attr::{Dimension, Quality, MIN_QUALITY};
use markers::{Header, Segment, SegmentInjector};

/// Errors reported by codec primitives.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The underlying file or stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The input is not a decodable JPEG.
    #[error("Decode failed: {0}")]
    Decode(String),

    /// The encoder failed or produced nothing.
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Read the header ahead of decoding. Only I/O failures are fatal; a header
/// the scan cannot follow is left for the decoder to accept or reject.
fn scan_header<R: io::Read>(reader: &mut R) -> Result<Header, CodecError> {
    match markers::read_header(reader) {
        Ok(header) => Ok(header),
        Err(e) if e.kind() == io::ErrorKind::InvalidData => {
            debug!("header scan gave up ({}), no quality or metadata", e);
            Ok(Header::default())
        }
        Err(e) => Err(CodecError::Io(e)),
    }
}

fn decode_error(err: ImageError) -> CodecError {
    match err {
        ImageError::IoError(e) if e.kind() != io::ErrorKind::UnexpectedEof => CodecError::Io(e),
        other => CodecError::Decode(other.to_string()),
    }
}

fn encode_error(err: ImageError) -> CodecError {
    match err {
        ImageError::IoError(e) => CodecError::Io(e),
        other => CodecError::Encode(other.to_string()),
    }
}

/// Keep metadata segments worth carrying over; EXIF blocks must parse.
///
/// ICC profiles describe the source colour space and are dropped once the
/// pixels were converted to another one.
fn retain_metadata(segments: Vec<Segment>, colour_changed: bool) -> Vec<Segment> {
    segments
        .into_iter()
        .filter(|segment| {
            if segment.is_icc() && colour_changed {
                debug!("Dropping ICC profile chunk of the source colour space");
                return false;
            }
            if !segment.is_exif() {
                return true;
            }
            match exif::Reader::new().read_raw(segment.data[6..].to_vec()) {
                Ok(exif) => {
                    debug!("EXIF block with {} fields", exif.fields().count());
                    true
                }
                Err(e) => {
                    warn!("Dropping unreadable EXIF block: {}", e);
                    false
                }
            }
        })
        .collect()
}

/// One opened JPEG image.
pub struct CodecHandle {
    image: DynamicImage,
    source_quality: Quality,
    target_quality: Quality,
    metadata: Vec<Segment>,
}

impl CodecHandle {
    /// Open an image by streaming from a file, starting at offset 0.
    ///
    /// The file is read through a buffered reader; no copy of the whole
    /// file is made.
    pub fn open_file(file: &File) -> Result<Self, CodecError> {
        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(0))?;
        let header = scan_header(&mut reader)?;
        reader.seek(SeekFrom::Start(0))?;
        Self::decode(reader, header)
    }

    /// Open an image from an in-memory buffer.
    pub fn open_mem(data: &[u8]) -> Result<Self, CodecError> {
        let header = scan_header(&mut &data[..])?;
        Self::decode(Cursor::new(data), header)
    }

    fn decode<R: BufRead + Seek>(reader: R, header: Header) -> Result<Self, CodecError> {
        let decoder = JpegDecoder::new(reader).map_err(decode_error)?;
        let image = DynamicImage::from_decoder(decoder).map_err(decode_error)?;

        let source_quality = quality::estimate(&header);
        let target_quality = if source_quality == 0 {
            MIN_QUALITY
        } else {
            source_quality
        };

        let channels = match &image {
            DynamicImage::ImageLuma8(_) => 1,
            _ => 3,
        };
        let colour_changed = header.components != 0 && header.components != channels;
        if colour_changed {
            debug!(
                "{} source components encoded as {}",
                header.components, channels
            );
        }

        Ok(Self {
            image,
            source_quality,
            target_quality,
            metadata: retain_metadata(header.metadata, colour_changed),
        })
    }

    pub fn width(&self) -> Dimension {
        self.image.width()
    }

    pub fn height(&self) -> Dimension {
        self.image.height()
    }

    /// Estimated quality of the source, 0 when it could not be determined.
    pub fn quality(&self) -> Quality {
        self.source_quality
    }

    /// Quality the next encode will use.
    pub fn target_quality(&self) -> Quality {
        self.target_quality
    }

    /// Set the encode quality, clamped to 1-100.
    pub fn set_quality(&mut self, quality: Quality) {
        self.target_quality = quality.clamp(1, 100);
    }

    /// Encode straight into `file` at its current position.
    pub fn output_file(&self, file: &File, strip_all: bool) -> Result<(), CodecError> {
        let mut writer = BufWriter::new(file);
        self.encode(&mut writer, strip_all)?;
        writer.flush()?;
        Ok(())
    }

    /// Encode into a freshly allocated buffer.
    pub fn output_mem(&self, strip_all: bool) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::new();
        self.encode(&mut buffer, strip_all)?;
        if buffer.is_empty() {
            return Err(CodecError::Encode("encoder produced no output".to_string()));
        }
        Ok(buffer)
    }

    fn encode<W: Write>(&self, writer: W, strip_all: bool) -> Result<(), CodecError> {
        let segments: &[Segment] = if strip_all { &[] } else { &self.metadata };
        let mut injector = SegmentInjector::new(writer, segments);

        let encoder = JpegEncoder::new_with_quality(&mut injector, self.target_quality);
        let (width, height) = (self.width(), self.height());
        match &self.image {
            DynamicImage::ImageLuma8(gray) => {
                encoder.write_image(gray.as_raw(), width, height, ExtendedColorType::L8)
            }
            DynamicImage::ImageRgb8(rgb) => {
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
            }
        }
        .map_err(encode_error)?;

        injector.finish()?;
        Ok(())
    }
}
