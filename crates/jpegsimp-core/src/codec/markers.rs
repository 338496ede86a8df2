//! JPEG marker segment parsing and metadata re-injection.
//!
//! Only the segments ahead of the first scan are read: quantization tables
//! for quality estimation and application/comment segments so they can be
//! carried into the re-encoded file.

use std::io::{self, Read, Write};

pub const SOI: u8 = 0xD8;
pub const EOI: u8 = 0xD9;
pub const SOS: u8 = 0xDA;
pub const DQT: u8 = 0xDB;
pub const APP0: u8 = 0xE0;
pub const APP1: u8 = 0xE1;
pub const APP2: u8 = 0xE2;
pub const APP14: u8 = 0xEE;
pub const APP15: u8 = 0xEF;
pub const COM: u8 = 0xFE;
const TEM: u8 = 0x01;

/// A marker segment payload (length bytes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub marker: u8,
    pub data: Vec<u8>,
}

impl Segment {
    pub fn new(marker: u8, data: Vec<u8>) -> Self {
        Self { marker, data }
    }

    /// Returns true for segments that carry metadata rather than image data.
    ///
    /// APP0 is always rewritten by the encoder. APP14 (Adobe) describes the
    /// colour transform of the source stream and is invalid after re-encode.
    pub fn is_metadata(&self) -> bool {
        matches!(self.marker, APP1..=APP15 if self.marker != APP14) || self.marker == COM
    }

    /// Returns true for an APP1 segment holding an EXIF block.
    pub fn is_exif(&self) -> bool {
        self.marker == APP1 && self.data.starts_with(b"Exif\0\0")
    }

    /// Returns true for an APP2 segment holding (a chunk of) an ICC profile.
    pub fn is_icc(&self) -> bool {
        self.marker == APP2 && self.data.starts_with(b"ICC_PROFILE\0")
    }
}

/// Start-of-frame markers; DHT, JPG and DAC share the range.
fn is_sof(marker: u8) -> bool {
    matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC)
}

/// A quantization table in zigzag order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTable {
    pub id: u8,
    pub values: [u16; 64],
}

/// Everything ahead of the first scan that the codec cares about.
#[derive(Debug, Clone, Default)]
pub struct Header {
    pub quant_tables: Vec<QuantTable>,
    pub metadata: Vec<Segment>,
    /// Component count of the frame, 0 when no SOF was seen.
    pub components: u8,
}

fn invalid(msg: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg.to_string())
}

fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    Ok(byte[0])
}

fn read_u16<R: Read>(reader: &mut R) -> io::Result<u16> {
    let mut bytes = [0u8; 2];
    reader.read_exact(&mut bytes)?;
    Ok(u16::from_be_bytes(bytes))
}

/// Read marker segments from SOI up to the first SOS (or EOI).
///
/// Truncated or malformed headers are reported as `InvalidData`.
pub fn read_header<R: Read>(reader: &mut R) -> io::Result<Header> {
    read_segments(reader).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => invalid("truncated JPEG header"),
        _ => e,
    })
}

fn read_segments<R: Read>(reader: &mut R) -> io::Result<Header> {
    if read_u8(reader)? != 0xFF || read_u8(reader)? != SOI {
        return Err(invalid("missing SOI marker"));
    }

    let mut header = Header::default();
    loop {
        // extraneous bytes before a marker are skipped
        while read_u8(reader)? != 0xFF {}
        let mut marker = read_u8(reader)?;
        // fill bytes
        while marker == 0xFF {
            marker = read_u8(reader)?;
        }

        match marker {
            SOS | EOI => break,
            TEM | 0xD0..=0xD7 => continue,
            _ => {}
        }

        let len = read_u16(reader)?;
        if len < 2 {
            return Err(invalid("segment length too small"));
        }
        let mut data = vec![0u8; usize::from(len) - 2];
        reader.read_exact(&mut data)?;

        let segment = Segment::new(marker, data);
        if marker == DQT {
            parse_dqt(&segment.data, &mut header.quant_tables)?;
        } else if is_sof(marker) {
            header.components = segment.data.get(5).copied().unwrap_or(0);
        } else if segment.is_metadata() {
            header.metadata.push(segment);
        }
    }

    Ok(header)
}

fn parse_dqt(mut data: &[u8], tables: &mut Vec<QuantTable>) -> io::Result<()> {
    while !data.is_empty() {
        let pq = data[0] >> 4;
        let id = data[0] & 0x0F;
        data = &data[1..];

        let mut values = [0u16; 64];
        if pq == 0 {
            if data.len() < 64 {
                return Err(invalid("short DQT segment"));
            }
            for (v, &b) in values.iter_mut().zip(&data[..64]) {
                *v = u16::from(b);
            }
            data = &data[64..];
        } else {
            if data.len() < 128 {
                return Err(invalid("short DQT segment"));
            }
            for (v, pair) in values.iter_mut().zip(data[..128].chunks_exact(2)) {
                *v = u16::from_be_bytes([pair[0], pair[1]]);
            }
            data = &data[128..];
        }

        // a redefined table replaces the earlier one
        tables.retain(|t| t.id != id);
        tables.push(QuantTable { id, values });
    }
    Ok(())
}

/// Write one marker segment including its length field.
pub fn write_segment<W: Write>(writer: &mut W, segment: &Segment) -> io::Result<()> {
    let len = u16::try_from(segment.data.len() + 2)
        .map_err(|_| invalid("segment payload too large"))?;
    writer.write_all(&[0xFF, segment.marker])?;
    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(&segment.data)
}

/// Where the encoder's leading SOI/APP0 block ends, once enough is buffered.
///
/// `Some(0)` means the stream does not start with SOI and nothing should be
/// injected.
fn header_end(buf: &[u8]) -> Option<usize> {
    if buf.len() < 4 {
        return None;
    }
    if buf[..2] != [0xFF, SOI] {
        return Some(0);
    }
    if buf[2..4] != [0xFF, APP0] {
        return Some(2);
    }
    if buf.len() < 6 {
        return None;
    }
    let end = 4 + usize::from(u16::from_be_bytes([buf[4], buf[5]]));
    (buf.len() >= end).then_some(end)
}

/// Streams encoder output to `W`, inserting segments right after the
/// leading SOI/APP0 block.
///
/// Only the leading header is buffered; the rest passes straight through.
/// [`finish`](Self::finish) must be called once the encoder is done.
pub struct SegmentInjector<'a, W: Write> {
    inner: W,
    segments: &'a [Segment],
    head: Option<Vec<u8>>,
}

impl<'a, W: Write> SegmentInjector<'a, W> {
    pub fn new(inner: W, segments: &'a [Segment]) -> Self {
        let head = (!segments.is_empty()).then(Vec::new);
        Self {
            inner,
            segments,
            head,
        }
    }

    fn release(&mut self, split: usize) -> io::Result<()> {
        if let Some(head) = self.head.take() {
            self.inner.write_all(&head[..split])?;
            if split > 0 {
                for segment in self.segments {
                    write_segment(&mut self.inner, segment)?;
                }
            }
            self.inner.write_all(&head[split..])?;
        }
        Ok(())
    }

    /// Flush any still-buffered header and return the inner writer.
    pub fn finish(mut self) -> io::Result<W> {
        let split = self.head.as_deref().map(|head| header_end(head).unwrap_or(0));
        if let Some(split) = split {
            self.release(split)?;
        }
        self.inner.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for SegmentInjector<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let split = match self.head.as_mut() {
            None => return self.inner.write(buf),
            Some(head) => {
                head.extend_from_slice(buf);
                header_end(head)
            }
        };
        if let Some(split) = split {
            self.release(split)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
