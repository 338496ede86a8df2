//! Byte accounting wrappers.
//!
//! [`ByteCounter`] is a sink that only tallies what is written to it. It is
//! composed with real streams through [`TeeReader`] (every byte read is also
//! written to the counter) and [`MultiWriter`] (every byte written goes to
//! both targets).

use std::io::{self, Read, Write};

/// A write sink that discards data and counts the bytes it receives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ByteCounter {
    count: u64,
}

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> u64 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

impl Write for ByteCounter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.count += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A reader that copies everything it reads from `R` into `W`.
///
/// A write failure on `W` is reported as a read failure.
pub struct TeeReader<R, W> {
    reader: R,
    writer: W,
}

impl<R: Read, W: Write> TeeReader<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

impl<R: Read, W: Write> Read for TeeReader<R, W> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.reader.read(buf)?;
        if n > 0 {
            self.writer.write_all(&buf[..n])?;
        }
        Ok(n)
    }
}

/// A writer that duplicates every write to two destinations.
///
/// Bytes go to `primary` first; `secondary` only sees bytes `primary`
/// accepted.
pub struct MultiWriter<A, B> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> MultiWriter<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }
}

impl<A: Write, B: Write> Write for MultiWriter<A, B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.primary.write(buf)?;
        self.secondary.write_all(&buf[..n])?;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.primary.flush()?;
        self.secondary.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_byte_counter_counts() {
        let mut counter = ByteCounter::new();
        assert!(counter.is_empty());

        counter.write_all(b"hello").unwrap();
        counter.write_all(b", world").unwrap();
        assert_eq!(counter.len(), 12);
        assert!(!counter.is_empty());
    }

    #[test]
    fn test_tee_reader_counts_and_passes_through() {
        let data = vec![7u8; 10_000];
        let mut counter = ByteCounter::new();
        let mut out = Vec::new();

        let mut tee = TeeReader::new(data.as_slice(), &mut counter);
        tee.read_to_end(&mut out).unwrap();
        drop(tee);

        assert_eq!(out, data);
        assert_eq!(counter.len(), 10_000);
    }

    #[test]
    fn test_tee_reader_partial_read() {
        let data = b"0123456789";
        let mut counter = ByteCounter::new();
        let mut tee = TeeReader::new(&data[..], &mut counter);

        let mut buf = [0u8; 4];
        tee.read_exact(&mut buf).unwrap();
        drop(tee);

        assert_eq!(&buf, b"0123");
        assert_eq!(counter.len(), 4);
    }

    #[test]
    fn test_multi_writer_fans_out() {
        let mut counter = ByteCounter::new();
        let mut out = Vec::new();

        let mut writer = MultiWriter::new(&mut out, &mut counter);
        writer.write_all(b"abc").unwrap();
        writer.write_all(b"defg").unwrap();
        writer.flush().unwrap();
        drop(writer);

        assert_eq!(out, b"abcdefg");
        assert_eq!(counter.len(), 7);
    }

    #[test]
    fn test_multi_writer_surfaces_primary_error() {
        let mut counter = ByteCounter::new();
        let mut writer = MultiWriter::new(FailingWriter, &mut counter);

        let err = writer.write_all(b"abc").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        drop(writer);
        assert_eq!(counter.len(), 0);
    }

    #[test]
    fn test_tee_reader_surfaces_writer_error() {
        let mut tee = TeeReader::new(&b"abc"[..], FailingWriter);
        let mut out = Vec::new();
        let err = tee.read_to_end(&mut out).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: the tally equals the total length of all chunks written.
        #[test]
        fn prop_counter_sums_chunks(
            chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..64), 0..16),
        ) {
            let mut counter = ByteCounter::new();
            let mut out = Vec::new();
            {
                let mut writer = MultiWriter::new(&mut out, &mut counter);
                for chunk in &chunks {
                    writer.write_all(chunk).unwrap();
                }
            }

            let expected: Vec<u8> = chunks.concat();
            prop_assert_eq!(counter.len(), expected.len() as u64);
            prop_assert_eq!(out, expected);
        }

        /// Property: a fully drained tee reports the source length.
        #[test]
        fn prop_tee_counts_source_len(data in prop::collection::vec(any::<u8>(), 0..4096)) {
            let mut counter = ByteCounter::new();
            let mut out = Vec::new();
            TeeReader::new(data.as_slice(), &mut counter)
                .read_to_end(&mut out)
                .unwrap();

            prop_assert_eq!(counter.len(), data.len() as u64);
            prop_assert_eq!(out, data);
        }
    }
}
