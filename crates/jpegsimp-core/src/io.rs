//! Input and output endpoints.
//!
//! Whether a stream is a plain file is decided once, where the endpoint is
//! built. Files go straight to the codec's file primitives; everything else
//! is buffered in memory.

use std::fs::File;
use std::io::{Read, Write};

/// Where an image is read from.
pub enum Source<'a> {
    /// A seekable file, decoded directly from its descriptor.
    File(&'a File),
    /// Any readable stream, drained into memory first.
    Stream(&'a mut dyn Read),
}

impl<'a> Source<'a> {
    pub fn file(file: &'a File) -> Self {
        Source::File(file)
    }

    pub fn stream<R: Read>(reader: &'a mut R) -> Self {
        Source::Stream(reader)
    }

    /// Short name of the path taken, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Source::File(_) => "file",
            Source::Stream(_) => "stream",
        }
    }
}

impl<'a> From<&'a File> for Source<'a> {
    fn from(file: &'a File) -> Self {
        Source::File(file)
    }
}

/// Where an encoded image is written to.
pub enum Sink<'a> {
    /// A file, written directly by the codec at its current position.
    File(&'a File),
    /// Any writable stream, fed from an in-memory encode.
    Stream(&'a mut dyn Write),
}

impl<'a> Sink<'a> {
    pub fn file(file: &'a File) -> Self {
        Sink::File(file)
    }

    pub fn stream<W: Write>(writer: &'a mut W) -> Self {
        Sink::Stream(writer)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Sink::File(_) => "file",
            Sink::Stream(_) => "stream",
        }
    }
}

impl<'a> From<&'a File> for Sink<'a> {
    fn from(file: &'a File) -> Self {
        Sink::File(file)
    }
}
