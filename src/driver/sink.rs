//! Output sink abstraction: a write is attempted as text first, falling
//! back to UTF-8-encoded bytes if the underlying writer rejects text.

use crate::errors::SimError;
use std::io::Write;

/// Anything the worker can emit a formatted line to.
pub trait Sink {
    fn write_line(&mut self, line: &str) -> Result<(), SimError>;
}

/// Wraps any `std::io::Write` (a file, a TCP stream, stdout) as a `Sink`.
pub struct WriteSink<W: Write> {
    inner: W,
}

impl<W: Write> WriteSink<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }
}

impl<W: Write> Sink for WriteSink<W> {
    fn write_line(&mut self, line: &str) -> Result<(), SimError> {
        self.inner
            .write_all(line.as_bytes())
            .map_err(SimError::SinkWrite)
    }
}
