//! The pull-based stream buffer observers drain from, plus the auto-logging
//! file append — both guarded by a single lock independent of the driver's
//! state lock, so observers and log flushes never contend with simulation
//! stepping.

use crate::errors::SimError;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Default)]
struct StreamState {
    buffer: Vec<(String, String)>,
    log: Option<(PathBuf, BufWriter<File>)>,
}

/// Unbounded FIFO of (timestamp, sentence) pairs plus the optional
/// append-only log file, both drained/appended atomically.
#[derive(Default)]
pub struct StreamBuffer {
    inner: Mutex<StreamState>,
}

impl StreamBuffer {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(StreamState::default()),
        }
    }

    /// Appends `sentences` to the stream buffer, timestamped with
    /// `wall_clock_hhmmssmmm`, and — if auto-logging is active — appends
    /// each raw sentence to the log file. A log write failure is reported
    /// but never interrupts streaming.
    pub fn push_batch(
        &self,
        wall_clock_hhmmssmmm: &str,
        sentences: &[String],
    ) -> Option<SimError> {
        let mut state = self.inner.lock().expect("stream lock poisoned");
        let mut log_error = None;
        for sentence in sentences {
            state
                .buffer
                .push((wall_clock_hhmmssmmm.to_string(), sentence.clone()));
            if let Some((_, writer)) = state.log.as_mut() {
                if let Err(e) = writeln!(writer, "{sentence}").and_then(|_| writer.flush()) {
                    log_error = Some(SimError::LogWrite(e));
                }
            }
        }
        log_error
    }

    /// Returns and clears the buffered (timestamp, sentence) pairs.
    pub fn drain(&self) -> Vec<(String, String)> {
        let mut state = self.inner.lock().expect("stream lock poisoned");
        std::mem::take(&mut state.buffer)
    }

    pub fn start_auto_logging(&self, path: PathBuf) -> Result<PathBuf, SimError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(SimError::LogWrite)?;
            }
        }
        let file = File::create(&path).map_err(SimError::LogWrite)?;
        let mut state = self.inner.lock().expect("stream lock poisoned");
        state.log = Some((path.clone(), BufWriter::new(file)));
        Ok(path)
    }

    pub fn stop_auto_logging(&self) {
        let mut state = self.inner.lock().expect("stream lock poisoned");
        if let Some((_, mut writer)) = state.log.take() {
            let _ = writer.flush();
        }
    }

    pub fn log_filename(&self) -> Option<PathBuf> {
        let state = self.inner.lock().expect("stream lock poisoned");
        state.log.as_ref().map(|(path, _)| path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_clears_the_buffer() {
        let buf = StreamBuffer::new();
        buf.push_batch("12:00:00.000", &["$GPGGA*00".to_string()]);
        assert_eq!(buf.drain().len(), 1);
        assert!(buf.drain().is_empty());
    }

    #[test]
    fn auto_logging_writes_lines_to_file() {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let id = COUNTER.fetch_add(1, Ordering::Relaxed);

        let dir = std::env::temp_dir().join(format!("nmea_sim_test_{}_{id}", std::process::id()));
        let path = dir.join("test.nmea");
        let buf = StreamBuffer::new();
        buf.start_auto_logging(path.clone()).unwrap();
        buf.push_batch("12:00:00.000", &["$GPGGA*00".to_string(), "$GPRMC*11".to_string()]);
        buf.stop_auto_logging();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "$GPGGA*00\n$GPRMC*11\n");
        let _ = std::fs::remove_dir_all(&dir);
    }
}
