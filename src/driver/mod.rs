//! The real-time driver: owns the receivers and active strategy, ticks them
//! on a worker thread, and exposes a thread-safe pull stream to observers.
//!
//! Two locks, fixed acquisition order (state, then stream), never inverted.
//! No lock is held across sink I/O — sentences are snapshotted under the
//! state lock and written after it is released.

pub mod sink;
pub mod stream;

use crate::config::DriverConfig;
use crate::errors::SimError;
use crate::motion::{Status, Strategy};
use crate::receiver::{Receiver, TalkerId, ALL_SENTENCE_IDS};
use chrono::Local;
use log::{info, warn};
use sink::Sink;
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration as StdDuration, Instant};
use stream::StreamBuffer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Idle,
    Running,
    Stopping,
}

struct DriverState {
    receivers: Vec<Receiver>,
    strategy: Strategy,
    config: DriverConfig,
}

/// Owns one or more simulated receivers plus the currently installed
/// targeting strategy, and drives them at a fixed cadence on a worker
/// thread. `serve`/`kill` require the driver to be wrapped in an `Arc`.
pub struct Driver {
    state: Mutex<DriverState>,
    stream: StreamBuffer,
    run: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Driver {
    /// Builds a driver from `receivers`, applying `config`'s per-receiver
    /// knobs (heading jitter amplitude, enabled sentence set, primary
    /// talker-id) and, when `config.enable_glonass` is set and no GLONASS
    /// receiver is already present, appending a cloned secondary receiver
    /// tagged `GL` alongside the primary.
    pub fn new(mut receivers: Vec<Receiver>, config: DriverConfig) -> Self {
        let enabled: BTreeSet<&'static str> = ALL_SENTENCE_IDS
            .iter()
            .filter(|id| config.enabled_sentences.contains(**id))
            .copied()
            .collect();
        for receiver in &mut receivers {
            receiver.heading_variation_deg = config.heading_variation_deg;
            receiver.enabled_sentences = enabled.clone();
        }
        if let Some(primary) = receivers.first_mut() {
            primary.talker_id = config.primary_talker.into();
        }
        if config.enable_glonass && !receivers.iter().any(|r| r.talker_id == TalkerId::Gl) {
            if let Some(mut secondary) = receivers.first().cloned() {
                secondary.talker_id = TalkerId::Gl;
                receivers.push(secondary);
            }
        }
        Self {
            state: Mutex::new(DriverState {
                receivers,
                strategy: Strategy::default(),
                config,
            }),
            stream: StreamBuffer::new(),
            run: AtomicBool::new(false),
            worker: Mutex::new(None),
        }
    }

    pub fn set_targeting(&self, strategy: Strategy) {
        let mut state = self.state.lock().expect("state lock poisoned");
        state.strategy = strategy;
    }

    pub fn clear_targeting(&self) {
        let mut state = self.state.lock().expect("state lock poisoned");
        state.strategy = Strategy::default();
    }

    pub fn get_targeting_status(&self) -> Status {
        let state = self.state.lock().expect("state lock poisoned");
        state.strategy.status()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if !self.run.load(Ordering::SeqCst) {
            let worker = self.worker.lock().expect("worker lock poisoned");
            if worker.as_ref().is_some_and(|h| !h.is_finished()) {
                Lifecycle::Stopping
            } else {
                Lifecycle::Idle
            }
        } else {
            Lifecycle::Running
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.load(Ordering::SeqCst) || {
            let worker = self.worker.lock().expect("worker lock poisoned");
            worker.as_ref().is_some_and(|h| !h.is_finished())
        }
    }

    /// Requests the worker stop and joins it. Bounded by the worker's
    /// ~100 ms poll granularity.
    pub fn kill(&self) {
        self.run.store(false, Ordering::SeqCst);
        let handle = self.worker.lock().expect("worker lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    /// Starts the worker thread writing to `sink`. `serve` first kills any
    /// previously running worker. When `blocking`, joins the worker before
    /// returning.
    pub fn serve(self: &Arc<Self>, sink: Box<dyn Sink + Send>, blocking: bool) {
        self.kill();
        self.run.store(true, Ordering::SeqCst);
        let driver = Arc::clone(self);
        let handle = thread::spawn(move || driver.worker_loop(sink));
        *self.worker.lock().expect("worker lock poisoned") = Some(handle);

        if blocking {
            let handle = self.worker.lock().expect("worker lock poisoned").take();
            if let Some(handle) = handle {
                let _ = handle.join();
            }
        }
    }

    fn worker_loop(self: Arc<Self>, mut sink: Box<dyn Sink + Send>) {
        info!("nmea driver worker starting");
        while self.run.load(Ordering::SeqCst) {
            let start = Instant::now();

            let (sentences, delimiter) = {
                let state = self.state.lock().expect("state lock poisoned");
                let mut sentences = Vec::new();
                for receiver in &state.receivers {
                    sentences.extend(receiver.get_output());
                }
                (sentences, state.config.delimiter.clone())
            };

            if !sentences.is_empty() {
                let timestamp = Local::now().format("%H:%M:%S%.3f").to_string();
                if let Some(err) = self.stream.push_batch(&timestamp, &sentences) {
                    warn!("nmea log write failed: {err}");
                }
            }

            for sentence in &sentences {
                if !self.run.load(Ordering::SeqCst) {
                    break;
                }
                let line = format!("{sentence}{delimiter}");
                if let Err(err) = sink.write_line(&line) {
                    warn!("nmea sink write failed: {err}");
                }
            }

            if !self.run.load(Ordering::SeqCst) {
                break;
            }
            thread::sleep(StdDuration::from_millis(crate::constants::WORKER_POLL_MS));
            let interval = self.state.lock().expect("state lock poisoned").config.interval_seconds;
            while self.run.load(Ordering::SeqCst) && start.elapsed().as_secs_f64() < interval {
                thread::sleep(StdDuration::from_millis(crate::constants::WORKER_POLL_MS));
            }

            if self.run.load(Ordering::SeqCst) {
                let mut state = self.state.lock().expect("state lock poisoned");
                let elapsed = start.elapsed().as_secs_f64();
                let DriverState {
                    receivers,
                    strategy,
                    config,
                } = &mut *state;
                let step = if config.step_seconds == config.interval_seconds {
                    elapsed
                } else {
                    config.step_seconds
                };
                for receiver in receivers.iter_mut() {
                    receiver.advance(strategy, step);
                }
            }
        }
        info!("nmea driver worker stopped");
    }

    pub fn drain_stream(&self) -> Vec<(String, String)> {
        self.stream.drain()
    }

    pub fn start_auto_logging(&self, path: Option<PathBuf>) -> Result<PathBuf, SimError> {
        let path = path.unwrap_or_else(|| {
            let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
            PathBuf::from("logs").join(format!("nmea_log_{timestamp}.nmea"))
        });
        self.stream.start_auto_logging(path)
    }

    pub fn stop_auto_logging(&self) {
        self.stream.stop_auto_logging();
    }

    pub fn get_log_filename(&self) -> Option<PathBuf> {
        self.stream.log_filename()
    }

    pub fn output_latest(&self, sink: &mut dyn Sink) -> Result<(), SimError> {
        let state = self.state.lock().expect("state lock poisoned");
        let delimiter = state.config.delimiter.clone();
        for receiver in &state.receivers {
            for sentence in receiver.get_output() {
                sink.write_line(&format!("{sentence}{delimiter}"))?;
            }
        }
        Ok(())
    }

    /// Runs inline without a worker thread, advancing by `step` each
    /// iteration, for `duration_seconds` of simulated time.
    pub fn generate(&self, duration_seconds: f64, sink: &mut dyn Sink) -> Result<(), SimError> {
        let mut elapsed = 0.0;
        while elapsed < duration_seconds {
            let mut state = self.state.lock().expect("state lock poisoned");
            let delimiter = state.config.delimiter.clone();
            let DriverState {
                receivers,
                strategy,
                config,
            } = &mut *state;
            for receiver in receivers.iter() {
                for sentence in receiver.get_output() {
                    sink.write_line(&format!("{sentence}{delimiter}"))?;
                }
            }
            let step = config.step_seconds;
            for receiver in receivers.iter_mut() {
                receiver.advance(strategy, step);
            }
            elapsed += step;
        }
        Ok(())
    }
}
