//! Instance-level tuning knobs for a `Driver`. Deserialising these from an
//! on-disk format is a front-end concern; the core only needs the struct.

use crate::constants::{
    DEFAULT_HEADING_VARIATION_DEG, DEFAULT_INTERVAL_SECONDS, DEFAULT_SENTENCE_DELIMITER,
    DEFAULT_STEP_SECONDS,
};
use crate::receiver::{TalkerId, ALL_SENTENCE_IDS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Wall-clock tick period, seconds.
    pub interval_seconds: f64,
    /// Simulated time advance per tick, seconds; when equal to
    /// `interval_seconds`, the driver uses actual elapsed wall time instead.
    pub step_seconds: f64,
    /// Separator written between sentences on the sink.
    pub delimiter: String,
    /// Amplitude of the uniform heading jitter applied each tick.
    pub heading_variation_deg: f64,
    /// Which of the 7 sentence identifiers are emitted.
    pub enabled_sentences: BTreeSet<String>,
    /// Talker-id prefix for the primary (GPS) receiver.
    pub primary_talker: TalkerIdConfig,
    /// Whether a secondary GLONASS receiver is simulated alongside GPS.
    pub enable_glonass: bool,
}

/// Serde-friendly mirror of `crate::receiver::TalkerId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TalkerIdConfig {
    Gp,
    Gl,
    Gn,
}

impl From<TalkerIdConfig> for TalkerId {
    fn from(value: TalkerIdConfig) -> Self {
        match value {
            TalkerIdConfig::Gp => TalkerId::Gp,
            TalkerIdConfig::Gl => TalkerId::Gl,
            TalkerIdConfig::Gn => TalkerId::Gn,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            step_seconds: DEFAULT_STEP_SECONDS,
            delimiter: DEFAULT_SENTENCE_DELIMITER.to_string(),
            heading_variation_deg: DEFAULT_HEADING_VARIATION_DEG,
            enabled_sentences: ALL_SENTENCE_IDS.iter().map(|s| s.to_string()).collect(),
            primary_talker: TalkerIdConfig::Gp,
            enable_glonass: false,
        }
    }
}

impl DriverConfig {
    pub fn with_interval_seconds(mut self, seconds: f64) -> Self {
        self.interval_seconds = seconds;
        self
    }

    pub fn with_step_seconds(mut self, seconds: f64) -> Self {
        self.step_seconds = seconds;
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_heading_variation_deg(mut self, deg: f64) -> Self {
        self.heading_variation_deg = deg;
        self
    }

    pub fn with_enabled_sentences(mut self, ids: impl IntoIterator<Item = &'static str>) -> Self {
        self.enabled_sentences = ids.into_iter().map(|s| s.to_string()).collect();
        self
    }
}
