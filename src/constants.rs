/// Mean Earth radius used throughout the geodesy and motion engine (km).
///
/// The spec pins this explicitly rather than deferring to a WGS-84 ellipsoid:
/// all strategies operate on a spherical Earth.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

pub const KPH_TO_KNOTS: f64 = 1.0 / 1.852;
pub const KPH_TO_MPS: f64 = 1.0 / 3.6;

/// Amplitude (degrees) of the default uniform heading jitter.
pub const DEFAULT_HEADING_VARIATION_DEG: f64 = 45.0;

/// Default wall-clock tick period and simulated-time advance per tick (seconds).
pub const DEFAULT_INTERVAL_SECONDS: f64 = 1.0;
pub const DEFAULT_STEP_SECONDS: f64 = 1.0;

/// Granularity of the worker's sleep polling, bounding cancellation latency.
pub const WORKER_POLL_MS: u64 = 100;

pub const DEFAULT_SENTENCE_DELIMITER: &str = "\r\n";

pub const PI: f64 = std::f64::consts::PI;
