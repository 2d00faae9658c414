use std::fmt;
use std::io;

/// Errors surfaced by the simulation core.
///
/// `InvalidConfiguration` is fatal at construction time: the caller never
/// gets an object back. `SinkWrite` and `LogWrite` are reported to the
/// worker's log output and never interrupt streaming (see `driver::Driver`).
#[derive(Debug)]
pub enum SimError {
    InvalidConfiguration(String),
    SinkWrite(io::Error),
    LogWrite(io::Error),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
            SimError::SinkWrite(e) => write!(f, "sink write error: {e}"),
            SimError::LogWrite(e) => write!(f, "log write error: {e}"),
        }
    }
}

impl std::error::Error for SimError {}

impl From<io::Error> for SimError {
    fn from(err: io::Error) -> Self {
        SimError::SinkWrite(err)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
