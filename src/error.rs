use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `SimError` and maps to other errors to
/// convert to a `SimError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum SimError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    InvalidParameter(String),
    ReportError(String),
}

impl From<io::Error> for SimError {
    fn from(error: io::Error) -> Self {
        SimError::IoError(error)
    }
}

impl From<serde_json::Error> for SimError {
    fn from(error: serde_json::Error) -> Self {
        SimError::JsonError(error)
    }
}

impl From<csv::Error> for SimError {
    fn from(error: csv::Error) -> Self {
        SimError::CSVError(error)
    }
}

impl std::error::Error for SimError {}

impl Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::InvalidParameter(msg) => write!(f, "Error: invalid parameter: {msg}"),
            SimError::ReportError(msg) => write!(f, "Error: report: {msg}"),
            other => write!(f, "Error: {other:?}"),
        }
    }
}
