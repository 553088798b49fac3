//! Error types for melprep

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for melprep
#[derive(Error, Debug)]
pub enum Error {
    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{}:{line}: malformed line: {reason}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Speaker {speaker} (from {}) has no entry in the speaker table", path.display())]
    UnknownSpeaker { speaker: String, path: PathBuf },

    #[error("{actual} Hz sample rate doesn't match target {expected} Hz")]
    SampleRateMismatch { actual: u32, expected: u32 },

    #[error("{}: {source}", path.display())]
    Sample {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },
}

impl Error {
    /// Attach the audio path a per-sample failure came from
    pub fn for_sample(path: impl Into<PathBuf>, source: Error) -> Self {
        Error::Sample {
            path: path.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error, or the per-sample error it wraps, is a sample-rate mismatch
    pub fn is_sample_rate_mismatch(&self) -> bool {
        match self {
            Error::SampleRateMismatch { .. } => true,
            Error::Sample { source, .. } => source.is_sample_rate_mismatch(),
            _ => false,
        }
    }
}

/// Result type for melprep operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<hound::Error> for Error {
    fn from(err: hound::Error) -> Self {
        Error::Audio(err.to_string())
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Error::ShapeMismatch {
            expected: "valid shape".into(),
            actual: err.to_string(),
        }
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Config(err.to_string())
    }
}
