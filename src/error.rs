//! Error types for the stroke sensing engine.
//!
//! The detection core performs no I/O, so its error surface is narrow:
//! ordering violations and degenerate values. Detectors absorb both and
//! report "no detection"; the explicit variants exist so the windows and the
//! configuration/replay layers can say precisely what went wrong.

use std::path::PathBuf;

use thiserror::Error;

/// Convenient `Result` alias used across the crate.
pub type StrokeResult<T> = Result<T, StrokeError>;

/// Top-level error type for the stroke sensing engine.
#[derive(Debug, Error)]
pub enum StrokeError {
    /// A sample arrived with a timestamp earlier than the newest retained one.
    #[error("out-of-order sample: {timestamp_ms} ms arrived after {previous_ms} ms")]
    OutOfOrder {
        /// Timestamp of the newest sample already in the window.
        previous_ms: u64,
        /// Timestamp of the rejected sample.
        timestamp_ms: u64,
    },

    /// A sample carried a NaN or infinite value.
    #[error("non-finite sample value {value} at {timestamp_ms} ms")]
    NonFiniteValue {
        /// The offending value.
        value: f64,
        /// Timestamp of the rejected sample.
        timestamp_ms: u64,
    },

    /// A configuration field holds an unusable value.
    #[error("invalid configuration value for `{field}`: {reason}")]
    InvalidConfig {
        /// Dotted path of the field.
        field: String,
        /// Human-readable explanation.
        reason: String,
    },

    /// A configuration or trace file could not be read or written.
    #[error("cannot access {path:?}: {source}")]
    FileAccess {
        /// The file involved.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line of a recorded trace could not be parsed.
    #[error("trace line {line}: {reason}")]
    TraceParse {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// A detection method name is not one of `gps`, `motion`, `both`.
    #[error("unknown detection method `{0}` (expected gps, motion or both)")]
    UnknownMethod(String),
}

impl StrokeError {
    /// Construct an [`StrokeError::InvalidConfig`] from any displayable reason.
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        StrokeError::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
