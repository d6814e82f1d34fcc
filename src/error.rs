//! Crate-wide error type.

use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised while loading feeds, parsing configuration or resolving
/// trading periods.
///
/// Curve construction itself never fails; see
/// [`build_curve`](crate::market::curve::build_curve).
#[derive(Error, Debug)]
pub enum Error {
    /// File access errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed JSON feed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML data file.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Malformed CSV input or failed CSV write.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record that was read but could not be interpreted.
    #[error("parse error on line {line}: {message}")]
    Parse {
        /// 1-based input line (0 when unknown).
        line: u64,
        /// What was wrong with the record.
        message: String,
    },

    /// Trading period outside `1..=48`.
    #[error("trading period {0} is out of range (expected 1..=48)")]
    Period(u32),

    /// Invalid or unreadable configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Convenience alias for results using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
