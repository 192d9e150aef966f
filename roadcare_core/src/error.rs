//! Error types for the detection engine.

use thiserror::Error;

/// Errors raised synchronously to the direct caller of a core function.
///
/// The scan functions never surface these for malformed candidates; they skip
/// the entry instead. Only the geohash encoder, timestamp parsing and config
/// validation produce them, and `safe_duplicate_check` converts any that
/// escape the combined pipeline into a degraded, non-blocking outcome.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DetectionError {
    /// Latitude outside [-90, 90] or not finite
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    /// Longitude outside [-180, 180] or not finite
    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    /// Geohash precision outside the supported range
    #[error("Invalid geohash precision: {0} (must be at least 1)")]
    InvalidPrecision(usize),

    /// Timestamp string could not be parsed as ISO-8601
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl DetectionError {
    /// Creates a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates a timestamp error.
    pub fn timestamp(raw: impl std::fmt::Display) -> Self {
        Self::InvalidTimestamp(raw.to_string())
    }
}

/// Result alias for the detection engine.
pub type Result<T> = std::result::Result<T, DetectionError>;
