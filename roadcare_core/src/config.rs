//! Detection configuration.
//!
//! A plain immutable value passed into every call. Callers override any
//! subset of fields; everything else keeps its default.

use crate::error::{DetectionError, Result};
use serde::{Deserialize, Serialize};

/// Thresholds and scan caps for duplicate detection.
///
/// Deserializes from the UI's options object, whose keys are
/// `PROXIMITY_THRESHOLD`, `USER_DUPLICATE_THRESHOLD_HOURS`,
/// `GEOHASH_PRECISION`, `MAX_USER_REPORTS_TO_CHECK` and
/// `MAX_ALL_REPORTS_TO_CHECK`. Missing keys take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct DetectionConfig {
    /// Two locations within this many meters are "the same place" (default: 50)
    pub proximity_threshold: f64,

    /// Same-user resubmission window in hours (default: 72)
    pub user_duplicate_threshold_hours: f64,

    /// Characters in the diagnostic location hash (default: 8)
    pub geohash_precision: usize,

    /// Cap on the user's own reports scanned, in list order (default: 50)
    pub max_user_reports_to_check: usize,

    /// Cap on the all-users pool scanned, in list order (default: 200)
    pub max_all_reports_to_check: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            proximity_threshold: 50.0,
            user_duplicate_threshold_hours: 72.0,
            geohash_precision: 8,
            max_user_reports_to_check: 50,
            max_all_reports_to_check: 200,
        }
    }
}

impl DetectionConfig {
    /// Sets the proximity threshold in meters.
    pub fn with_proximity_threshold(mut self, meters: f64) -> Self {
        self.proximity_threshold = meters;
        self
    }

    /// Sets the same-user duplicate window in hours.
    pub fn with_user_duplicate_threshold_hours(mut self, hours: f64) -> Self {
        self.user_duplicate_threshold_hours = hours;
        self
    }

    /// Sets the geohash precision.
    pub fn with_geohash_precision(mut self, precision: usize) -> Self {
        self.geohash_precision = precision;
        self
    }

    /// Sets the cap on the user's own reports.
    pub fn with_max_user_reports(mut self, max: usize) -> Self {
        self.max_user_reports_to_check = max;
        self
    }

    /// Sets the cap on the all-users pool.
    pub fn with_max_all_reports(mut self, max: usize) -> Self {
        self.max_all_reports_to_check = max;
        self
    }

    /// Parses an options object, validating the result.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| DetectionError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects thresholds the scans cannot meaningfully use.
    pub fn validate(&self) -> Result<()> {
        if !self.proximity_threshold.is_finite() || self.proximity_threshold < 0.0 {
            return Err(DetectionError::config(format!(
                "PROXIMITY_THRESHOLD must be a non-negative number of meters, got {}",
                self.proximity_threshold
            )));
        }
        if !self.user_duplicate_threshold_hours.is_finite()
            || self.user_duplicate_threshold_hours < 0.0
        {
            return Err(DetectionError::config(format!(
                "USER_DUPLICATE_THRESHOLD_HOURS must be a non-negative number of hours, got {}",
                self.user_duplicate_threshold_hours
            )));
        }
        if self.geohash_precision == 0 {
            return Err(DetectionError::InvalidPrecision(self.geohash_precision));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DetectionConfig::default();
        assert_eq!(config.proximity_threshold, 50.0);
        assert_eq!(config.user_duplicate_threshold_hours, 72.0);
        assert_eq!(config.geohash_precision, 8);
        assert_eq!(config.max_user_reports_to_check, 50);
        assert_eq!(config.max_all_reports_to_check, 200);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let config =
            DetectionConfig::from_json(r#"{"PROXIMITY_THRESHOLD": 25, "MAX_ALL_REPORTS_TO_CHECK": 10}"#)
                .unwrap();

        assert_eq!(config.proximity_threshold, 25.0);
        assert_eq!(config.max_all_reports_to_check, 10);
        assert_eq!(config.user_duplicate_threshold_hours, 72.0);
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let config = DetectionConfig::default().with_proximity_threshold(-1.0);
        assert!(matches!(config.validate(), Err(DetectionError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_precision() {
        let config = DetectionConfig::default().with_geohash_precision(0);
        assert_eq!(config.validate(), Err(DetectionError::InvalidPrecision(0)));
    }

    #[test]
    fn test_accepts_long_precision() {
        let config = DetectionConfig::from_json("{\"GEOHASH_PRECISION\": 16}").unwrap();
        assert_eq!(config.geohash_precision, 16);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(DetectionConfig::from_json("{\"PROXIMITY_THRESHOLD\": \"far\"}").is_err());
    }
}
