//! One-shot check requests for `roadcare-sim --check`.
//!
//! A request file carries a new report, the two candidate lists a query
//! layer would have fetched, and optional threshold overrides:
//!
//! ```json
//! {
//!   "newReport": {"location": {"latitude": 5.9804, "longitude": 116.0735}, "userId": "u1"},
//!   "userReports": [],
//!   "allReports": [],
//!   "options": {"PROXIMITY_THRESHOLD": 30}
//! }
//! ```

use crate::context::SimClock;
use crate::error::SimError;
use chrono::{DateTime, Utc};
use roadcare_core::{
    get_duplicate_detection_summary, CandidateReport, DetectionConfig, DetectionOutcome,
    DetectionSummary, DuplicateDetector, DuplicateMetadata, Priority, ReportClock,
    ReportDescriptor,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Input of a single duplicate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckRequest {
    pub new_report: ReportDescriptor,

    #[serde(default)]
    pub user_reports: Vec<CandidateReport>,

    #[serde(default)]
    pub all_reports: Vec<CandidateReport>,

    #[serde(default)]
    pub options: DetectionConfig,

    /// Pins "now" for reproducible checks; the system clock otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub now: Option<DateTime<Utc>>,
}

/// Output of a single duplicate check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub outcome: DetectionOutcome,
    pub summary: DetectionSummary,
    pub metadata: DuplicateMetadata,
}

impl CheckRequest {
    /// Parses and validates a request.
    pub fn from_json(json: &str) -> Result<Self, SimError> {
        let request: Self = serde_json::from_str(json)?;
        request.options.validate()?;
        Ok(request)
    }

    /// Reads a request file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Runs the fail-open check and builds the UI summary and metadata.
    pub fn evaluate(&self, base: Priority) -> CheckResponse {
        match self.now {
            Some(now) => {
                let detector = DuplicateDetector::with_clock(self.options.clone(), SimClock::at(0, now));
                self.evaluate_with(&detector, base)
            }
            None => self.evaluate_with(&DuplicateDetector::new(self.options.clone()), base),
        }
    }

    /// [`evaluate`](Self::evaluate) on a caller-supplied detector.
    pub fn evaluate_with<C: ReportClock>(&self, detector: &DuplicateDetector<C>, base: Priority) -> CheckResponse {
        debug!(
            user_reports = self.user_reports.len(),
            all_reports = self.all_reports.len(),
            "evaluating check request"
        );

        let outcome = detector.safe_duplicate_check(&self.new_report, &self.user_reports, &self.all_reports);
        let summary = get_duplicate_detection_summary(outcome.result());
        let metadata = outcome.result().submission_metadata(base);

        CheckResponse { outcome, summary, metadata }
    }
}
