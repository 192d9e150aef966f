//! Combined duplicate detection and the fail-open boundary.
//!
//! The blocking verdict and the similarity tally are computed independently
//! and merged into one [`DetectionResult`]. [`DuplicateDetector::safe_duplicate_check`]
//! is the single recovery boundary: whatever goes wrong inside, the caller gets
//! a [`DetectionOutcome::Degraded`] that still lets the submission through.

use crate::config::DetectionConfig;
use crate::duplicate::{check_user_duplicate, UserDuplicateCheck, UserDuplicateMatch};
use crate::error::Result;
use crate::geohash::geohash;
use crate::report::{CandidateReport, ReportDescriptor};
use crate::similarity::{count_similar_reports, SimilarMatch, SimilarReportsCheck};
use roadcare_env::{ReportClock, SystemClock};
use serde::{Deserialize, Serialize};
use std::panic::{self, AssertUnwindSafe};
use tracing::{debug, warn};

/// Blocking message carried by a degraded outcome.
pub const UNAVAILABLE_BLOCKING_MESSAGE: &str =
    "Duplicate detection unavailable - proceeding with submission";

/// Info message carried by a degraded outcome.
pub const UNAVAILABLE_INFO_MESSAGE: &str = "Unable to check for similar reports";

/// Everything the UI needs about one submission attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    // Same-user prevention (BLOCKING)
    pub is_user_duplicate: bool,
    pub can_submit: bool,
    pub user_duplicates: Vec<UserDuplicateMatch>,

    // Similar reports (NON-BLOCKING)
    pub similar_reports_count: usize,
    pub similar_reports: Vec<SimilarMatch>,
    pub severity_multiplier: f64,
    pub priority_boost: u8,
    pub unique_users: usize,

    /// Diagnostic fingerprint of the new report's location
    pub location_hash: Option<String>,

    pub blocking_message: String,
    pub info_message: String,
}

impl DetectionResult {
    /// Merge the two independent scans.
    pub fn combine(
        user: UserDuplicateCheck,
        similar: SimilarReportsCheck,
        location_hash: Option<String>,
    ) -> Self {
        Self {
            is_user_duplicate: user.is_user_duplicate,
            can_submit: user.can_submit,
            user_duplicates: user.user_duplicates,
            similar_reports_count: similar.similar_reports_count,
            similar_reports: similar.similar_reports,
            severity_multiplier: similar.severity_multiplier,
            priority_boost: similar.priority_boost,
            unique_users: similar.unique_users,
            location_hash,
            blocking_message: user.message,
            info_message: similar.message,
        }
    }

    /// Permissive result with zeroed counts, used when detection is unavailable.
    pub fn unavailable() -> Self {
        Self {
            is_user_duplicate: false,
            can_submit: true,
            user_duplicates: Vec::new(),
            similar_reports_count: 0,
            similar_reports: Vec::new(),
            severity_multiplier: 1.0,
            priority_boost: 0,
            unique_users: 0,
            location_hash: None,
            blocking_message: UNAVAILABLE_BLOCKING_MESSAGE.to_string(),
            info_message: UNAVAILABLE_INFO_MESSAGE.to_string(),
        }
    }
}

/// Result of the fail-open check.
///
/// Callers can tell a clean check from one that could not run without
/// inspecting message strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DetectionOutcome {
    /// Detection ran to completion.
    Checked(DetectionResult),

    /// Detection failed; `result` is the permissive fallback.
    Degraded { reason: String, result: DetectionResult },
}

impl DetectionOutcome {
    pub fn result(&self) -> &DetectionResult {
        match self {
            Self::Checked(result) | Self::Degraded { result, .. } => result,
        }
    }

    pub fn into_result(self) -> DetectionResult {
        match self {
            Self::Checked(result) | Self::Degraded { result, .. } => result,
        }
    }

    pub fn can_submit(&self) -> bool {
        self.result().can_submit
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    fn degraded(reason: impl Into<String>) -> Self {
        Self::Degraded {
            reason: reason.into(),
            result: DetectionResult::unavailable(),
        }
    }
}

/// Stateless detection engine bound to a configuration and a clock.
///
/// Generic over the clock so the same code runs against the wall clock in
/// production and a fixed instant in tests and simulation. Holds no mutable
/// state; one detector can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct DuplicateDetector<C: ReportClock = SystemClock> {
    config: DetectionConfig,
    clock: C,
}

impl DuplicateDetector<SystemClock> {
    /// Creates a detector on the system clock.
    pub fn new(config: DetectionConfig) -> Self {
        Self::with_clock(config, SystemClock::new())
    }
}

impl Default for DuplicateDetector<SystemClock> {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl<C: ReportClock> DuplicateDetector<C> {
    /// Creates a detector on an injected clock.
    pub fn with_clock(config: DetectionConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Same-user scan (BLOCKING). See [`check_user_duplicate`].
    pub fn check_user_duplicate(
        &self,
        new_report: &ReportDescriptor,
        user_reports: &[CandidateReport],
    ) -> UserDuplicateCheck {
        check_user_duplicate(new_report, user_reports, &self.config, self.clock.now())
    }

    /// All-users tally (NON-BLOCKING). See [`count_similar_reports`].
    pub fn count_similar_reports(
        &self,
        new_report: &ReportDescriptor,
        all_reports: &[CandidateReport],
    ) -> SimilarReportsCheck {
        count_similar_reports(new_report, all_reports, &self.config, self.clock.now())
    }

    /// Run both scans and attach the location hash.
    ///
    /// # Errors
    /// Fails only if the new report's location is out of range (the geohash
    /// encoder rejects it) or the configured precision is invalid.
    pub fn check_duplicate_submission(
        &self,
        new_report: &ReportDescriptor,
        user_reports: &[CandidateReport],
        all_reports: &[CandidateReport],
    ) -> Result<DetectionResult> {
        // One instant for both scans
        let now = self.clock.now();

        let user = check_user_duplicate(new_report, user_reports, &self.config, now);
        let similar = count_similar_reports(new_report, all_reports, &self.config, now);

        let location_hash = new_report
            .location
            .map(|loc| geohash(loc.latitude, loc.longitude, self.config.geohash_precision))
            .transpose()?;

        debug!(
            can_submit = user.can_submit,
            similar = similar.similar_reports_count,
            location_hash = location_hash.as_deref().unwrap_or("-"),
            "duplicate check complete"
        );

        Ok(DetectionResult::combine(user, similar, location_hash))
    }

    /// [`check_duplicate_submission`](Self::check_duplicate_submission) that
    /// never blocks on its own failure.
    ///
    /// Errors and panics inside the pipeline become
    /// [`DetectionOutcome::Degraded`] with `can_submit = true`.
    pub fn safe_duplicate_check(
        &self,
        new_report: &ReportDescriptor,
        user_reports: &[CandidateReport],
        all_reports: &[CandidateReport],
    ) -> DetectionOutcome {
        let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
            self.check_duplicate_submission(new_report, user_reports, all_reports)
        }));

        match attempt {
            Ok(Ok(result)) => DetectionOutcome::Checked(result),
            Ok(Err(e)) => {
                warn!(error = %e, "duplicate detection error, allowing submission");
                DetectionOutcome::degraded(e.to_string())
            }
            Err(payload) => {
                let reason = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "detection panicked".to_string());
                warn!(%reason, "duplicate detection panicked, allowing submission");
                DetectionOutcome::degraded(reason)
            }
        }
    }
}

/// Run both scans on the system clock.
pub fn check_duplicate_submission(
    new_report: &ReportDescriptor,
    user_reports: &[CandidateReport],
    all_reports: &[CandidateReport],
    config: &DetectionConfig,
) -> Result<DetectionResult> {
    DuplicateDetector::new(config.clone()).check_duplicate_submission(
        new_report,
        user_reports,
        all_reports,
    )
}

/// Fail-open combined check on the system clock.
pub fn safe_duplicate_check(
    new_report: &ReportDescriptor,
    user_reports: &[CandidateReport],
    all_reports: &[CandidateReport],
    config: &DetectionConfig,
) -> DetectionOutcome {
    DuplicateDetector::new(config.clone()).safe_duplicate_check(
        new_report,
        user_reports,
        all_reports,
    )
}
