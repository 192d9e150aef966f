//! Same-user duplicate scan (BLOCKING).
//!
//! A user may not report the same spot twice inside the resubmission window.
//! Other users reporting the same spot is welcome and handled by
//! [`crate::similarity`]; it never blocks.

use crate::config::DetectionConfig;
use crate::distance::{distance_between, hours_between, is_within_proximity};
use crate::report::{CandidateReport, ReportDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// One prior report by the same user that blocks the new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDuplicateMatch {
    /// The prior report, unchanged
    pub report: CandidateReport,
    /// Distance to the new submission, nearest meter
    pub distance_meters: u64,
    /// Hours since the prior report, 1 decimal
    pub time_diff_hours: f64,
    /// Hours left in the window, 1 decimal. Zero or less means eligible now.
    pub remaining_hours: f64,
}

/// Verdict of the same-user scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDuplicateCheck {
    pub is_user_duplicate: bool,
    pub can_submit: bool,
    /// Most recent prior report first
    pub user_duplicates: Vec<UserDuplicateMatch>,
    pub message: String,
}

impl UserDuplicateCheck {
    /// Non-blocking verdict for a submission that cannot be evaluated.
    pub fn unidentified() -> Self {
        Self {
            is_user_duplicate: false,
            can_submit: true,
            user_duplicates: Vec::new(),
            message: "Invalid report data or user not identified".to_string(),
        }
    }

    /// The match the UI cites: the most recent prior report.
    pub fn most_recent(&self) -> Option<&UserDuplicateMatch> {
        self.user_duplicates.first()
    }
}

pub(crate) fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Scan the user's own prior reports for a blocking duplicate.
///
/// Only candidates whose `userId` equals the new report's are considered,
/// even if the caller already filtered. At most
/// `max_user_reports_to_check` of those are scanned, in caller order.
/// A match needs both proximity and the time window. Candidates without a
/// usable location or timestamp are skipped.
///
/// `now` stands in for a missing `submission_time`.
pub fn check_user_duplicate(
    new_report: &ReportDescriptor,
    user_reports: &[CandidateReport],
    config: &DetectionConfig,
    now: DateTime<Utc>,
) -> UserDuplicateCheck {
    let (Some(location), Some(user_id)) = (new_report.location.as_ref(), new_report.user_id.as_ref())
    else {
        debug!("user duplicate scan skipped: location or user id missing");
        return UserDuplicateCheck::unidentified();
    };

    let submitted_at = new_report.submission_time.unwrap_or(now);
    let window = config.user_duplicate_threshold_hours;

    let mut scanned = 0usize;
    let mut skipped = 0usize;
    let mut user_duplicates = Vec::new();

    for report in user_reports
        .iter()
        .filter(|r| r.is_from(user_id))
        .take(config.max_user_reports_to_check)
    {
        scanned += 1;

        let (Some(point), Some(reported_at)) = (report.point(), report.timestamp()) else {
            skipped += 1;
            continue;
        };

        if !is_within_proximity(Some(location), Some(&point), config.proximity_threshold) {
            continue;
        }

        let Some(elapsed) = hours_between(submitted_at, reported_at) else {
            continue;
        };
        if elapsed > window {
            continue;
        }

        user_duplicates.push(UserDuplicateMatch {
            report: report.clone(),
            distance_meters: distance_between(location, &point).round() as u64,
            time_diff_hours: round_tenth(elapsed),
            remaining_hours: round_tenth(window - elapsed),
        });
    }

    user_duplicates.sort_by(|a, b| a.time_diff_hours.total_cmp(&b.time_diff_hours));

    debug!(
        user = %user_id,
        scanned,
        skipped,
        matched = user_duplicates.len(),
        "user duplicate scan complete"
    );

    let message = match user_duplicates.first() {
        Some(latest) => format!(
            "You already reported this location {}h ago. Please wait {}h before reporting again.",
            latest.time_diff_hours, latest.remaining_hours
        ),
        None => "No user duplicates found - you can submit this report.".to_string(),
    };

    let is_user_duplicate = !user_duplicates.is_empty();

    UserDuplicateCheck {
        is_user_duplicate,
        can_submit: !is_user_duplicate,
        user_duplicates,
        message,
    }
}
