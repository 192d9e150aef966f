//! Similar-report tally (NON-BLOCKING).
//!
//! Counts nearby reports from every user, of any age, and turns the count
//! into the severity multiplier and priority boost used for triage.

use crate::config::DetectionConfig;
use crate::distance::{distance_between, hours_between, is_within_proximity};
use crate::duplicate::round_tenth;
use crate::report::{CandidateReport, ReportDescriptor};
use chrono::{DateTime, Utc};
use roadcare_env::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// One nearby report from any user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarMatch {
    pub report: CandidateReport,
    /// Nearest meter
    pub distance_meters: u64,
    /// Informational only; `None` when the candidate carries no usable timestamp
    pub time_diff_hours: Option<f64>,
    pub user_id: Option<UserId>,
    pub is_from_same_user: bool,
}

/// Outcome of the similar-report tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarReportsCheck {
    pub similar_reports_count: usize,
    /// Closest first
    pub similar_reports: Vec<SimilarMatch>,
    pub severity_multiplier: f64,
    pub priority_boost: u8,
    pub unique_users: usize,
    pub message: String,
}

impl SimilarReportsCheck {
    /// Empty tally with a caller-supplied explanation.
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            similar_reports_count: 0,
            similar_reports: Vec::new(),
            severity_multiplier: 1.0,
            priority_boost: 0,
            unique_users: 0,
            message: message.into(),
        }
    }
}

/// Severity scaling for `count` similar reports.
///
/// | count  | multiplier |
/// |--------|-----------|
/// | < 2    | 1.0 |
/// | 2..5   | 1.2 |
/// | 5..10  | 1.5 |
/// | >= 10  | 2.0 |
pub fn severity_multiplier(count: usize) -> f64 {
    match count {
        0..=1 => 1.0,
        2..=4 => 1.2,
        5..=9 => 1.5,
        _ => 2.0,
    }
}

/// Priority levels to add for `count` similar reports (0-3).
pub fn priority_boost(count: usize) -> u8 {
    match count {
        0..=1 => 0,
        2..=3 => 1,
        4..=7 => 2,
        _ => 3,
    }
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Count reports near the new one across all users.
///
/// Scans at most `max_all_reports_to_check` candidates in caller order and
/// matches on proximity alone: an old report at the same spot still counts.
/// Candidates without a usable location are skipped. Reports without a user
/// id are counted together as one anonymous reporter in `unique_users`.
pub fn count_similar_reports(
    new_report: &ReportDescriptor,
    all_reports: &[CandidateReport],
    config: &DetectionConfig,
    now: DateTime<Utc>,
) -> SimilarReportsCheck {
    let Some(location) = new_report.location.as_ref() else {
        debug!("similar report scan skipped: location missing");
        return SimilarReportsCheck::empty("No location provided - similar reports not counted");
    };

    let submitted_at = new_report.submission_time.unwrap_or(now);

    let mut skipped = 0usize;
    let mut similar_reports: Vec<SimilarMatch> = all_reports
        .iter()
        .take(config.max_all_reports_to_check)
        .filter_map(|report| {
            let Some(point) = report.point() else {
                skipped += 1;
                return None;
            };
            if !is_within_proximity(Some(location), Some(&point), config.proximity_threshold) {
                return None;
            }

            let is_from_same_user = matches!(
                (&new_report.user_id, &report.user_id),
                (Some(a), Some(b)) if a == b
            );

            Some(SimilarMatch {
                report: report.clone(),
                distance_meters: distance_between(location, &point).round() as u64,
                time_diff_hours: report
                    .timestamp()
                    .and_then(|reported_at| hours_between(submitted_at, reported_at))
                    .map(round_tenth),
                user_id: report.user_id.clone(),
                is_from_same_user,
            })
        })
        .collect();

    similar_reports.sort_by_key(|m| m.distance_meters);

    let similar_reports_count = similar_reports.len();
    let unique_users = similar_reports
        .iter()
        .map(|m| m.user_id.as_ref())
        .collect::<HashSet<_>>()
        .len();

    debug!(
        scanned = all_reports.len().min(config.max_all_reports_to_check),
        skipped,
        matched = similar_reports_count,
        unique_users,
        "similar report scan complete"
    );

    let message = if similar_reports_count > 0 {
        format!(
            "Found {} similar report{} from {} user{}",
            similar_reports_count,
            plural(similar_reports_count),
            unique_users,
            plural(unique_users)
        )
    } else {
        "No similar reports found".to_string()
    };

    SimilarReportsCheck {
        similar_reports_count,
        similar_reports,
        severity_multiplier: severity_multiplier(similar_reports_count),
        priority_boost: priority_boost(similar_reports_count),
        unique_users,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Coordinate;
    use chrono::{Duration, TimeZone};

    const KK: Coordinate = Coordinate { latitude: 5.9804, longitude: 116.0735 };

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
    }

    fn offset(north_deg: f64) -> Coordinate {
        Coordinate::new(KK.latitude + north_deg, KK.longitude)
    }

    fn count(reports: &[CandidateReport]) -> SimilarReportsCheck {
        let new_report = ReportDescriptor::new(KK, "alice").at(t0());
        count_similar_reports(&new_report, reports, &DetectionConfig::default(), t0())
    }

    #[test]
    fn test_six_reports_from_four_users() {
        let users = ["bob", "carol", "dave", "erin", "bob", "carol"];
        let reports: Vec<_> = users
            .iter()
            .enumerate()
            .map(|(i, u)| CandidateReport::new(offset(i as f64 * 0.00005), t0(), *u))
            .collect();

        let result = count(&reports);

        assert_eq!(result.similar_reports_count, 6);
        assert_eq!(result.severity_multiplier, 1.5);
        assert_eq!(result.priority_boost, 2);
        assert_eq!(result.unique_users, 4);
        assert_eq!(result.message, "Found 6 similar reports from 4 users");
    }

    #[test]
    fn test_old_reports_still_count() {
        let ancient = CandidateReport::new(KK, t0() - Duration::days(400), "bob");

        let result = count(&[ancient]);

        assert_eq!(result.similar_reports_count, 1);
        assert_eq!(result.similar_reports[0].time_diff_hours, Some(9600.0));
        assert_eq!(result.message, "Found 1 similar report from 1 user");
    }

    #[test]
    fn test_sorted_closest_first_and_same_user_flagged() {
        let reports = vec![
            CandidateReport::new(offset(0.0004), t0(), "bob"),
            CandidateReport::new(offset(0.0001), t0(), "alice"),
            CandidateReport::new(KK, t0(), "carol"),
        ];

        let result = count(&reports);
        let distances: Vec<u64> = result.similar_reports.iter().map(|m| m.distance_meters).collect();

        assert_eq!(distances, vec![0, 11, 44]);
        assert!(result.similar_reports[1].is_from_same_user);
        assert!(!result.similar_reports[0].is_from_same_user);
    }

    #[test]
    fn test_far_and_malformed_are_excluded() {
        let reports = vec![
            CandidateReport::new(offset(0.001), t0(), "bob"),
            CandidateReport { location: None, ..CandidateReport::new(KK, t0(), "bob") },
            CandidateReport { submission_time: None, ..CandidateReport::new(KK, t0(), "carol") },
        ];

        let result = count(&reports);

        // Only the undated one is near; it counts with no elapsed time
        assert_eq!(result.similar_reports_count, 1);
        assert_eq!(result.similar_reports[0].time_diff_hours, None);
    }

    #[test]
    fn test_scan_cap() {
        let reports: Vec<_> = (0..20).map(|_| CandidateReport::new(KK, t0(), "bob")).collect();
        let new_report = ReportDescriptor::new(KK, "alice").at(t0());
        let config = DetectionConfig::default().with_max_all_reports(7);

        let result = count_similar_reports(&new_report, &reports, &config, t0());

        assert_eq!(result.similar_reports_count, 7);
        assert_eq!(result.priority_boost, 2);
    }

    #[test]
    fn test_missing_location_counts_nothing() {
        let new_report = ReportDescriptor { location: None, ..ReportDescriptor::new(KK, "alice") };
        let reports = vec![CandidateReport::new(KK, t0(), "bob")];

        let result = count_similar_reports(&new_report, &reports, &DetectionConfig::default(), t0());

        assert_eq!(result.similar_reports_count, 0);
        assert_eq!(result.severity_multiplier, 1.0);
    }

    #[test]
    fn test_step_functions() {
        let multipliers: Vec<f64> = [0, 1, 2, 4, 5, 9, 10, 50].into_iter().map(severity_multiplier).collect();
        assert_eq!(multipliers, vec![1.0, 1.0, 1.2, 1.2, 1.5, 1.5, 2.0, 2.0]);

        let boosts: Vec<u8> = [0, 1, 2, 3, 4, 7, 8, 50].into_iter().map(priority_boost).collect();
        assert_eq!(boosts, vec![0, 0, 1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_no_matches_message() {
        assert_eq!(count(&[]).message, "No similar reports found");
    }
}
