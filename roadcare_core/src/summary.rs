//! UI-facing projections of a detection result.
//!
//! Nothing here makes a decision; these helpers turn a [`DetectionResult`]
//! into the status badge, the priority label and the countdown text the
//! front-end renders.

use crate::detection::DetectionResult;
use crate::similarity::priority_boost;
use serde::{Deserialize, Serialize};

/// Three-way UI status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryStatus {
    Blocked,
    SimilarFound,
    Clean,
}

/// What the UI should offer the user next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SummaryAction {
    WaitOrReview,
    InformUser,
}

/// Qualitative severity tag for the similar-reports badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityBoost {
    Low,
    Medium,
    High,
}

impl SeverityBoost {
    pub fn from_count(similar_count: usize) -> Self {
        match similar_count {
            0..=1 => Self::Low,
            2..=4 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SummaryDetails {
    #[serde(rename_all = "camelCase")]
    UserDuplicate {
        remaining_hours: f64,
        last_report_time: Option<f64>,
    },
    #[serde(rename_all = "camelCase")]
    SimilarReports {
        count: usize,
        unique_users: usize,
        severity_boost: SeverityBoost,
    },
    NewReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionSummary {
    pub can_submit: bool,
    pub status: SummaryStatus,
    pub title: String,
    pub message: String,
    pub action: Option<SummaryAction>,
    pub details: SummaryDetails,
}

fn plural(n: usize) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}

/// Project a detection result onto the UI status.
///
/// Blocked wins over similar-found; clean is neither.
pub fn get_duplicate_detection_summary(result: &DetectionResult) -> DetectionSummary {
    if result.is_user_duplicate {
        let latest = result.user_duplicates.first();
        let remaining_hours = latest.map_or(0.0, |m| m.remaining_hours);
        return DetectionSummary {
            can_submit: false,
            status: SummaryStatus::Blocked,
            title: "Duplicate Report Detected".to_string(),
            message: format!(
                "You already reported this location. Please wait {} hours before reporting again.",
                remaining_hours
            ),
            action: Some(SummaryAction::WaitOrReview),
            details: SummaryDetails::UserDuplicate {
                remaining_hours,
                last_report_time: latest.map(|m| m.time_diff_hours),
            },
        };
    }

    let count = result.similar_reports_count;
    if count > 0 {
        let users = result.unique_users;
        return DetectionSummary {
            can_submit: true,
            status: SummaryStatus::SimilarFound,
            title: "Similar Reports Found".to_string(),
            message: format!(
                "{} similar report{} from {} user{} found. This will help prioritize the repair.",
                count,
                plural(count),
                users,
                plural(users)
            ),
            action: Some(SummaryAction::InformUser),
            details: SummaryDetails::SimilarReports {
                count,
                unique_users: users,
                severity_boost: SeverityBoost::from_count(count),
            },
        };
    }

    DetectionSummary {
        can_submit: true,
        status: SummaryStatus::Clean,
        title: "Ready to Submit".to_string(),
        message: "No similar reports found. This appears to be a new issue.".to_string(),
        action: None,
        details: SummaryDetails::NewReport,
    }
}

/// Repair priority, lowest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    pub const LEVELS: [Priority; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Case-insensitive label lookup; anything unknown is `Low`.
    pub fn from_label(label: &str) -> Self {
        label.parse().unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Escalate `base` by how many people reported the same spot.
///
/// The count contributes the same 0-3 levels as the similarity tally's
/// priority boost; distinct reporters add half a level at 3 and a full
/// level at 5. The sum is floored and clamped at `Critical`.
pub fn calculate_priority_from_duplicates(
    similar_count: usize,
    unique_users: usize,
    base: Priority,
) -> Priority {
    // Counted in half levels to keep the floor exact
    let user_halves = match unique_users {
        0..=2 => 0,
        3..=4 => 1,
        _ => 2,
    };
    let halves = 2 * priority_boost(similar_count) as usize + user_halves;
    let index = (base.index() + halves / 2).min(Priority::LEVELS.len() - 1);
    Priority::LEVELS[index]
}

/// Render a wait time for the countdown badge.
///
/// Zero or negative means the window has passed.
pub fn format_time_remaining(hours: f64) -> String {
    if hours.is_nan() || hours <= 0.0 {
        return "You can now submit".to_string();
    }

    if hours >= 24.0 {
        let days = (hours / 24.0).floor() as u64;
        let rest = (hours % 24.0).floor() as u64;
        let day_part = format!("{} day{}", days, plural(days as usize));
        return if rest > 0 {
            format!("{} {}h", day_part, rest)
        } else {
            day_part
        };
    }

    if hours >= 1.0 {
        let whole = hours.floor() as u64;
        let minutes = ((hours % 1.0) * 60.0).floor() as u64;
        return if minutes > 0 {
            format!("{}h {}m", whole, minutes)
        } else {
            format!("{}h", whole)
        };
    }

    let minutes = (hours * 60.0).floor() as u64;
    format!("{} minute{}", minutes, plural(minutes as usize))
}

/// Duplicate context attached to a submission for back-end triage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateMetadata {
    pub location_hash: Option<String>,
    pub similar_reports_count: usize,
    pub unique_users: usize,
    pub severity_multiplier: f64,
    pub calculated_priority: Priority,
}

impl DetectionResult {
    /// Build the metadata record sent alongside the report.
    pub fn submission_metadata(&self, base: Priority) -> DuplicateMetadata {
        DuplicateMetadata {
            location_hash: self.location_hash.clone(),
            similar_reports_count: self.similar_reports_count,
            unique_users: self.unique_users,
            severity_multiplier: self.severity_multiplier,
            calculated_priority: calculate_priority_from_duplicates(
                self.similar_reports_count,
                self.unique_users,
                base,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duplicate::UserDuplicateMatch;
    use crate::report::CandidateReport;
    use proptest::prelude::*;
    use serde_json::json;

    fn clean() -> DetectionResult {
        let mut result = DetectionResult::unavailable();
        result.blocking_message = "No user duplicates found - you can submit this report.".into();
        result.info_message = "No similar reports found".into();
        result
    }

    #[test]
    fn test_blocked_summary() {
        let mut result = clean();
        result.is_user_duplicate = true;
        result.can_submit = false;
        result.user_duplicates.push(UserDuplicateMatch {
            report: CandidateReport::default(),
            distance_meters: 3,
            time_diff_hours: 10.0,
            remaining_hours: 62.0,
        });
        // Blocking wins even with similar reports present
        result.similar_reports_count = 4;

        let summary = get_duplicate_detection_summary(&result);

        assert_eq!(summary.status, SummaryStatus::Blocked);
        assert!(!summary.can_submit);
        assert_eq!(summary.action, Some(SummaryAction::WaitOrReview));
        assert_eq!(
            summary.message,
            "You already reported this location. Please wait 62 hours before reporting again."
        );
        assert_eq!(
            summary.details,
            SummaryDetails::UserDuplicate { remaining_hours: 62.0, last_report_time: Some(10.0) }
        );
    }

    #[test]
    fn test_similar_found_summary() {
        let mut result = clean();
        result.similar_reports_count = 5;
        result.unique_users = 1;

        let summary = get_duplicate_detection_summary(&result);

        assert_eq!(summary.status, SummaryStatus::SimilarFound);
        assert!(summary.can_submit);
        assert_eq!(summary.action, Some(SummaryAction::InformUser));
        assert_eq!(
            summary.message,
            "5 similar reports from 1 user found. This will help prioritize the repair."
        );
        assert!(matches!(
            summary.details,
            SummaryDetails::SimilarReports { severity_boost: SeverityBoost::High, .. }
        ));
    }

    #[test]
    fn test_clean_summary_serialization() {
        let summary = get_duplicate_detection_summary(&clean());
        let value = serde_json::to_value(&summary).unwrap();

        assert_eq!(
            value,
            json!({
                "canSubmit": true,
                "status": "clean",
                "title": "Ready to Submit",
                "message": "No similar reports found. This appears to be a new issue.",
                "action": null,
                "details": {"type": "new_report"},
            })
        );
    }

    #[test]
    fn test_severity_boost_tags() {
        assert_eq!(SeverityBoost::from_count(1), SeverityBoost::Low);
        assert_eq!(SeverityBoost::from_count(2), SeverityBoost::Medium);
        assert_eq!(SeverityBoost::from_count(5), SeverityBoost::High);
    }

    #[test]
    fn test_priority_examples() {
        assert_eq!(calculate_priority_from_duplicates(9, 6, Priority::Low), Priority::Critical);
        assert_eq!(calculate_priority_from_duplicates(0, 0, Priority::Low), Priority::Low);
        assert_eq!(calculate_priority_from_duplicates(2, 1, Priority::Low), Priority::Medium);
        // Half a level alone does not promote
        assert_eq!(calculate_priority_from_duplicates(1, 3, Priority::Low), Priority::Low);
        assert_eq!(calculate_priority_from_duplicates(4, 3, Priority::Low), Priority::High);
        assert_eq!(calculate_priority_from_duplicates(4, 5, Priority::Low), Priority::Critical);
        assert_eq!(calculate_priority_from_duplicates(0, 0, Priority::Critical), Priority::Critical);
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(Priority::from_label("high"), Priority::High);
        assert_eq!(Priority::from_label(" Critical "), Priority::Critical);
        assert_eq!(Priority::from_label("urgent"), Priority::Low);
        assert_eq!(serde_json::to_value(Priority::Medium).unwrap(), json!("Medium"));
    }

    #[test]
    fn test_plural_only_above_one() {
        assert_eq!(plural(0), "");
        assert_eq!(plural(1), "");
        assert_eq!(plural(2), "s");
    }

    #[test]
    fn test_format_time_remaining() {
        assert_eq!(format_time_remaining(0.0), "You can now submit");
        assert_eq!(format_time_remaining(-3.0), "You can now submit");
        assert_eq!(format_time_remaining(0.5), "30 minutes");
        assert_eq!(format_time_remaining(0.025), "1 minute");
        // Under a minute left: singular, as with a count of one
        assert_eq!(format_time_remaining(0.005), "0 minute");
        assert_eq!(format_time_remaining(2.0), "2h");
        assert_eq!(format_time_remaining(2.25), "2h 15m");
        assert_eq!(format_time_remaining(24.0), "1 day");
        assert_eq!(format_time_remaining(25.0), "1 day 1h");
        assert_eq!(format_time_remaining(62.0), "2 days 14h");
    }

    #[test]
    fn test_submission_metadata() {
        let mut result = clean();
        result.location_hash = Some("w94d12dn".into());
        result.similar_reports_count = 6;
        result.unique_users = 4;
        result.severity_multiplier = 1.5;

        let metadata = result.submission_metadata(Priority::Low);

        assert_eq!(metadata.calculated_priority, Priority::High);
        assert_eq!(
            serde_json::to_value(&metadata).unwrap(),
            json!({
                "locationHash": "w94d12dn",
                "similarReportsCount": 6,
                "uniqueUsers": 4,
                "severityMultiplier": 1.5,
                "calculatedPriority": "High",
            })
        );
    }

    proptest! {
        #[test]
        fn prop_priority_monotonic(
            count in 0usize..20,
            users in 0usize..10,
            base in 0usize..4,
        ) {
            let base = Priority::LEVELS[base];
            let p = calculate_priority_from_duplicates(count, users, base);
            prop_assert!(p >= base);
            prop_assert!(calculate_priority_from_duplicates(count + 1, users, base) >= p);
            prop_assert!(calculate_priority_from_duplicates(count, users + 1, base) >= p);
        }
    }
}
