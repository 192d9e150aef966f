//! Scenario runner - executes detection scenarios against the oracle.

use crate::context::SimClock;
use crate::oracle::ReportOracle;
use crate::scenarios::ScenarioId;

use chrono::Duration;
use roadcare_core::detection::UNAVAILABLE_BLOCKING_MESSAGE;
use roadcare_core::similarity::severity_multiplier;
use roadcare_core::{
    format_time_remaining, get_duplicate_detection_summary, CandidateReport, Coordinate,
    DetectionConfig, DetectionOutcome, DuplicateDetector, Priority, ReportClock,
    ReportDescriptor, SummaryStatus, UserId,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Results from running a scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Failure message if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// What the detector reported
    pub metrics: ScenarioMetrics,
}

/// Detector output captured for reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioMetrics {
    /// Size of the user's own history passed in
    pub user_reports: usize,

    /// Size of the all-users pool passed in
    pub all_reports: usize,

    pub can_submit: bool,
    pub degraded: bool,
    pub user_duplicates: usize,
    pub similar_reports: usize,
    pub unique_users: usize,
    pub severity_multiplier: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SummaryStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Countdown text when blocked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<String>,
}

/// Accumulates assertion failures for one scenario.
#[derive(Default)]
struct Checks(Vec<String>);

impl Checks {
    fn require(&mut self, condition: bool, failure: impl FnOnce() -> String) {
        if !condition {
            self.0.push(failure());
        }
    }

    fn into_reason(self) -> Option<String> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.join("; "))
        }
    }
}

/// Inputs and outcome of one detection run.
struct Run {
    user_reports: Vec<CandidateReport>,
    all_reports: Vec<CandidateReport>,
    outcome: DetectionOutcome,
}

/// Runs detection scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Thresholds under test
    config: DetectionConfig,

    /// Where new reports are submitted
    center: Coordinate,

    /// Base priority for the calculated priority
    base_priority: Priority,
}

impl ScenarioRunner {
    /// Creates a new scenario runner centred on Kota Kinabalu.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            config: DetectionConfig::default(),
            center: Coordinate::new(5.9804, 116.0735),
            base_priority: Priority::Low,
        }
    }

    /// Sets the detection configuration.
    pub fn with_config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the submission point.
    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = center;
        self
    }

    /// Sets the base priority.
    pub fn with_base_priority(mut self, base: Priority) -> Self {
        self.base_priority = base;
        self
    }

    /// Runs a scenario and returns the result.
    pub fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let clock = SimClock::new(self.seed);
        let oracle_seed = self
            .seed
            .wrapping_mul(0x9e3779b97f4a7c15)
            .wrapping_add(scenario as u64);
        let mut oracle = ReportOracle::new(oracle_seed, self.center, clock.now());
        let detector = DuplicateDetector::with_clock(self.config.clone(), clock);
        let mut checks = Checks::default();

        let run = match scenario {
            ScenarioId::RepeatSubmitter => self.run_repeat_submitter(&detector, &mut oracle, &mut checks),
            ScenarioId::CooledDown => self.run_cooled_down(&detector, &mut oracle, &mut checks),
            ScenarioId::CrossUser => self.run_cross_user(&detector, &mut oracle, &mut checks),
            ScenarioId::Hotspot => self.run_hotspot(&detector, &mut oracle, &mut checks),
            ScenarioId::MalformedFeed => self.run_malformed_feed(&detector, &mut oracle, &mut checks),
            ScenarioId::ScanCap => self.run_scan_cap(&detector, &mut oracle, &mut checks),
            ScenarioId::InvalidLocation => self.run_invalid_location(&detector, &mut oracle, &mut checks),
        };

        let metrics = run.map(|run| self.collect(&run)).unwrap_or_default();
        let failure_reason = checks.into_reason();
        if let Some(reason) = &failure_reason {
            warn!("{} failed: {}", scenario.name(), reason);
        }

        ScenarioResult {
            scenario,
            seed: self.seed,
            passed: failure_reason.is_none(),
            failure_reason,
            metrics,
        }
    }

    fn collect(&self, run: &Run) -> ScenarioMetrics {
        let result = run.outcome.result();
        let summary = get_duplicate_detection_summary(result);

        ScenarioMetrics {
            user_reports: run.user_reports.len(),
            all_reports: run.all_reports.len(),
            can_submit: result.can_submit,
            degraded: run.outcome.is_degraded(),
            user_duplicates: result.user_duplicates.len(),
            similar_reports: result.similar_reports_count,
            unique_users: result.unique_users,
            severity_multiplier: result.severity_multiplier,
            status: Some(summary.status),
            priority: Some(result.submission_metadata(self.base_priority).calculated_priority),
            wait: result
                .user_duplicates
                .first()
                .map(|m| format_time_remaining(m.remaining_hours)),
        }
    }

    fn new_report(&self, user: &UserId) -> ReportDescriptor {
        ReportDescriptor::new(self.center, user.clone())
    }

    /// SCN-001: the user's own report from 10 hours ago, 5m away.
    ///
    /// **Assertion**: blocked, remaining = window - 10h, status `blocked`.
    fn run_repeat_submitter(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(4);
        let me = &users[0];

        let prior = oracle.report_at(5.0, 0.0, Duration::hours(10), me);
        let mut all_reports = oracle.nearby_pool(3, &users[1..], Duration::days(2));
        all_reports.push(prior.clone());
        let user_reports = vec![prior];

        // No submission time: the detector's clock supplies "now"
        let outcome = detector.safe_duplicate_check(&self.new_report(me), &user_reports, &all_reports);
        let result = outcome.result();
        let expected_remaining = self.config.user_duplicate_threshold_hours - 10.0;

        checks.require(!result.can_submit, || "same-user report 10h ago did not block".into());
        checks.require(result.user_duplicates.len() == 1, || {
            format!("expected 1 user duplicate, got {}", result.user_duplicates.len())
        });
        if let Some(latest) = result.user_duplicates.first() {
            checks.require((latest.remaining_hours - expected_remaining).abs() < 0.05, || {
                format!("remaining {}h, expected {}h", latest.remaining_hours, expected_remaining)
            });
            checks.require(latest.distance_meters == 5, || {
                format!("distance {}m, expected 5m", latest.distance_meters)
            });
        }
        checks.require(
            get_duplicate_detection_summary(result).status == SummaryStatus::Blocked,
            || "summary is not blocked".into(),
        );

        Some(Run { user_reports, all_reports, outcome })
    }

    /// SCN-002: the user's own report from just after the window.
    ///
    /// **Assertion**: allowed; the old report still counts as similar.
    fn run_cooled_down(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(1);
        let me = &users[0];
        let age_hours = self.config.user_duplicate_threshold_hours.ceil() as i64 + 8;

        let prior = oracle.report_at(0.0, 0.0, Duration::hours(age_hours), me);
        let user_reports = vec![prior.clone()];
        let all_reports = vec![prior];

        let outcome = detector.safe_duplicate_check(&self.new_report(me), &user_reports, &all_reports);
        let result = outcome.result();

        checks.require(result.can_submit, || format!("report {}h old still blocks", age_hours));
        checks.require(result.similar_reports_count == 1, || {
            format!("expected 1 similar report, got {}", result.similar_reports_count)
        });
        checks.require(result.similar_reports.iter().all(|m| m.is_from_same_user), || {
            "own report not flagged as same user".into()
        });
        checks.require(
            get_duplicate_detection_summary(result).status == SummaryStatus::SimilarFound,
            || "summary is not similar_found".into(),
        );

        Some(Run { user_reports, all_reports, outcome })
    }

    /// SCN-003: five other users at the same spot, passed in as "own" history.
    ///
    /// **Assertion**: never blocks; five reporters escalate to 1.5x severity.
    fn run_cross_user(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(6);
        let me = &users[0];

        let reports: Vec<CandidateReport> = users[1..]
            .iter()
            .enumerate()
            .map(|(i, user)| oracle.report_at(i as f64, 1.0, Duration::hours(i as i64 + 1), user))
            .collect();

        let outcome = detector.safe_duplicate_check(&self.new_report(me), &reports, &reports);
        let result = outcome.result();

        checks.require(result.can_submit, || "other users' reports blocked submission".into());
        checks.require(result.similar_reports_count == 5, || {
            format!("expected 5 similar reports, got {}", result.similar_reports_count)
        });
        checks.require(result.unique_users == 5, || {
            format!("expected 5 unique users, got {}", result.unique_users)
        });
        checks.require(result.severity_multiplier == 1.5, || {
            format!("severity {}, expected 1.5", result.severity_multiplier)
        });
        checks.require(result.priority_boost == 2, || {
            format!("priority boost {}, expected 2", result.priority_boost)
        });

        Some(Run { user_reports: reports.clone(), all_reports: reports, outcome })
    }

    /// SCN-004: Gaussian cluster plus far-away noise.
    ///
    /// **Assertion**: count, reporters and ordering match the oracle.
    fn run_hotspot(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let threshold = self.config.proximity_threshold;
        let users = ReportOracle::user_ids(6);
        let newcomer = UserId::new("user-new");

        let mut all_reports = oracle.nearby_pool(15, &users, Duration::days(14));
        all_reports.extend(oracle.far_pool(30, threshold * 2.0, &users));

        let truth = oracle.truly_nearby(&all_reports, threshold);
        let truth_users: HashSet<_> = truth.iter().filter_map(|r| r.user_id.as_ref()).collect();
        debug!("  oracle: {} of {} reports within {}m", truth.len(), all_reports.len(), threshold);

        let outcome = detector.safe_duplicate_check(&self.new_report(&newcomer), &[], &all_reports);
        let result = outcome.result();

        checks.require(result.can_submit, || "newcomer without history was blocked".into());
        checks.require(result.similar_reports_count == truth.len(), || {
            format!("counted {}, oracle says {}", result.similar_reports_count, truth.len())
        });
        checks.require(result.unique_users == truth_users.len(), || {
            format!("{} unique users, oracle says {}", result.unique_users, truth_users.len())
        });
        checks.require(result.severity_multiplier == severity_multiplier(truth.len()), || {
            format!("severity {} does not match count {}", result.severity_multiplier, truth.len())
        });
        checks.require(
            result
                .similar_reports
                .windows(2)
                .all(|w| w[0].distance_meters <= w[1].distance_meters),
            || "similar reports not sorted closest first".into(),
        );

        Some(Run { user_reports: Vec::new(), all_reports, outcome })
    }

    /// SCN-005: broken rows mixed with good ones.
    ///
    /// **Assertion**: not degraded; only rows with a usable point count.
    fn run_malformed_feed(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(3);
        let me = &users[0];

        let junk = json!([
            {},
            {"userId": me.as_str(), "location": null},
            {"userId": me.as_str(), "location": "Jalan Tuaran, Kota Kinabalu"},
            {"userId": me.as_str(), "location": {"latitude": self.center.latitude}},
            {"userId": 2, "location": {"latitude": "5.98", "longitude": "116.07"}},
            {"userId": true, "createdAt": 1_704_067_200_000u64},
        ]);
        let mut rows: Vec<CandidateReport> = match serde_json::from_value(junk) {
            Ok(rows) => rows,
            Err(e) => {
                checks.require(false, || format!("junk feed did not deserialize: {}", e));
                return None;
            }
        };

        // Near, but the timestamp is garbage: never blocks, still counts
        let mut undated = oracle.report_at(2.0, 2.0, Duration::hours(1), me);
        undated.submission_time = Some(json!("garbage"));
        rows.push(undated);

        let mut all_reports = rows.clone();
        all_reports.push(oracle.report_at(3.0, 0.0, Duration::hours(5), &users[1]));
        all_reports.push(oracle.report_at(0.0, 4.0, Duration::hours(9), &users[2]));
        let user_reports = rows;

        let outcome = detector.safe_duplicate_check(&self.new_report(me), &user_reports, &all_reports);
        let result = outcome.result();

        checks.require(!outcome.is_degraded(), || "malformed rows degraded detection".into());
        checks.require(result.can_submit, || "malformed rows blocked submission".into());
        checks.require(result.similar_reports_count == 3, || {
            format!("expected 3 similar reports, got {}", result.similar_reports_count)
        });

        Some(Run { user_reports, all_reports, outcome })
    }

    /// SCN-006: more input than the caps allow.
    ///
    /// **Assertion**: the pool is capped; the history cap hides a duplicate
    /// that sits past it, and finds it when the caller orders it first.
    fn run_scan_cap(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(8);
        let me = &users[0];
        let threshold = self.config.proximity_threshold;

        let all_reports: Vec<CandidateReport> = (0..500)
            .map(|i| oracle.report_at((i % 10) as f64, 0.0, Duration::hours(i as i64), &users[1 + i % 7]))
            .collect();

        let history_cap = self.config.max_user_reports_to_check;
        let mut user_reports = oracle.far_pool(history_cap + 10, threshold * 2.0, std::slice::from_ref(me));
        let recent = oracle.report_at(0.0, 0.0, Duration::hours(1), me);
        user_reports.push(recent.clone());

        let outcome = detector.safe_duplicate_check(&self.new_report(me), &user_reports, &all_reports);
        let result = outcome.result();
        let expected = all_reports.len().min(self.config.max_all_reports_to_check);

        checks.require(result.can_submit, || "duplicate past the history cap was found".into());
        checks.require(result.similar_reports_count == expected, || {
            format!("counted {}, cap allows {}", result.similar_reports_count, expected)
        });
        checks.require(result.severity_multiplier == severity_multiplier(expected), || {
            format!("severity {} for {} reports", result.severity_multiplier, expected)
        });

        let mut reordered = user_reports.clone();
        reordered.rotate_right(1);
        let recent_first = detector.check_user_duplicate(&self.new_report(me), &reordered);
        checks.require(!recent_first.can_submit, || {
            "recent duplicate ordered first was not found".into()
        });

        Some(Run { user_reports, all_reports, outcome })
    }

    /// SCN-007: latitude out of range on the new report.
    ///
    /// **Assertion**: degraded, submission allowed, counts zeroed.
    fn run_invalid_location(
        &self,
        detector: &DuplicateDetector<SimClock>,
        oracle: &mut ReportOracle,
        checks: &mut Checks,
    ) -> Option<Run> {
        let users = ReportOracle::user_ids(3);
        let me = &users[0];
        let all_reports = oracle.nearby_pool(5, &users, Duration::days(1));

        let bad = ReportDescriptor::new(Coordinate::new(95.0, self.center.longitude), me.clone());
        let outcome = detector.safe_duplicate_check(&bad, &all_reports, &all_reports);
        let result = outcome.result();

        checks.require(outcome.is_degraded(), || "invalid latitude was not reported as degraded".into());
        checks.require(result.can_submit, || "degraded detection blocked submission".into());
        checks.require(result.similar_reports_count == 0, || "degraded result carries counts".into());
        checks.require(result.blocking_message == UNAVAILABLE_BLOCKING_MESSAGE, || {
            format!("unexpected blocking message: {}", result.blocking_message)
        });

        Some(Run { user_reports: all_reports.clone(), all_reports, outcome })
    }
}
