//! Drives every scenario through the runner across several seeds.

use chrono::{Duration, TimeZone, Utc};
use roadcare_core::{
    Coordinate, DetectionConfig, DuplicateDetector, Priority, ReportClock, ReportDescriptor,
    SummaryStatus,
};
use proptest::prelude::*;
use roadcare_sim::{
    CheckRequest, ReportOracle, ScenarioExport, ScenarioId, ScenarioRunner, SimClock,
};

#[test]
fn all_scenarios_pass_across_seeds() {
    for seed in [1, 42, 1337, 0xdead_beef] {
        let runner = ScenarioRunner::new(seed);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(
                result.passed,
                "{} failed with seed {}: {:?}",
                scenario,
                seed,
                result.failure_reason
            );
        }
    }
}

#[test]
fn scenarios_are_deterministic() {
    let a = ScenarioRunner::new(99).run(ScenarioId::Hotspot);
    let b = ScenarioRunner::new(99).run(ScenarioId::Hotspot);
    assert_eq!(a, b);
}

#[test]
fn scenarios_hold_elsewhere_on_the_globe() {
    // Near-polar longitude scaling and the southern hemisphere
    for center in [Coordinate::new(-33.8688, 151.2093), Coordinate::new(69.6492, 18.9553)] {
        let runner = ScenarioRunner::new(5).with_center(center);
        for scenario in ScenarioId::all() {
            let result = runner.run(scenario);
            assert!(result.passed, "{} at {:?}: {:?}", scenario, center, result.failure_reason);
        }
    }
}

#[test]
fn invalid_location_degrades_but_allows() {
    let result = ScenarioRunner::new(3).run(ScenarioId::InvalidLocation);

    assert!(result.passed);
    assert!(result.metrics.degraded);
    assert!(result.metrics.can_submit);
    assert_eq!(result.metrics.status, Some(SummaryStatus::Clean));
}

#[test]
fn custom_caps_flow_through() {
    let config = DetectionConfig::default().with_max_all_reports(20).with_max_user_reports(5);
    let result = ScenarioRunner::new(11).with_config(config).run(ScenarioId::ScanCap);

    assert!(result.passed, "{:?}", result.failure_reason);
    assert_eq!(result.metrics.similar_reports, 20);
}

#[test]
fn export_collects_full_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let runner = ScenarioRunner::new(8);
    let mut export = ScenarioExport::new(8, DetectionConfig::default());
    for scenario in ScenarioId::all() {
        export.add_result(runner.run(scenario));
    }
    export.write_to_file(&path).unwrap();

    let loaded = ScenarioExport::read_from_file(&path).unwrap();
    assert_eq!(loaded.results.len(), ScenarioId::all().len());
    assert_eq!(loaded.failed, 0);
}

#[test]
fn check_request_from_generated_feed() {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
    let center = Coordinate::new(5.9804, 116.0735);
    let users = ReportOracle::user_ids(4);
    let mut oracle = ReportOracle::new(21, center, now);

    let own = oracle.report_at(10.0, -5.0, Duration::hours(30), &users[0]);
    let mut all_reports = oracle.nearby_pool(8, &users[1..], Duration::days(3));
    all_reports.push(own.clone());

    let request = CheckRequest {
        new_report: ReportDescriptor::new(center, users[0].clone()),
        user_reports: vec![own],
        all_reports,
        options: DetectionConfig::default(),
        now: Some(now),
    };

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("request.json");
    std::fs::write(&path, serde_json::to_string(&request).unwrap()).unwrap();

    let loaded = CheckRequest::from_file(&path).unwrap();
    let response = loaded.evaluate(Priority::High);

    assert!(!response.outcome.can_submit());
    assert_eq!(response.summary.status, SummaryStatus::Blocked);
    assert_eq!(response.outcome.result().user_duplicates[0].remaining_hours, 42.0);
    assert!(response.metadata.calculated_priority >= Priority::High);
    assert_eq!(response.metadata.location_hash.as_deref(), Some("w94d12dn"));
}

#[test]
fn sim_clock_drives_window_expiry() {
    let clock = SimClock::new(1);
    let users = ReportOracle::user_ids(1);
    let center = Coordinate::new(5.9804, 116.0735);
    let mut oracle = ReportOracle::new(1, center, clock.now());
    let prior = vec![oracle.report_at(0.0, 0.0, Duration::zero(), &users[0])];

    let detector = DuplicateDetector::with_clock(DetectionConfig::default(), clock.clone());
    let new_report = ReportDescriptor::new(center, users[0].clone());

    assert!(!detector.check_user_duplicate(&new_report, &prior).can_submit);

    clock.advance(Duration::hours(73));
    assert!(detector.check_user_duplicate(&new_report, &prior).can_submit);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn similar_count_is_pool_size_capped(pool in 0usize..300, cap in 1usize..120, seed in any::<u64>()) {
        let clock = SimClock::new(seed);
        let center = Coordinate::new(5.9804, 116.0735);
        let users = ReportOracle::user_ids(5);
        let mut oracle = ReportOracle::new(seed, center, clock.now());
        let reports: Vec<_> = (0..pool)
            .map(|i| oracle.report_at((i % 10) as f64, 0.0, Duration::hours(i as i64), &users[i % 5]))
            .collect();

        let detector = DuplicateDetector::with_clock(DetectionConfig::default().with_max_all_reports(cap), clock);
        let result = detector.count_similar_reports(&ReportDescriptor::new(center, "newcomer"), &reports);

        prop_assert_eq!(result.similar_reports_count, pool.min(cap));
        prop_assert!(result.unique_users <= 5);
    }

    #[test]
    fn hotspot_matches_oracle_for_any_seed(seed in any::<u64>()) {
        let result = ScenarioRunner::new(seed).run(ScenarioId::Hotspot);
        prop_assert!(result.passed, "{:?}", result.failure_reason);
    }
}
