//! Ground truth oracle for simulation.
//!
//! The Oracle generates synthetic report feeds around a centre point and
//! knows exactly where every report was placed, so scenarios can compare
//! what the detector found with what is actually there:
//! - Gaussian scatter of nearby reports (meters)
//! - Uniform report ages inside a window
//! - A small pool of reporter ids, as a real neighbourhood has

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use roadcare_core::distance::{distance_between, EARTH_RADIUS_METERS};
use roadcare_core::{CandidateReport, Coordinate, UserId};
use serde_json::json;
use uuid::Uuid;

const STATUSES: [&str; 3] = ["pending", "reviewing", "approved"];

/// Meters per degree of latitude on the haversine sphere.
fn meters_per_degree() -> f64 {
    EARTH_RADIUS_METERS * std::f64::consts::PI / 180.0
}

/// Move `origin` by `north`/`east` meters.
pub fn offset_meters(origin: &Coordinate, north: f64, east: f64) -> Coordinate {
    let per_degree = meters_per_degree();
    Coordinate::new(
        origin.latitude + north / per_degree,
        origin.longitude + east / (per_degree * origin.latitude.to_radians().cos()),
    )
}

/// The Oracle - owns the RNG and the ground truth of every generated report.
pub struct ReportOracle {
    /// Seed (kept for logging)
    seed: u64,

    /// RNG for scatter, ages and ids
    rng: ChaCha8Rng,

    /// Where the new submission is being made
    center: Coordinate,

    /// The instant ages are measured back from
    now: DateTime<Utc>,

    /// Scatter standard deviation (meters)
    scatter_std_m: f64,
}

impl ReportOracle {
    /// Creates a new Oracle around `center`, measuring ages back from `now`.
    pub fn new(seed: u64, center: Coordinate, now: DateTime<Utc>) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            center,
            now,
            scatter_std_m: 15.0,
        }
    }

    /// Sets the scatter standard deviation.
    pub fn with_scatter(mut self, std_m: f64) -> Self {
        self.scatter_std_m = std_m;
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn center(&self) -> Coordinate {
        self.center
    }

    /// `user-1` .. `user-n`.
    pub fn user_ids(n: usize) -> Vec<UserId> {
        (1..=n).map(|i| UserId::new(format!("user-{}", i))).collect()
    }

    /// Deterministic report id.
    fn next_id(&mut self) -> Uuid {
        let mut bytes = [0u8; 16];
        self.rng.fill(&mut bytes);
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }

    /// A report at an exact offset from the centre.
    pub fn report_at(&mut self, north: f64, east: f64, age: Duration, user: &UserId) -> CandidateReport {
        let location = offset_meters(&self.center, north, east);
        let status = STATUSES[self.rng.gen_range(0..STATUSES.len())];
        let id = self.next_id();

        CandidateReport::new(location, self.now - age, user.clone())
            .with_field("id", json!(id.to_string()))
            .with_field("status", status)
    }

    /// `count` reports scattered around the centre by users drawn from `users`,
    /// each between 0 and `max_age` old.
    pub fn nearby_pool(&mut self, count: usize, users: &[UserId], max_age: Duration) -> Vec<CandidateReport> {
        let Ok(scatter) = Normal::new(0.0, self.scatter_std_m) else {
            return Vec::new();
        };
        if users.is_empty() {
            return Vec::new();
        }

        let max_age_ms = max_age.num_milliseconds().max(1);
        (0..count)
            .map(|_| {
                let north = scatter.sample(&mut self.rng);
                let east = scatter.sample(&mut self.rng);
                let age = Duration::milliseconds(self.rng.gen_range(0..max_age_ms));
                let user = &users[self.rng.gen_range(0..users.len())];
                self.report_at(north, east, age, user)
            })
            .collect()
    }

    /// `count` reports on a ring at least `min_distance_m` from the centre.
    pub fn far_pool(&mut self, count: usize, min_distance_m: f64, users: &[UserId]) -> Vec<CandidateReport> {
        if users.is_empty() {
            return Vec::new();
        }

        (0..count)
            .map(|_| {
                let bearing = self.rng.gen_range(0.0..std::f64::consts::TAU);
                let radius = min_distance_m * self.rng.gen_range(1.1..3.0);
                let age = Duration::hours(self.rng.gen_range(0..24 * 7));
                let user = &users[self.rng.gen_range(0..users.len())];
                self.report_at(radius * bearing.cos(), radius * bearing.sin(), age, user)
            })
            .collect()
    }

    /// True distance of a generated report from the centre.
    pub fn true_distance(&self, report: &CandidateReport) -> Option<f64> {
        report.point().map(|p| distance_between(&self.center, &p))
    }

    /// Ground truth: reports within `threshold_m` of the centre.
    pub fn truly_nearby<'a>(&self, reports: &'a [CandidateReport], threshold_m: f64) -> Vec<&'a CandidateReport> {
        reports
            .iter()
            .filter(|r| self.true_distance(r).is_some_and(|d| d <= threshold_m))
            .collect()
    }
}
