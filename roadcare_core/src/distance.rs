//! Great-circle distance and the proximity/time predicates built on it.

use crate::report::{Coordinate, IntoTimestamp};
use std::f64::consts::PI;

/// Mean Earth radius used by the haversine formula, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

const MS_PER_HOUR: f64 = 1000.0 * 60.0 * 60.0;

/// Haversine distance between two lat/lng points in meters.
///
/// Symmetric in its two points and exactly 0 for identical points.
pub fn distance_meters(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let to_rad = |deg: f64| deg * PI / 180.0;

    let phi1 = to_rad(lat1);
    let phi2 = to_rad(lat2);
    let dphi = to_rad(lat2 - lat1);
    let dlambda = to_rad(lng2 - lng1);

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Distance between two coordinates in meters.
pub fn distance_between(a: &Coordinate, b: &Coordinate) -> f64 {
    distance_meters(a.latitude, a.longitude, b.latitude, b.longitude)
}

/// True iff both locations are present and within `threshold_meters`.
///
/// A missing location, or one with a non-finite component, is never near
/// anything.
pub fn is_within_proximity(
    a: Option<&Coordinate>,
    b: Option<&Coordinate>,
    threshold_meters: f64,
) -> bool {
    match (a, b) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => {
            distance_between(a, b) <= threshold_meters
        }
        _ => false,
    }
}

/// Absolute difference between two instants in fractional hours.
pub fn hours_between<A: IntoTimestamp, B: IntoTimestamp>(a: A, b: B) -> Option<f64> {
    let a = a.into_timestamp().ok()?;
    let b = b.into_timestamp().ok()?;
    Some((a - b).num_milliseconds().unsigned_abs() as f64 / MS_PER_HOUR)
}

/// True iff the two timestamps are at most `threshold_hours` apart.
///
/// Either side may be a parsed `DateTime<Utc>` or an ISO-8601 string. An
/// unparseable timestamp is never within any window.
pub fn is_within_time_threshold<A: IntoTimestamp, B: IntoTimestamp>(
    a: A,
    b: B,
    threshold_hours: f64,
) -> bool {
    hours_between(a, b).is_some_and(|hours| hours <= threshold_hours)
}
