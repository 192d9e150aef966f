//! Report records and their normalization at the ingestion boundary.
//!
//! Candidate reports arrive from whatever endpoint the UI queried, so their
//! shape is loose: the location may be missing, partial, or a street label;
//! the timestamp may be `submissionTime` or `createdAt`, as ISO text or epoch
//! milliseconds; the user id may be a string, a number, or junk. Everything
//! is accepted here and resolved once through
//! [`CandidateReport::point`] and [`CandidateReport::timestamp`], so the scans
//! only ever see a clean coordinate and an optional instant.

use crate::error::{DetectionError, Result};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use roadcare_env::UserId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A WGS84 coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Both components are finite numbers.
    pub fn is_finite(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }

    /// Checks the latitude/longitude ranges without clamping.
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DetectionError::InvalidLatitude(self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DetectionError::InvalidLongitude(self.longitude));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

/// True iff a location is present, finite and within range.
pub fn validate_location_for_duplicate_detection(location: Option<&Coordinate>) -> bool {
    location.is_some_and(Coordinate::is_valid)
}

/// The submission being evaluated.
///
/// Constructed fresh by the caller per submission attempt. A missing
/// `submission_time` means "now" according to the detector's clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDescriptor {
    #[serde(default)]
    pub location: Option<Coordinate>,

    #[serde(default, deserialize_with = "submission_time_from_json")]
    pub submission_time: Option<DateTime<Utc>>,

    #[serde(default)]
    pub user_id: Option<UserId>,
}

/// The new report's time goes through the same parser as candidates', but
/// an unreadable value is an error rather than "now".
fn submission_time_from_json<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(raw) => timestamp_from_json(&raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("unreadable submissionTime: {}", raw))),
    }
}

/// Candidate user ids that are not a string or integer count as missing.
fn lenient_user_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<UserId>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|raw| UserId::deserialize(raw).ok()))
}

impl ReportDescriptor {
    /// A fully identified submission.
    pub fn new(location: Coordinate, user_id: impl Into<UserId>) -> Self {
        Self {
            location: Some(location),
            submission_time: None,
            user_id: Some(user_id.into()),
        }
    }

    /// Stamps the submission time.
    pub fn at(mut self, submission_time: DateTime<Utc>) -> Self {
        self.submission_time = Some(submission_time);
        self
    }
}

/// Raw location field of a candidate.
///
/// History endpoints sometimes return a human-readable label where a point
/// is expected; that and any other shape is kept verbatim and treated as
/// "no location".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationField {
    Point {
        #[serde(default)]
        latitude: Option<f64>,
        #[serde(default)]
        longitude: Option<f64>,
    },
    Other(Value),
}

impl From<Coordinate> for LocationField {
    fn from(c: Coordinate) -> Self {
        Self::Point {
            latitude: Some(c.latitude),
            longitude: Some(c.longitude),
        }
    }
}

/// An existing report, read-only to the engine.
///
/// Fields the engine does not interpret (id, status, address label, ...) are
/// kept in `extra` and serialize back out unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateReport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LocationField>,

    /// Raw; read through [`CandidateReport::timestamp`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submission_time: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(default, deserialize_with = "lenient_user_id", skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CandidateReport {
    pub fn new(location: Coordinate, submission_time: DateTime<Utc>, user_id: impl Into<UserId>) -> Self {
        Self {
            location: Some(location.into()),
            submission_time: Some(Value::String(submission_time.to_rfc3339())),
            created_at: None,
            user_id: Some(user_id.into()),
            extra: Map::new(),
        }
    }

    /// Attaches a pass-through display field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// The usable point, if the location carries finite lat/lng.
    pub fn point(&self) -> Option<Coordinate> {
        match self.location {
            Some(LocationField::Point {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }) => Some(Coordinate::new(latitude, longitude)).filter(Coordinate::is_finite),
            _ => None,
        }
    }

    /// `submissionTime`, falling back to `createdAt` when it is empty, parsed.
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        [&self.submission_time, &self.created_at]
            .into_iter()
            .flatten()
            .find(|raw| !is_blank(raw))
            .and_then(timestamp_from_json)
    }

    pub fn is_from(&self, user_id: &UserId) -> bool {
        self.user_id.as_ref() == Some(user_id)
    }
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339 with any offset, and the offset-less
/// `YYYY-MM-DDTHH:MM:SS[.fff]` form, which is read as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| DetectionError::timestamp(raw))
}

/// Read a JSON timestamp: ISO-8601 text via [`parse_timestamp`], or a number
/// of milliseconds since the Unix epoch.
pub fn timestamp_from_json(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(text) => parse_timestamp(text).ok(),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|ms| ms.is_finite()).map(|ms| ms as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

/// Null, `""`, `0` and `false` mean "not set".
fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(text) => text.is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::Bool(b) => !b,
        _ => false,
    }
}

/// Anything the time predicate can read as an instant.
pub trait IntoTimestamp {
    fn into_timestamp(self) -> Result<DateTime<Utc>>;
}

impl IntoTimestamp for DateTime<Utc> {
    fn into_timestamp(self) -> Result<DateTime<Utc>> {
        Ok(self)
    }
}

impl IntoTimestamp for &DateTime<Utc> {
    fn into_timestamp(self) -> Result<DateTime<Utc>> {
        Ok(*self)
    }
}

impl IntoTimestamp for &str {
    fn into_timestamp(self) -> Result<DateTime<Utc>> {
        parse_timestamp(self)
    }
}

impl IntoTimestamp for &String {
    fn into_timestamp(self) -> Result<DateTime<Utc>> {
        parse_timestamp(self)
    }
}
