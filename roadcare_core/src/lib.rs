//! RoadCare Core - Duplicate and Similar-Report Detection
//!
//! Decides whether a citizen's road-damage report can be submitted and how
//! much weight it carries, given reports that already exist:
//! 1. **Blocking**: the same user reporting the same spot inside the
//!    resubmission window is a duplicate (`check_user_duplicate`)
//! 2. **Severity**: nearby reports from anyone, of any age, raise the
//!    severity multiplier and priority (`count_similar_reports`)
//! 3. **Fail-open**: a fault in detection never blocks a legitimate
//!    submission (`safe_duplicate_check`)
//!
//! Every operation is a pure function of its inputs plus the injected clock.
//! Candidate lists are read, never mutated, and scans are capped so latency
//! is bounded whatever the caller passes in.

pub mod config;
pub mod detection;
pub mod distance;
pub mod duplicate;
pub mod error;
pub mod geohash;
pub mod report;
pub mod similarity;
pub mod summary;

// Re-export key types for convenience
pub use config::DetectionConfig;
pub use detection::{
    check_duplicate_submission, safe_duplicate_check, DetectionOutcome, DetectionResult,
    DuplicateDetector,
};
pub use distance::{distance_meters, is_within_proximity, is_within_time_threshold};
pub use duplicate::{check_user_duplicate, UserDuplicateCheck, UserDuplicateMatch};
pub use error::DetectionError;
pub use geohash::geohash;
pub use report::{
    validate_location_for_duplicate_detection, CandidateReport, Coordinate, LocationField,
    ReportDescriptor,
};
pub use roadcare_env::{ReportClock, SystemClock, UserId};
pub use similarity::{count_similar_reports, SimilarMatch, SimilarReportsCheck};
pub use summary::{
    calculate_priority_from_duplicates, format_time_remaining, get_duplicate_detection_summary,
    DetectionSummary, DuplicateMetadata, Priority, SummaryStatus,
};
