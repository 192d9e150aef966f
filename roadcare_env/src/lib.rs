//! RoadCare Environment Abstraction Layer
//!
//! This crate isolates the two things the detection engine needs from the
//! outside world and nothing else:
//! - **Time**: the instant a submission is evaluated when the caller did not
//!   stamp it (`now()`)
//! - **Identity**: the opaque user identifier reports are keyed by
//!
//! Production code uses [`SystemClock`]. Tests and the scenario harness inject
//! a clock whose "now" is fixed, so every detection run is reproducible.
//!
//! # Example
//!
//! ```ignore
//! use roadcare_env::{ReportClock, SystemClock};
//!
//! fn stamp<C: ReportClock>(clock: &C) -> String {
//!     clock.now().to_rfc3339()
//! }
//! ```

mod context;
mod system_clock;
mod types;

pub use context::ReportClock;
pub use system_clock::SystemClock;
pub use types::UserId;
