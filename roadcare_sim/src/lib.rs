//! RoadCare Deterministic Scenario Harness
//!
//! Drives the duplicate detector through fixed scenarios with every source
//! of non-determinism under control:
//! - **Time**: `SimClock` stands in for the wall clock, so window arithmetic
//!   is exact
//! - **Feeds**: the `ReportOracle` scatters synthetic reports around a centre
//!   point from a single 64-bit seed and knows where each one really is
//!
//! Each scenario compares what the detector says with what the oracle knows.
//!
//! # Usage
//!
//! ```no_run
//! use roadcare_sim::{ScenarioId, ScenarioRunner};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::Hotspot);
//! assert!(result.passed);
//! ```

mod context;
mod error;
mod exporter;
mod oracle;
mod request;
mod runner;
pub mod scenarios;

pub use context::SimClock;
pub use error::SimError;
pub use exporter::ScenarioExport;
pub use oracle::{offset_meters, ReportOracle};
pub use request::{CheckRequest, CheckResponse};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner};
pub use scenarios::ScenarioId;
