//! Core clock trait for RoadCare detection runs.

use chrono::{DateTime, Utc};

/// The central interface for reading time.
///
/// This trait abstracts the wall clock so that the detection engine can run
/// against real time in production and against a virtual clock in tests and
/// simulation.
///
/// # Implementations
///
/// - **Production**: `SystemClock` - wraps `Utc::now()`
/// - **Simulation**: `SimClock` - a settable virtual instant
///
/// # Determinism
///
/// The only non-deterministic input to a detection run is "now", used when a
/// new report arrives without a submission time. Controlling it here keeps
/// every other computation a pure function of its arguments.
pub trait ReportClock: Send + Sync {
    /// Returns the current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the clock's seed (for logging/debugging).
    ///
    /// In production, returns 0 (not seeded).
    /// In simulation, returns the master seed.
    fn seed(&self) -> u64;
}

impl<C: ReportClock + ?Sized> ReportClock for &C {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn seed(&self) -> u64 {
        (**self).seed()
    }
}
