//! Production implementation of ReportClock using the system clock.

use crate::ReportClock;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Production clock backed by the operating system.
///
/// This is the "real" implementation used when the UI layer evaluates a
/// submission. It carries no state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new SystemClock.
    pub fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped clock for sharing across threads.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl ReportClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn seed(&self) -> u64 {
        // Production is not seeded
        0
    }
}
