//! Simulation clock implementing ReportClock for deterministic runs.

use chrono::{DateTime, Duration, TimeZone, Utc};
use roadcare_env::ReportClock;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Virtual clock whose "now" only moves when told to.
///
/// Clones share the same instant, so a scenario can hand one to the
/// detector and keep advancing it from the outside.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Master seed for this simulation
    seed: u64,

    /// Current virtual time (milliseconds since the Unix epoch)
    now_ms: Arc<AtomicI64>,
}

impl SimClock {
    /// Virtual time 0 maps to this instant (2024-01-01 00:00:00 UTC).
    pub const EPOCH_MS: i64 = 1_704_067_200_000;

    /// Creates a SimClock at the simulation epoch.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            now_ms: Arc::new(AtomicI64::new(Self::EPOCH_MS)),
        }
    }

    /// Creates a SimClock frozen at `now`.
    pub fn at(seed: u64, now: DateTime<Utc>) -> Self {
        let clock = Self::new(seed);
        clock.set_time(now);
        clock
    }

    /// Advances virtual time by the given duration.
    pub fn advance(&self, by: Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    /// Sets the virtual time to a specific instant.
    pub fn set_time(&self, now: DateTime<Utc>) {
        self.now_ms.store(now.timestamp_millis(), Ordering::SeqCst);
    }
}

impl ReportClock for SimClock {
    fn now(&self) -> DateTime<Utc> {
        let ms = self.now_ms.load(Ordering::SeqCst);
        Utc.timestamp_millis_opt(ms)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_epoch() {
        let clock = SimClock::new(42);
        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(clock.seed(), 42);
    }

    #[test]
    fn test_clones_share_time() {
        let clock = SimClock::new(1);
        let handle = clock.clone();

        handle.advance(Duration::hours(10));

        assert_eq!(clock.now(), Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
    }

    #[test]
    fn test_set_time() {
        let target = Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap();
        let clock = SimClock::at(3, target);
        assert_eq!(clock.now(), target);
    }
}
