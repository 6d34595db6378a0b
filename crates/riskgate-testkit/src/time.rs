//! Manually driven wall clock

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::RwLock;
use riskgate_core::{PhysicalClock, SharedClock};
use std::sync::Arc;

/// 2024-01-01T00:00:00Z, the starting point of every test clock
pub fn epoch_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Clock fixed at `start`
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Clock fixed at [`epoch_time`]
    pub fn epoch() -> Self {
        Self::new(epoch_time())
    }

    /// Current reading, without importing the clock trait
    pub fn time(&self) -> DateTime<Utc> {
        *self.now.read()
    }

    /// Shared handle, keeping a typed reference for advancing
    pub fn shared(start: DateTime<Utc>) -> (Arc<Self>, SharedClock) {
        let clock = Arc::new(Self::new(start));
        let shared: SharedClock = clock.clone();
        (clock, shared)
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) {
        *self.now.write() += by;
    }

    /// Move forward by `secs` seconds
    pub fn advance_secs(&self, secs: i64) {
        self.advance(Duration::seconds(secs));
    }

    /// Jump to `at`
    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.write() = at;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::epoch()
    }
}

impl PhysicalClock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.time()
    }
}
