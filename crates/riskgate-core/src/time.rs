//! Clock effect and evaluation deadlines
//!
//! Wall-clock reads go through [`PhysicalClock`] so cache expiry, policy
//! expiry and assessment timestamps are deterministic under test. Elapsed
//! time budgets use Tokio's monotonic clock so paused-time tests can drive
//! timeouts.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Wall-clock time source
pub trait PhysicalClock: Send + Sync + fmt::Debug {
    /// Current wall-clock time
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl PhysicalClock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Shared clock handle
pub type SharedClock = Arc<dyn PhysicalClock>;

/// Default shared clock
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

/// Caller-supplied point in time after which an evaluation returns its
/// best-effort partial result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline {
    expires_at: Instant,
}

impl Deadline {
    /// Deadline `budget` from now
    pub fn after(budget: Duration) -> Self {
        Self {
            expires_at: Instant::now() + budget,
        }
    }

    /// Deadline at an explicit instant
    pub fn at(expires_at: Instant) -> Self {
        Self { expires_at }
    }

    /// Time left, zero once expired
    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Whether the deadline has passed
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// The smaller of `budget` and the time left
    pub fn clamp(&self, budget: Duration) -> Duration {
        budget.min(self.remaining())
    }

    /// Instant at which the deadline expires
    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_counts_down_with_tokio_time() {
        let deadline = Deadline::after(Duration::from_millis(100));
        assert!(!deadline.is_expired());
        assert_eq!(deadline.clamp(Duration::from_secs(5)), Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(60)).await;
        assert_eq!(deadline.remaining(), Duration::from_millis(40));
        assert_eq!(deadline.clamp(Duration::from_millis(10)), Duration::from_millis(10));

        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }
}
