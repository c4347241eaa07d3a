//! Wall-clock access for the engine.
//!
//! The engine never calls `Utc::now()` directly. It reads time through the
//! [`Clock`] trait so tests can pin and advance time deterministically with
//! [`ManualClock`].

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Local, Timelike, Utc};

/// A source of the current time.
pub trait Clock: Send {
    /// Current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// Current hour (0-23) on the user's local wall clock.
    fn local_hour(&self) -> u32;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn local_hour(&self) -> u32 {
        Local::now().hour()
    }
}

#[derive(Debug)]
struct ManualTime {
    now: DateTime<Utc>,
    local_hour: u32,
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualTime>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`, reporting `local_hour` as the local
    /// hour.
    pub fn new(now: DateTime<Utc>, local_hour: u32) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualTime {
                now,
                local_hour: local_hour % 24,
            })),
        }
    }

    /// Move time forward. The local hour is left alone; use
    /// [`set_local_hour`](Self::set_local_hour) to change it.
    pub fn advance(&self, by: Duration) {
        let mut time = self.lock();
        time.now = time.now.checked_add_signed(by).unwrap_or(time.now);
    }

    /// Jump to an absolute instant.
    pub fn set_now(&self, now: DateTime<Utc>) {
        self.lock().now = now;
    }

    /// Change the reported local hour.
    pub fn set_local_hour(&self, hour: u32) {
        self.lock().local_hour = hour % 24;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualTime> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.lock().now
    }

    fn local_hour(&self) -> u32 {
        self.lock().local_hour
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::new(start, 12);
        let handle = clock.clone();

        handle.advance(Duration::minutes(90));
        handle.set_local_hour(23);

        assert_eq!(clock.now(), start + Duration::minutes(90));
        assert_eq!(clock.local_hour(), 23);
    }

    #[test]
    fn local_hour_wraps_into_range() {
        let clock = ManualClock::new(Utc::now(), 25);
        assert_eq!(clock.local_hour(), 1);
    }

    #[test]
    fn system_clock_hour_in_range() {
        assert!(SystemClock.local_hour() < 24);
    }
}
