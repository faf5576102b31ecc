// [libs/core/clock/src/lib.rs]
//! Injectable clock. No business logic in this workspace reads wall time
//! directly — every component that needs "now" takes an `Arc<dyn Clock>` so
//! tests can pin time and assert on deterministic windows.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

/// A source of the current UTC instant.
pub trait Clock: Send + Sync + std::fmt::Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock: delegates to the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Test clock: returns a fixed instant until explicitly advanced.
#[derive(Debug, Clone)]
pub struct FixedClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            current: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.current.lock().expect("clock mutex poisoned") = at;
    }

    pub fn advance(&self, delta: chrono::Duration) {
        let mut guard = self.current.lock().expect("clock mutex poisoned");
        *guard += delta;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.current.lock().expect("clock mutex poisoned")
    }
}

/// Convenience constructor for an `Arc<dyn Clock>` backed by the system clock.
pub fn system_clock() -> Arc<dyn Clock> {
    Arc::new(SystemClock)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fixed_clock_holds_until_advanced() {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.now(), start);
        clock.advance(chrono::Duration::days(1));
        assert_eq!(clock.now(), start + chrono::Duration::days(1));
    }

    #[test]
    fn fixed_clock_set_is_absolute() {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let target = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        clock.set(target);
        assert_eq!(clock.now(), target);
    }
}
