//! Time sources. The timing core only ever asks "what time is it now".

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Milliseconds since the Unix epoch
pub type Millis = i64;

pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Wall clock backed by chrono
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to. Clones observe the same time, so a
/// test can keep one handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start_ms: Millis) -> Self {
        Self {
            now: Arc::new(AtomicI64::new(start_ms)),
        }
    }

    pub fn set(&self, ms: Millis) {
        self.now.store(ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.advance_ms(by.as_millis() as Millis);
    }

    pub fn advance_ms(&self, ms: Millis) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.load(Ordering::SeqCst)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Whole seconds left until `end`, rounded up and never negative
pub fn seconds_until(end: Millis, now: Millis) -> u64 {
    let left = end.saturating_sub(now);
    if left <= 0 {
        0
    } else {
        (left as u64).div_ceil(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(1_000);
        let handle = clock.clone();
        handle.advance(Duration::from_millis(2_500));
        assert_eq!(clock.now_ms(), 3_500);
        handle.set(10);
        assert_eq!(clock.now_ms(), 10);
    }

    #[test]
    fn system_clock_is_past_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn seconds_until_rounds_up() {
        assert_eq!(seconds_until(5_000, 0), 5);
        assert_eq!(seconds_until(5_000, 1), 5);
        assert_eq!(seconds_until(5_000, 4_000), 1);
        assert_eq!(seconds_until(5_000, 4_999), 1);
    }

    #[test]
    fn seconds_until_never_negative() {
        assert_eq!(seconds_until(5_000, 5_000), 0);
        assert_eq!(seconds_until(5_000, 90_000), 0);
    }
}
