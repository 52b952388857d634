use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of `created_at`/fill/cancel timestamps.
///
/// The specification only requires seconds-since-epoch granularity for
/// external display, but leaves open whether `time` must be non-decreasing
/// across fills. This crate takes the conservative reading: [`SystemClock`]
/// never returns a value lower than the last one it handed out, even across
/// a backwards wall-clock adjustment.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall-clock time, clamped to be non-decreasing.
pub struct SystemClock {
    high_water: AtomicI64,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            high_water: AtomicI64::new(0),
        }
    }

    fn wall_clock_secs() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        let wall = Self::wall_clock_secs();
        let mut prev = self.high_water.load(Ordering::Relaxed);
        loop {
            let candidate = wall.max(prev);
            match self.high_water.compare_exchange_weak(
                prev,
                candidate,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => prev = actual,
            }
        }
    }
}

/// A manually-advanced clock for deterministic tests.
pub struct TestClock {
    value: AtomicI64,
}

impl TestClock {
    pub fn new(start: i64) -> Self {
        Self {
            value: AtomicI64::new(start),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.value.fetch_add(secs, Ordering::Relaxed);
    }

    pub fn set(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }
}

impl Clock for TestClock {
    fn now(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_non_decreasing() {
        let clock = SystemClock::new();
        let mut last = clock.now();
        for _ in 0..1000 {
            let next = clock.now();
            assert!(next >= last);
            last = next;
        }
    }

    #[test]
    fn test_clock_advances_on_demand() {
        let clock = TestClock::new(100);
        assert_eq!(clock.now(), 100);
        clock.advance(5);
        assert_eq!(clock.now(), 105);
        clock.set(200);
        assert_eq!(clock.now(), 200);
    }
}
