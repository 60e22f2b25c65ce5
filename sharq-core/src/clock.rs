/// A source of wall-clock milliseconds since the Unix epoch.
///
/// Monotonic ordering is relied on only within a single operation;
/// successive calls from different operations may observe time moving
/// backwards under clock adjustment, same as a plain `time.time() * 1000`
/// sample would.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_millis() as i64
    }
}

/// Floor `epoch_ms` down to the containing minute bucket, matching
/// `floor(epoch_ms / 60000) * 60000` from §3.
pub fn minute_bucket(epoch_ms: i64) -> i64 {
    epoch_ms.div_euclid(60_000) * 60_000
}

/// The trailing-10-minutes bucket list `[now_minute - 9*60000 .. now_minute]`
/// inclusive, oldest first, used by `metrics` (§4.7).
pub fn trailing_minute_buckets(now_ms: i64) -> [i64; 10] {
    let now_minute = minute_bucket(now_ms);
    let mut buckets = [0i64; 10];
    for (i, bucket) in buckets.iter_mut().enumerate() {
        *bucket = now_minute - (9 - i as i64) * 60_000;
    }
    buckets
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_util {
    use super::Clock;
    use std::sync::atomic::{AtomicI64, Ordering};

    /// A deterministic, manually-advanced clock for tests.
    #[derive(Debug, Default)]
    pub struct FakeClock(AtomicI64);

    impl FakeClock {
        pub fn new(start_ms: i64) -> Self {
            Self(AtomicI64::new(start_ms))
        }

        pub fn advance(&self, delta_ms: i64) {
            self.0.fetch_add(delta_ms, Ordering::SeqCst);
        }

        pub fn set(&self, ms: i64) {
            self.0.store(ms, Ordering::SeqCst);
        }
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }
}
