use std::sync::atomic::{AtomicI64, Ordering};

/// Wall-clock source for issuance and expiry checks.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    fn now_secs(&self) -> i64 {
        self.now_millis().div_euclid(1000)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Settable clock. With a non-zero step every read advances time by `step_ms`,
/// which gives back-to-back issuances distinct `iat` values.
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
    step_ms: i64,
}

impl ManualClock {
    pub fn at_secs(secs: i64) -> Self {
        Self { millis: AtomicI64::new(secs * 1000), step_ms: 0 }
    }

    pub fn stepping(secs: i64, step_ms: i64) -> Self {
        Self { millis: AtomicI64::new(secs * 1000), step_ms }
    }

    pub fn set_secs(&self, secs: i64) {
        self.millis.store(secs * 1000, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.millis.fetch_add(secs * 1000, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}
