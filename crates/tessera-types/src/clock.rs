use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current unix timestamp.
///
/// Engines sample their clock exactly once at the start of each
/// operation, so all epoch math within one call sees a single
/// consistent reading.
pub trait Clock: Send + Sync {
    fn now_unix(&self) -> i64;
}

/// Wall clock; the default for every engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
        }
    }

    pub fn set(&self, ts: i64) {
        self.now.store(ts, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}
