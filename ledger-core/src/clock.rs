//! Per-process monotonic commit clock
//!
//! Ledger timestamps are server-assigned at commit time and must be monotonic
//! within one process even when the wall clock stalls or steps backwards.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Hands out strictly increasing commit timestamps.
#[derive(Debug)]
pub struct CommitClock {
    last: Mutex<DateTime<Utc>>,
}

impl CommitClock {
    /// Create a clock; the first tick is at or after the current wall time.
    pub fn new() -> Self {
        Self {
            last: Mutex::new(DateTime::<Utc>::MIN_UTC),
        }
    }

    /// Next commit timestamp: the wall clock, nudged forward by one
    /// microsecond whenever the wall clock has not advanced.
    pub fn next(&self) -> DateTime<Utc> {
        let mut last = self.last.lock();
        let mut now = Utc::now();
        if now <= *last {
            now = *last + Duration::microseconds(1);
        }
        *last = now;
        now
    }
}

impl Default for CommitClock {
    fn default() -> Self {
        Self::new()
    }
}
