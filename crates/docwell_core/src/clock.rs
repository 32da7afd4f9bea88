//! Monotonic millisecond clock for `_modified` timestamps.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Returns wall-clock milliseconds since the Unix epoch.
pub(crate) fn system_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// A clock that never repeats or goes backwards.
///
/// Every call returns a value strictly greater than the previous one, even
/// when the wall clock is coarse or steps back.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: AtomicI64,
}

impl MonotonicClock {
    /// Creates a new clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next timestamp in milliseconds.
    pub fn now(&self) -> i64 {
        let wall = system_millis();
        let mut last = self.last.load(Ordering::Acquire);
        loop {
            let next = wall.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return next,
                Err(observed) => last = observed,
            }
        }
    }
}
