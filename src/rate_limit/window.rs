//! Sliding-window request counter for a single scope.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::clock::Clock;

/// Counts admitted requests over a window ending at "now".
///
/// Records are kept in arrival order, so expiry only ever pops from the front.
pub struct SlidingWindowLimiter {
    window: Duration,
    max_requests: usize,
    records: Mutex<VecDeque<Instant>>,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, max_requests: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            max_requests,
            records: Mutex::new(VecDeque::new()),
            clock,
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Admission check. Records the request and returns true when a slot is
    /// free; refusals leave the records untouched.
    pub fn check(&self) -> bool {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut records, now);

        if records.len() >= self.max_requests {
            return false;
        }

        records.push_back(now);
        true
    }

    /// True when a request arriving now would be admitted. Records nothing.
    pub fn has_room(&self) -> bool {
        self.live_count() < self.max_requests
    }

    /// Record a request at "now" without checking the limit.
    ///
    /// Callers pair this with [`Self::has_room`] under a lock of their own.
    pub fn record(&self) {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut records, now);
        records.push_back(now);
    }

    /// Forget every record.
    pub fn reset(&self) {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    /// Requests currently inside the window.
    pub fn live_count(&self) -> usize {
        let now = self.clock.now();
        let mut records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        self.purge(&mut records, now);
        records.len()
    }

    /// True when every record has aged out.
    pub fn is_idle(&self) -> bool {
        self.live_count() == 0
    }

    fn purge(&self, records: &mut VecDeque<Instant>, now: Instant) {
        while let Some(&oldest) = records.front() {
            if now.saturating_duration_since(oldest) < self.window {
                break;
            }
            records.pop_front();
        }
    }
}

impl std::fmt::Debug for SlidingWindowLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlidingWindowLimiter")
            .field("window", &self.window)
            .field("max_requests", &self.max_requests)
            .finish_non_exhaustive()
    }
}
