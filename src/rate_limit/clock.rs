//! Clock sources for rate limiting and date validation.
//!
//! Limiters measure windows with a monotonic `Instant`, while reset times and
//! advance-notice checks need wall time. Both come from the same clock so tests
//! can move them together with [`MockClock`].

use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic time used for window arithmetic.
    fn now(&self) -> Instant;

    /// Wall time used for reset times and date validation.
    fn wall_now(&self) -> DateTime<Utc>;
}

/// System clock implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn wall_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct MockClock {
    state: Mutex<(Instant, DateTime<Utc>)>,
}

impl MockClock {
    /// Create a clock frozen at the given wall time.
    pub fn at(wall: DateTime<Utc>) -> Self {
        Self {
            state: Mutex::new((Instant::now(), wall)),
        }
    }

    /// Move both the monotonic and wall time forward.
    pub fn advance(&self, by: Duration) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.0 += by;
        if let Ok(delta) = chrono::Duration::from_std(by) {
            state.1 += delta;
        }
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(Utc::now())
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    fn wall_now(&self) -> DateTime<Utc> {
        self.state.lock().unwrap_or_else(|e| e.into_inner()).1
    }
}
