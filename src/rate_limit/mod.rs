//! In-memory submission throttling.
//!
//! Each scope is a [`SlidingWindowLimiter`]; [`SubmissionRateLimiter`]
//! composes the global and per-source scopes checked before every dispatch.
//! State is process-local and lost on restart; it only protects against
//! short bursts, not hard quotas.

mod clock;
mod config;
mod tiered;
mod window;

pub use clock::{Clock, MockClock, SystemClock};
pub use config::{RateLimitConfig, RateLimitStats, HOUR, MINUTE};
pub use tiered::{RateLimited, RateScope, SubmissionRateLimiter};
pub use window::SlidingWindowLimiter;
