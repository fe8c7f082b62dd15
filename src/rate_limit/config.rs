//! Rate limiter configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One minute, the window for the per-minute tiers.
pub const MINUTE: Duration = Duration::from_secs(60);

/// One hour, the window for the hourly tier.
pub const HOUR: Duration = Duration::from_secs(60 * 60);

/// Limits for the three submission tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Submissions admitted per minute across all sources.
    pub per_minute: usize,
    /// Submissions admitted per hour across all sources.
    pub per_hour: usize,
    /// Submissions admitted per minute from a single source.
    pub per_source_per_minute: usize,
    /// Upper bound on per-source limiters kept in memory.
    pub max_tracked_sources: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_minute: 10,
            per_hour: 50,
            per_source_per_minute: 3,
            max_tracked_sources: 10_000,
        }
    }
}

/// Live counts per tier.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStats {
    pub minute_count: usize,
    pub minute_limit: usize,
    pub hour_count: usize,
    pub hour_limit: usize,
    pub tracked_sources: usize,
}
