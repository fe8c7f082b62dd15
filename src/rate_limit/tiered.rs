//! Three-tier submission throttle: global per minute, global per hour, and
//! per source per minute.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use super::clock::Clock;
use super::config::{RateLimitConfig, RateLimitStats, HOUR, MINUTE};
use super::window::SlidingWindowLimiter;

/// Which tier refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateScope {
    GlobalMinute,
    GlobalHour,
    Source,
}

impl RateScope {
    pub fn message(&self) -> &'static str {
        match self {
            RateScope::GlobalMinute => "Too many requests. Please try again in a minute.",
            RateScope::GlobalHour => "Hourly request limit reached. Please try again later.",
            RateScope::Source => {
                "Too many requests from your network. Please wait a minute and try again."
            }
        }
    }
}

/// Refusal from one of the tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimited {
    pub scope: RateScope,
    pub message: String,
    pub reset_time: DateTime<Utc>,
}

impl RateLimited {
    /// Whole seconds until `reset_time`, rounded up, for `Retry-After`.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_time - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000)
    }
}

struct SourceEntry {
    limiter: SlidingWindowLimiter,
    last_seen: Instant,
}

/// Owns the global limiters and lazily created per-source limiters.
pub struct SubmissionRateLimiter {
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    per_minute: SlidingWindowLimiter,
    per_hour: SlidingWindowLimiter,
    sources: Mutex<HashMap<String, SourceEntry>>,
}

impl SubmissionRateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            per_minute: SlidingWindowLimiter::new(MINUTE, config.per_minute, clock.clone()),
            per_hour: SlidingWindowLimiter::new(HOUR, config.per_hour, clock.clone()),
            sources: Mutex::new(HashMap::new()),
            config,
            clock,
        }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check every tier in order; the first refusal wins.
    ///
    /// A request is recorded in every tier or in none, so refusals never
    /// consume slots in the tiers that would have admitted them.
    pub fn check(&self, source: &str) -> Result<(), RateLimited> {
        let now = self.clock.now();
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());

        if !self.per_minute.has_room() {
            return Err(self.refuse(RateScope::GlobalMinute, MINUTE, source));
        }
        if !self.per_hour.has_room() {
            return Err(self.refuse(RateScope::GlobalHour, HOUR, source));
        }

        let entry = self.source_entry(&mut sources, source);
        entry.last_seen = now;
        if !entry.limiter.has_room() {
            return Err(self.refuse(RateScope::Source, MINUTE, source));
        }

        entry.limiter.record();
        self.per_minute.record();
        self.per_hour.record();
        debug!("Admitted submission from {}", source);
        Ok(())
    }

    /// Clear every tier, including all tracked sources.
    pub fn reset(&self) {
        self.per_minute.reset();
        self.per_hour.reset();
        self.sources
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn stats(&self) -> RateLimitStats {
        RateLimitStats {
            minute_count: self.per_minute.live_count(),
            minute_limit: self.per_minute.max_requests(),
            hour_count: self.per_hour.live_count(),
            hour_limit: self.per_hour.max_requests(),
            tracked_sources: self.tracked_sources(),
        }
    }

    pub fn tracked_sources(&self) -> usize {
        self.sources.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn source_entry<'a>(
        &self,
        sources: &'a mut HashMap<String, SourceEntry>,
        source: &str,
    ) -> &'a mut SourceEntry {
        if !sources.contains_key(source) {
            self.make_room(sources);
        }
        sources
            .entry(source.to_string())
            .or_insert_with(|| SourceEntry {
                limiter: SlidingWindowLimiter::new(
                    MINUTE,
                    self.config.per_source_per_minute,
                    self.clock.clone(),
                ),
                last_seen: self.clock.now(),
            })
    }

    /// Drop idle sources, then the least recently seen one if still full.
    fn make_room(&self, sources: &mut HashMap<String, SourceEntry>) {
        let max = self.config.max_tracked_sources.max(1);
        if sources.len() < max {
            return;
        }

        let before = sources.len();
        sources.retain(|_, entry| !entry.limiter.is_idle());
        if sources.len() < before {
            debug!("Purged {} idle rate limit sources", before - sources.len());
        }

        while sources.len() >= max {
            let victim = sources
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(key, _)| key.clone());
            match victim {
                Some(key) => {
                    debug!("Evicting rate limit state for {}", key);
                    sources.remove(&key);
                }
                None => break,
            }
        }
    }

    fn refuse(&self, scope: RateScope, window: Duration, source: &str) -> RateLimited {
        let reset_time = self.clock.wall_now()
            + chrono::Duration::from_std(window).unwrap_or_else(|_| chrono::Duration::zero());
        debug!("Rate limited submission from {} ({:?})", source, scope);
        RateLimited {
            scope,
            message: scope.message().to_string(),
            reset_time,
        }
    }
}

impl std::fmt::Debug for SubmissionRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionRateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limit::clock::MockClock;

    fn setup(config: RateLimitConfig) -> (SubmissionRateLimiter, Arc<MockClock>) {
        let clock = Arc::new(MockClock::default());
        (SubmissionRateLimiter::new(config, clock.clone()), clock)
    }

    #[test]
    fn test_source_tier_refuses_fourth_request() {
        let (limiter, clock) = setup(RateLimitConfig::default());

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.1").is_ok());
        }
        let refused = limiter.check("10.0.0.1").unwrap_err();
        assert_eq!(refused.scope, RateScope::Source);
        assert_eq!(refused.message, RateScope::Source.message());
        assert_eq!(
            refused.reset_time,
            clock.wall_now() + chrono::Duration::seconds(60)
        );

        // Other sources are unaffected.
        assert!(limiter.check("10.0.0.2").is_ok());
    }

    #[test]
    fn test_global_minute_tier_short_circuits() {
        let (limiter, _clock) = setup(RateLimitConfig {
            per_minute: 2,
            ..Default::default()
        });

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("b").is_ok());
        let refused = limiter.check("c").unwrap_err();
        assert_eq!(refused.scope, RateScope::GlobalMinute);

        // "c" never reached the source tier.
        assert_eq!(limiter.tracked_sources(), 2);
    }

    #[test]
    fn test_refused_source_leaves_global_tiers_untouched() {
        let (limiter, clock) = setup(RateLimitConfig::default());

        for _ in 0..3 {
            assert!(limiter.check("10.0.0.9").is_ok());
        }
        for _ in 0..20 {
            let refused = limiter.check("10.0.0.9").unwrap_err();
            assert_eq!(refused.scope, RateScope::Source);
        }

        let stats = limiter.stats();
        assert_eq!(stats.minute_count, 3);
        assert_eq!(stats.hour_count, 3);
        assert!(limiter.check("10.0.0.10").is_ok());

        // A persistent client cannot drain the hourly budget either.
        for _ in 0..5 {
            clock.advance(Duration::from_secs(60));
            for _ in 0..10 {
                let _ = limiter.check("10.0.0.9");
            }
        }
        assert_eq!(limiter.stats().hour_count, 4 + 5 * 3);
        assert!(limiter.check("10.0.0.11").is_ok());
    }

    #[test]
    fn test_global_hour_tier_outlasts_minute() {
        let (limiter, clock) = setup(RateLimitConfig {
            per_minute: 100,
            per_hour: 3,
            per_source_per_minute: 100,
            ..Default::default()
        });

        for _ in 0..3 {
            assert!(limiter.check("a").is_ok());
            clock.advance(Duration::from_secs(120));
        }
        let refused = limiter.check("a").unwrap_err();
        assert_eq!(refused.scope, RateScope::GlobalHour);
        assert_eq!(
            refused.reset_time,
            clock.wall_now() + chrono::Duration::hours(1)
        );
        assert_eq!(refused.retry_after_secs(clock.wall_now()), 3600);

        clock.advance(Duration::from_secs(3600));
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_reset_clears_all_tiers() {
        let (limiter, _clock) = setup(RateLimitConfig {
            per_minute: 1,
            ..Default::default()
        });

        assert!(limiter.check("a").is_ok());
        assert!(limiter.check("a").is_err());

        limiter.reset();
        assert_eq!(limiter.tracked_sources(), 0);
        assert!(limiter.check("a").is_ok());
    }

    #[test]
    fn test_evicts_least_recently_seen_source() {
        let (limiter, clock) = setup(RateLimitConfig {
            max_tracked_sources: 2,
            ..Default::default()
        });

        assert!(limiter.check("first").is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.check("second").is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.check("first").is_ok());
        clock.advance(Duration::from_secs(1));
        assert!(limiter.check("third").is_ok());

        assert_eq!(limiter.tracked_sources(), 2);
        let sources = limiter.sources.lock().unwrap();
        assert!(sources.contains_key("first"));
        assert!(sources.contains_key("third"));
        assert!(!sources.contains_key("second"));
    }

    #[test]
    fn test_idle_sources_are_purged_before_eviction() {
        let (limiter, clock) = setup(RateLimitConfig {
            max_tracked_sources: 2,
            ..Default::default()
        });

        assert!(limiter.check("old-1").is_ok());
        assert!(limiter.check("old-2").is_ok());
        clock.advance(Duration::from_secs(61));
        assert!(limiter.check("new").is_ok());

        assert_eq!(limiter.tracked_sources(), 1);
    }

    #[test]
    fn test_stats_report_live_counts() {
        let (limiter, _clock) = setup(RateLimitConfig::default());

        limiter.check("a").unwrap();
        limiter.check("b").unwrap();

        let stats = limiter.stats();
        assert_eq!(stats.minute_count, 2);
        assert_eq!(stats.hour_count, 2);
        assert_eq!(stats.minute_limit, 10);
        assert_eq!(stats.hour_limit, 50);
        assert_eq!(stats.tracked_sources, 2);
    }
}
