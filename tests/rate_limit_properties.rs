//! Sliding window and tier behavior observed through the public API.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use scoopdesk::rate_limit::{
    Clock, MockClock, RateLimitConfig, RateScope, SlidingWindowLimiter, SubmissionRateLimiter,
    MINUTE,
};

fn clock() -> Arc<MockClock> {
    Arc::new(MockClock::at(
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap(),
    ))
}

#[test]
fn at_most_max_admitted_within_window() {
    let clock = clock();
    let limiter = SlidingWindowLimiter::new(Duration::from_secs(10), 4, clock.clone());

    let admitted = (0..10)
        .filter(|_| {
            clock.advance(Duration::from_millis(500));
            limiter.check()
        })
        .count();
    assert_eq!(admitted, 4);
}

#[test]
fn refusals_do_not_extend_the_window() {
    let clock = clock();
    let limiter = SlidingWindowLimiter::new(Duration::from_secs(10), 2, clock.clone());

    assert!(limiter.check());
    assert!(limiter.check());
    for _ in 0..5 {
        clock.advance(Duration::from_secs(1));
        assert!(!limiter.check());
    }
    clock.advance(Duration::from_secs(5));
    assert!(limiter.check());
}

#[test]
fn reset_admits_immediately() {
    let limiter = SlidingWindowLimiter::new(MINUTE, 1, clock());
    assert!(limiter.check());
    assert!(!limiter.check());
    limiter.reset();
    assert!(limiter.check());
}

#[test]
fn global_minute_tier_refuses_first() {
    let clock = clock();
    let limiter = SubmissionRateLimiter::new(RateLimitConfig::default(), clock.clone());

    for i in 0..10 {
        limiter.check(&format!("10.0.0.{}", i)).unwrap();
    }
    let refused = limiter.check("10.0.0.200").unwrap_err();
    assert_eq!(refused.scope, RateScope::GlobalMinute);
    assert_eq!(refused.reset_time, Utc.with_ymd_and_hms(2026, 6, 1, 12, 1, 0).unwrap());
    assert_eq!(refused.retry_after_secs(clock.wall_now()), 60);
}

#[test]
fn hourly_tier_outlasts_minute_tier() {
    let clock = clock();
    let config = RateLimitConfig {
        per_minute: 100,
        per_hour: 3,
        ..Default::default()
    };
    let limiter = SubmissionRateLimiter::new(config, clock.clone());

    for i in 0..3 {
        limiter.check(&format!("src-{}", i)).unwrap();
    }
    clock.advance(Duration::from_secs(120));
    let refused = limiter.check("src-9").unwrap_err();
    assert_eq!(refused.scope, RateScope::GlobalHour);

    clock.advance(Duration::from_secs(3600));
    assert!(limiter.check("src-9").is_ok());
}
