use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::spec::RateLimit;

/// A single token bucket, refilled continuously from elapsed wall-clock
/// time rather than on a timer tick, so the rate limiter never drifts
/// from the wall clock the adapter's deadlines are measured against.
struct Bucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
}

impl Bucket {
    fn new(capacity: u32, refill_per_sec: f64) -> Self {
        Self {
            capacity: capacity as f64,
            tokens: capacity as f64,
            refill_per_sec,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
        self.last_refill = now;
    }

    /// Seconds until at least one token is available, or `None` if one is
    /// available right now.
    fn wait_time(&mut self, now: Instant) -> Option<Duration> {
        self.refill(now);
        if self.tokens >= 1.0 {
            None
        } else {
            let deficit = 1.0 - self.tokens;
            Some(Duration::from_secs_f64(deficit / self.refill_per_sec))
        }
    }

    fn consume(&mut self, now: Instant) {
        self.refill(now);
        self.tokens = (self.tokens - 1.0).max(0.0);
    }
}

/// Per-connector pair of minute/hour token buckets (spec section 4.1: "a
/// token-bucket rate limiter keyed on `spec.name` honouring `per_minute`
/// and `per_hour`").
struct ConnectorBuckets {
    minute: Bucket,
    hour: Bucket,
}

/// Process-global rate limiter singleton, created at bootstrap and shared
/// read/write across every worker (spec section 5).
#[derive(Default)]
pub struct RateLimiter {
    buckets: Mutex<HashMap<String, ConnectorBuckets>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_bucket<T>(&self, connector: &str, limit: RateLimit, f: impl FnOnce(&mut ConnectorBuckets) -> T) -> T {
        let mut buckets = self.buckets.lock().expect("rate limiter mutex poisoned");
        let entry = buckets.entry(connector.to_string()).or_insert_with(|| ConnectorBuckets {
            minute: Bucket::new(limit.per_minute, limit.per_minute as f64 / 60.0),
            hour: Bucket::new(limit.per_hour, limit.per_hour as f64 / 3600.0),
        });
        f(entry)
    }

    /// How long the caller must wait before a call would be admitted,
    /// given both buckets. `None` means it is admitted immediately.
    pub fn wait_time(&self, connector: &str, limit: RateLimit) -> Option<Duration> {
        let now = Instant::now();
        self.with_bucket(connector, limit, |b| {
            let minute_wait = b.minute.wait_time(now);
            let hour_wait = b.hour.wait_time(now);
            match (minute_wait, hour_wait) {
                (None, None) => None,
                (Some(a), Some(b)) => Some(a.max(b)),
                (Some(a), None) | (None, Some(a)) => Some(a),
            }
        })
    }

    /// Record a call against both buckets. Call only after `wait_time`
    /// returned `None` or after honouring its wait.
    pub fn consume(&self, connector: &str, limit: RateLimit) {
        let now = Instant::now();
        self.with_bucket(connector, limit, |b| {
            b.minute.consume(now);
            b.hour.consume(now);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(per_minute: u32, per_hour: u32) -> RateLimit {
        RateLimit { per_minute, per_hour }
    }

    #[test]
    fn admits_calls_within_capacity() {
        let limiter = RateLimiter::new();
        let l = limit(60, 1000);
        assert!(limiter.wait_time("serper", l).is_none());
        limiter.consume("serper", l);
        assert!(limiter.wait_time("serper", l).is_none());
    }

    #[test]
    fn blocks_once_bucket_is_exhausted() {
        let limiter = RateLimiter::new();
        let l = limit(1, 1000);
        limiter.consume("serper", l);
        // Second call with only 1/min capacity should need to wait.
        assert!(limiter.wait_time("serper", l).is_some());
    }

    #[test]
    fn different_connectors_have_independent_buckets() {
        let limiter = RateLimiter::new();
        let l = limit(1, 1000);
        limiter.consume("serper", l);
        assert!(limiter.wait_time("serper", l).is_some());
        assert!(limiter.wait_time("google_places", l).is_none());
    }
}
