use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::{SourceError, SourceErrorKind};
use crate::ratelimit::RateLimiter;
use crate::raw::RawIngestion;
use crate::registry::ConnectorRegistry;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF: Duration = Duration::from_millis(250);
const JITTER_FRACTION: f64 = 0.20;

/// One connector's raw response: the adapter doesn't know or care what
/// `payload` means, only that it can be hashed and persisted.
#[derive(Debug, Clone)]
pub struct ConnectorResponse {
    pub url: String,
    pub payload: serde_json::Value,
}

/// The source-specific call every concrete connector implements. Wire
/// details are an external collaborator (spec section 1); this trait is
/// the entire seam the adapter needs.
#[async_trait]
pub trait ConnectorFetch: Send + Sync {
    async fn call(&self, connector: &str, params: &serde_json::Value) -> Result<ConnectorResponse, SourceError>;
}

/// Wraps a `ConnectorFetch` with the uniform behaviour every connector
/// gets for free (spec section 4.1): a deadline, a rate limiter, retry
/// with backoff, and content hashing via `RawIngestion::new`.
pub struct Adapter<F: ConnectorFetch> {
    fetcher: F,
    rate_limiter: RateLimiter,
}

impl<F: ConnectorFetch> Adapter<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher,
            rate_limiter: RateLimiter::new(),
        }
    }

    /// Fetch from `connector`, honouring `budget` (the caller-computed
    /// `min(spec.timeout, ctx.budget_remaining_time)`, per spec).
    pub async fn fetch(
        &self,
        registry: &ConnectorRegistry,
        connector: &str,
        params: serde_json::Value,
        budget: Duration,
    ) -> Result<RawIngestion, SourceError> {
        let spec = registry.get(connector)?;
        let deadline_at = Instant::now() + budget.min(spec.timeout);

        let remaining = |now: Instant| deadline_at.saturating_duration_since(now);

        let wait = self.rate_limiter.wait_time(connector, spec.rate_limit);
        if let Some(wait) = wait {
            if wait > remaining(Instant::now()) {
                return Err(SourceError::rate_limited(format!(
                    "{connector}: would need to wait {wait:?}, only {:?} remains",
                    remaining(Instant::now())
                )));
            }
            debug!(connector, ?wait, "rate limiter backpressure, waiting");
            tokio::time::sleep(wait).await;
        }
        self.rate_limiter.consume(connector, spec.rate_limit);

        let mut last_err: Option<SourceError> = None;
        for attempt in 1..=MAX_ATTEMPTS {
            let time_left = remaining(Instant::now());
            if time_left.is_zero() {
                return Err(last_err.unwrap_or_else(|| SourceError::timeout(format!("{connector}: deadline exhausted before attempt"))));
            }

            let call = self.fetcher.call(connector, &params);
            match tokio::time::timeout(time_left, call).await {
                Ok(Ok(response)) => {
                    return Ok(RawIngestion::new(connector, response.url, response.payload));
                }
                Ok(Err(err)) => {
                    if !err.kind.is_retryable() || attempt == MAX_ATTEMPTS {
                        return Err(err);
                    }
                    warn!(connector, attempt, kind = ?err.kind, cause = %err.cause, "transient connector error, retrying");
                    last_err = Some(err);
                }
                Err(_elapsed) => {
                    return Err(SourceError::new(SourceErrorKind::Timeout, format!("{connector}: deadline exceeded")));
                }
            }

            let backoff = backoff_with_jitter(attempt);
            let time_left = remaining(Instant::now());
            if backoff >= time_left {
                break;
            }
            tokio::time::sleep(backoff).await;
        }

        Err(last_err.unwrap_or_else(|| SourceError::transient(format!("{connector}: retries exhausted"))))
    }
}

fn backoff_with_jitter(attempt: u32) -> Duration {
    let base = BASE_BACKOFF.as_millis() as f64 * 2f64.powi(attempt as i32 - 1);
    let jitter_range = base * JITTER_FRACTION;
    let jitter = rand::rng().random_range(-jitter_range..=jitter_range);
    Duration::from_millis((base + jitter).max(0.0) as u64)
}
