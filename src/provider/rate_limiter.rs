// Token-bucket rate limiter for provider calls.
//
// Remote classification APIs are typically rate-limited per key. This
// limiter enforces a minimum interval between requests: each acquire
// consumes the slot, and if the interval hasn't elapsed since the last
// request, the caller sleeps until it has.

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

/// A simple rate limiter that enforces a maximum request rate.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<RateLimiterInner>>,
}

struct RateLimiterInner {
    /// Minimum time between requests
    interval: Duration,
    /// When the last request was allowed through
    last_request: Option<Instant>,
}

impl RateLimiter {
    /// Create a new rate limiter that allows `requests_per_second` requests per second.
    pub fn new(requests_per_second: f64) -> Self {
        let interval = Duration::from_secs_f64(1.0 / requests_per_second);
        Self {
            inner: Arc::new(Mutex::new(RateLimiterInner {
                interval,
                last_request: None,
            })),
        }
    }

    /// Wait until a request is allowed, then return.
    pub async fn acquire(&self) {
        loop {
            let mut inner = self.inner.lock().await;
            let now = Instant::now();

            match inner.last_request {
                // Another caller may have taken the slot while we slept,
                // so the interval is re-checked after every re-lock
                Some(last) if now.duration_since(last) < inner.interval => {
                    let sleep_time = inner.interval - now.duration_since(last);
                    // Drop the lock before sleeping so other tasks aren't blocked
                    drop(inner);
                    tokio::time::sleep(sleep_time).await;
                }
                _ => {
                    inner.last_request = Some(now);
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_request_is_immediate() {
        let limiter = RateLimiter::new(1.0);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn second_request_waits_for_interval() {
        let limiter = RateLimiter::new(2.0); // 500ms between requests
        limiter.acquire().await;
        let start = Instant::now();
        limiter.acquire().await;
        assert!(
            start.elapsed() >= Duration::from_millis(400),
            "Expected ~500ms delay, got {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn concurrent_waiters_each_consume_their_own_slot() {
        let limiter = RateLimiter::new(10.0); // 100ms between requests
        limiter.acquire().await;
        let start = Instant::now();
        // Both waiters sleep through the same interval; only one may take
        // the next slot, the other must wait a full further interval
        tokio::join!(limiter.acquire(), limiter.acquire());
        assert!(
            start.elapsed() >= Duration::from_millis(180),
            "both waiters passed in a single interval: {:?}",
            start.elapsed()
        );
    }
}
