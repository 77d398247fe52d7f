// ── Token-bucket rate limiter ──
//
// One limiter per vendor client instance, shared across every outbound
// call that client makes. Burst capacity equals the nominal rate; vendor
// caps (Meraki's hard 10 req/s) are clamped by the config layer before
// the limiter is constructed.

use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::Error;

struct Bucket {
    tokens: f64,
    last: Instant,
}

/// Token-bucket rate limiter with blocking acquisition.
///
/// `acquire` waits until a token is available or the cancellation token
/// fires. Waiters queue on the internal mutex, so acquisition is FIFO
/// under contention.
pub struct RateLimiter {
    rate: f64,
    burst: f64,
    bucket: Mutex<Bucket>,
}

impl RateLimiter {
    /// Create a limiter admitting `rate_per_sec` requests per second.
    ///
    /// A zero or negative rate is treated as 1 req/s -- a limiter that
    /// admits nothing would deadlock every caller.
    pub fn new(rate_per_sec: f64) -> Self {
        let rate = if rate_per_sec > 0.0 { rate_per_sec } else { 1.0 };
        Self {
            rate,
            burst: rate,
            bucket: Mutex::new(Bucket {
                tokens: rate,
                last: Instant::now(),
            }),
        }
    }

    /// The configured rate in requests per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Take one token, sleeping until the bucket refills if necessary.
    ///
    /// Returns [`Error::Cancelled`] if the token fires while waiting.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), Error> {
        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let wait = {
                let mut bucket = self.bucket.lock().await;
                let now = Instant::now();
                let elapsed = now.duration_since(bucket.last).as_secs_f64();
                bucket.tokens = (bucket.tokens + elapsed * self.rate).min(self.burst);
                bucket.last = now;

                if bucket.tokens >= 1.0 {
                    bucket.tokens -= 1.0;
                    return Ok(());
                }
                Duration::from_secs_f64((1.0 - bucket.tokens) / self.rate)
            };

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(wait) => {}
            }
        }
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("rate", &self.rate)
            .field("burst", &self.burst)
            .finish_non_exhaustive()
    }
}
