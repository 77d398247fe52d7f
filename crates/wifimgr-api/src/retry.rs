// ── Retry state and error classification ──
//
// Per-call retry bookkeeping: attempt count, exponential backoff with
// jitter, and the transient/permanent/cancelled classifier. The vendor
// clients wrap every outbound call in the acquire → execute → classify →
// back off → retry pattern; callers above only ever see the final
// classification.

use std::time::Duration;

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::Error;

const BACKOFF_BASE: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: u32 = 2;
const BACKOFF_CAP: Duration = Duration::from_secs(60);
const JITTER_FRACTION: f64 = 0.2;

/// Classification of an outbound-call failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Network errors, 5xx, 429 -- eligible for retry.
    Transient,
    /// 4xx other than 429, schema errors -- retrying cannot help.
    Permanent,
    /// The cancellation token fired -- propagated verbatim.
    Cancelled,
}

/// Classify an error for retry purposes.
pub fn classify(err: &Error) -> ErrorClass {
    match err {
        Error::Cancelled => ErrorClass::Cancelled,
        e if e.is_transient() => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Retry policy knob passed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RetryPolicy {
    /// Safe to repeat: reads, idempotent writes. Up to 5 attempts.
    #[default]
    Idempotent,
    /// Not safe to repeat: non-idempotent mutations. Single attempt.
    Mutation,
}

impl RetryPolicy {
    pub fn max_attempts(self) -> u32 {
        match self {
            Self::Idempotent => 5,
            Self::Mutation => 1,
        }
    }
}

/// Per-call retry state: attempt count and next backoff.
#[derive(Debug)]
pub struct RetryState {
    policy: RetryPolicy,
    attempt: u32,
    next_backoff: Duration,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            attempt: 1,
            next_backoff: BACKOFF_BASE,
        }
    }

    /// The current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Whether the given error warrants another attempt.
    ///
    /// Only transient errors retry, and only while attempts remain
    /// under the policy's budget.
    pub fn should_retry(&self, err: &Error) -> bool {
        classify(err) == ErrorClass::Transient && self.attempt < self.policy.max_attempts()
    }

    /// Sleep before the next attempt, honoring cancellation.
    ///
    /// Sleeps for the larger of the exponential backoff (base 1s,
    /// factor 2, jitter ±20%, cap 60s) and any vendor `Retry-After`
    /// hint. Advances the attempt counter.
    pub async fn wait_before_retry(
        &mut self,
        cancel: &CancellationToken,
        hinted_delay: Option<Duration>,
    ) -> Result<(), Error> {
        let backoff = jittered(self.next_backoff);
        let delay = match hinted_delay {
            Some(hint) if hint > backoff => hint,
            _ => backoff,
        };

        debug!(
            attempt = self.attempt,
            delay_ms = delay.as_millis() as u64,
            "backing off before retry"
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(Error::Cancelled),
            () = tokio::time::sleep(delay) => {}
        }

        self.attempt += 1;
        self.next_backoff = (self.next_backoff * BACKOFF_FACTOR).min(BACKOFF_CAP);
        Ok(())
    }
}

/// Apply ±20% uniform jitter to a backoff duration.
fn jittered(base: Duration) -> Duration {
    let spread = base.as_secs_f64() * JITTER_FRACTION;
    let offset = rand::rng().random_range(-spread..=spread);
    Duration::from_secs_f64((base.as_secs_f64() + offset).max(0.0))
}
