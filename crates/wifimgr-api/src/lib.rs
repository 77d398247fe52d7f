//! Async clients for the Mist and Meraki cloud management APIs.
//!
//! Each vendor client is a thin, rate-limited HTTP surface: paths,
//! pagination, auth headers, and the retry loop. Response bodies are
//! returned as raw JSON -- `wifimgr-core` owns decoding into canonical
//! entities. Every outbound call goes through the shared token bucket
//! and the retry classifier, so callers never see transient failures
//! that a backoff would have absorbed.

pub mod error;
pub mod limiter;
pub mod meraki;
pub mod mist;
pub mod retry;
pub mod transport;

pub use error::Error;
pub use limiter::RateLimiter;
pub use meraki::MerakiClient;
pub use mist::MistClient;
pub use retry::{ErrorClass, RetryPolicy, RetryState};
