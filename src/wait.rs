//! Bounded polling.
//!
//! The vendor provisions and releases resources asynchronously, so the
//! workflow has to wait at several points. Every wait here is a fixed-interval
//! poll with an overall deadline; nothing blocks unconditionally.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::debug;

/// Interval and deadline for one polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitPolicy {
    /// Delay between probes
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Overall deadline
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl WaitPolicy {
    /// Creates a policy with the given interval and deadline.
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

/// Outcome of [`wait_until`] when the condition was not met in time.
#[derive(Debug)]
pub enum WaitError<E> {
    /// The deadline elapsed before the probe reported completion.
    Timeout {
        /// How long was waited
        waited: Duration,
    },
    /// The probe itself failed.
    Probe(E),
}

/// Polls `probe` until it reports `Some(value)`, the deadline elapses, or the
/// probe fails.
///
/// The probe runs immediately, then once per interval. A probe error aborts
/// the wait; retry-on-error belongs in the probe closure if a caller wants it.
pub async fn wait_until<T, E, F, Fut>(
    policy: &WaitPolicy,
    mut probe: F,
) -> Result<T, WaitError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    let started = Instant::now();
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match probe().await {
            Ok(Some(value)) => return Ok(value),
            Ok(None) => {
                let waited = started.elapsed();
                debug!(attempt, ?waited, "condition not met yet");
                if waited + policy.interval > policy.timeout {
                    return Err(WaitError::Timeout { waited });
                }
                tokio::time::sleep(policy.interval).await;
            }
            Err(err) => return Err(WaitError::Probe(err)),
        }
    }
}
