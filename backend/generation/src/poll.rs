//! Status polling: wait between checks until a job reports done.
//!
//! The default policy checks every 10 seconds for as long as it takes.
//! Backoff, attempt limits, and an overall deadline are opt-in.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use flatframe_config::StudioConfig;

/// Interval and limits for status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PollPolicy {
    /// Wait before the first status check.
    pub interval: Duration,
    /// Multiplier applied to the wait after each check (1.0 keeps it fixed).
    pub backoff_factor: f64,
    /// Upper bound on a single wait.
    pub max_interval: Duration,
    /// Give up after this many status checks.
    pub max_attempts: Option<u32>,
    /// Give up once this much time has passed since polling began.
    pub timeout: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            backoff_factor: 1.0,
            max_interval: Duration::from_secs(60),
            max_attempts: None,
            timeout: None,
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no limits.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            max_interval: interval.max(Duration::from_secs(60)),
            ..Self::default()
        }
    }

    pub fn from_config(config: &StudioConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            backoff_factor: config.poll_backoff_factor,
            max_interval: config.max_poll_interval(),
            max_attempts: config.max_poll_attempts,
            timeout: config.poll_timeout(),
        }
    }

    /// Wait before status check `check_number` (1-indexed).
    pub fn delay_for(&self, check_number: u32) -> Duration {
        if check_number == 0 {
            return Duration::ZERO;
        }
        if self.backoff_factor <= 1.0 {
            return self.interval;
        }
        let exponent = (check_number - 1).min(i32::MAX as u32) as i32;
        let secs = self.interval.as_secs_f64() * self.backoff_factor.powi(exponent);
        let ceiling = self.max_interval.max(self.interval);
        let capped = secs.min(ceiling.as_secs_f64());
        Duration::try_from_secs_f64(capped).unwrap_or(ceiling)
    }
}

#[derive(Debug, Error)]
pub enum PollError {
    #[error("generation cancelled")]
    Cancelled,

    #[error("job did not finish after {0} status checks")]
    AttemptsExhausted(u32),

    #[error("job did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("status check failed: {0:#}")]
    Check(anyhow::Error),
}

/// Re-fetch `state` with `refresh` until `is_done` holds.
///
/// `state` is checked before the first wait, so an already finished job
/// returns without calling `refresh`. Cancellation interrupts both the wait
/// and an in-flight refresh.
pub async fn poll_until<T, D, F, Fut>(
    policy: &PollPolicy,
    cancel: &CancellationToken,
    mut state: T,
    is_done: D,
    mut refresh: F,
) -> Result<T, PollError>
where
    D: Fn(&T) -> bool,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let started = Instant::now();
    let mut checks = 0u32;

    while !is_done(&state) {
        if let Some(max) = policy.max_attempts {
            if checks >= max {
                return Err(PollError::AttemptsExhausted(checks));
            }
        }
        checks += 1;

        let delay = policy.delay_for(checks);
        if let Some(timeout) = policy.timeout {
            let wakes_at = started.elapsed().checked_add(delay);
            if wakes_at.map_or(true, |at| at > timeout) {
                return Err(PollError::TimedOut(timeout));
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        debug!(check = checks, "Checking job status");
        state = tokio::select! {
            _ = cancel.cancelled() => return Err(PollError::Cancelled),
            next = refresh() => next.map_err(PollError::Check)?,
        };
    }

    Ok(state)
}
