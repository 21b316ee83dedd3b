//! Retry policies and the blocking retry loop.
//!
//! A policy only decides; the loop in [`run_with_retry`] owns attempt
//! counting and sleeping. The server propagates newly created objects with a
//! delay, so one read path treats 404 as transient on top of the usual 5xx
//! handling.

use std::thread;
use std::time::{Duration, Instant};

use tracing::warn;

use crate::http::HttpResponse;
use crate::transport::TransportError;

/// Backoff and attempt budget for a retried call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub wait_min: Duration,
    pub wait_max: Duration,
    /// No retry is started that would sleep past this instant.
    pub deadline: Option<Instant>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            wait_min: Duration::from_secs(5),
            wait_max: Duration::from_secs(5),
            deadline: None,
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, wait_min: Duration, wait_max: Duration) -> Self {
        Self {
            max_retries,
            wait_min,
            wait_max,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Wait before retry number `retry` (0-based): `wait_min * 2^retry`,
    /// clamped to `wait_max`.
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.wait_min
            .checked_mul(factor)
            .unwrap_or(self.wait_max)
            .min(self.wait_max)
    }
}

/// A policy refused to continue retrying.
#[derive(Debug, thiserror::Error)]
#[error("retry aborted: {reason}")]
pub struct RetryAbort {
    pub reason: String,
}

/// Decides whether an attempt should be repeated.
pub trait RetryPolicy {
    fn should_retry(
        &self,
        attempt: Result<&HttpResponse, &TransportError>,
    ) -> Result<bool, RetryAbort>;
}

/// Retries transport failures and 5xx responses other than 501.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRetryPolicy;

impl RetryPolicy for DefaultRetryPolicy {
    fn should_retry(
        &self,
        attempt: Result<&HttpResponse, &TransportError>,
    ) -> Result<bool, RetryAbort> {
        match attempt {
            Err(err) if err.is_permanent() => Err(RetryAbort {
                reason: err.to_string(),
            }),
            Err(_) => Ok(true),
            Ok(response) => Ok(response.status >= 500 && response.status != 501),
        }
    }
}

/// Retries 404 while waiting for an object to appear; otherwise behaves like
/// [`DefaultRetryPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryOnNotFound;

impl RetryPolicy for RetryOnNotFound {
    fn should_retry(
        &self,
        attempt: Result<&HttpResponse, &TransportError>,
    ) -> Result<bool, RetryAbort> {
        if let Ok(response) = attempt {
            if response.status == 404 {
                return Ok(true);
            }
        }
        DefaultRetryPolicy.should_retry(attempt)
    }
}

/// Retries only on 500. The server answers 500 to property writes issued
/// before the owning settings object has been applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryOnServerError;

impl RetryPolicy for RetryOnServerError {
    fn should_retry(
        &self,
        attempt: Result<&HttpResponse, &TransportError>,
    ) -> Result<bool, RetryAbort> {
        Ok(matches!(attempt, Ok(response) if response.status == 500))
    }
}

/// Run `attempt` until the policy declines, the budget is spent or the
/// next wait would pass the deadline.
///
/// Returns the last attempt's result. A policy error ends the loop
/// immediately.
pub fn run_with_retry<P, F>(
    config: &RetryConfig,
    policy: &P,
    mut attempt: F,
) -> Result<Result<HttpResponse, TransportError>, RetryAbort>
where
    P: RetryPolicy + ?Sized,
    F: FnMut() -> Result<HttpResponse, TransportError>,
{
    let mut retry: u32 = 0;
    loop {
        let result = attempt();
        let again = policy.should_retry(result.as_ref())?;
        if !again {
            return Ok(result);
        }
        if retry >= config.max_retries {
            warn!(attempts = retry.saturating_add(1), "giving up after exhausting retries");
            return Ok(result);
        }

        let delay = config.backoff(retry);
        if let Some(deadline) = config.deadline {
            if Instant::now() + delay >= deadline {
                warn!(attempts = retry.saturating_add(1), "giving up at deadline");
                return Ok(result);
            }
        }
        match &result {
            Ok(response) => warn!(
                status = response.status,
                attempt = retry.saturating_add(1),
                max = config.max_retries.saturating_add(1),
                "retrying in {delay:?}"
            ),
            Err(err) => warn!(
                error = %err,
                attempt = retry.saturating_add(1),
                max = config.max_retries.saturating_add(1),
                "retrying in {delay:?}"
            ),
        }
        thread::sleep(delay);
        retry += 1;
    }
}
