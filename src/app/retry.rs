use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::app::config::RetrySettings;
use crate::app::error::AppError;

/// Shared cancellation flag for one in-flight action.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn check(&self, trace_id: &str) -> Result<(), AppError> {
        if self.is_cancelled() {
            Err(AppError::cancelled(trace_id))
        } else {
            Ok(())
        }
    }
}

/// Sleeps in small steps so a cancel is noticed quickly. Returns false if cancelled.
pub fn sleep_with_cancel(duration: Duration, token: &CancelToken) -> bool {
    let mut remaining = duration;
    let chunk = Duration::from_millis(50);
    while remaining > Duration::ZERO {
        if token.is_cancelled() {
            return false;
        }
        let step = remaining.min(chunk);
        std::thread::sleep(step);
        remaining = remaining.saturating_sub(step);
    }
    !token.is_cancelled()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Backoff {
    pub fn from_settings(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts.max(1),
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            multiplier: settings.multiplier.max(1),
        }
    }

    /// No waiting between attempts.
    #[cfg(test)]
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1,
        }
    }

    /// Delay before attempt `attempt` (0-based). Attempt 0 runs immediately.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.saturating_pow(attempt - 1);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt<T, P> {
    Done(T),
    Retry(P),
}

/// Calls `check` until it returns `Done`, the attempts run out, or the token
/// is cancelled. On exhaustion the last `Retry` observation is returned.
pub fn poll_until<T, P>(
    backoff: &Backoff,
    token: &CancelToken,
    trace_id: &str,
    mut check: impl FnMut(u32) -> Attempt<T, P>,
) -> Result<Attempt<T, P>, AppError> {
    let mut last = None;
    for attempt in 0..backoff.max_attempts {
        let delay = backoff.delay_before(attempt);
        if !delay.is_zero() && !sleep_with_cancel(delay, token) {
            return Err(AppError::cancelled(trace_id));
        }
        token.check(trace_id)?;
        match check(attempt) {
            Attempt::Done(value) => return Ok(Attempt::Done(value)),
            Attempt::Retry(observation) => last = Some(observation),
        }
    }
    match last {
        Some(observation) => Ok(Attempt::Retry(observation)),
        None => Err(AppError::system("poll_until ran zero attempts", trace_id)),
    }
}
