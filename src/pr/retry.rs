//! Bounded exponential backoff for hosting API calls.

use std::time::Duration;

use log::warn;

use crate::error::{Error, Result};

/// Retry policy: `max_attempts` tries, doubling the delay after each failure
/// up to `max_delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// A policy that tries once.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        self.initial_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Run `operation`, retrying transient failures.
    pub fn retry<T>(
        &self,
        sleep: &dyn Fn(Duration),
        operation: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        self.retry_when(Error::is_transient, sleep, operation)
    }

    /// Run `operation`, retrying failures for which `should_retry` holds.
    ///
    /// The error finally returned records how many attempts were made.
    pub fn retry_when<T>(
        &self,
        should_retry: impl Fn(&Error) -> bool,
        sleep: &dyn Fn(Duration),
        mut operation: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(error) if attempt < self.max_attempts && should_retry(&error) => {
                    let delay = self.delay(attempt);
                    warn!("{error}; retrying in {delay:?}");
                    sleep(delay);
                    attempt += 1;
                }
                Err(error) => return Err(with_attempts(error, attempt)),
            }
        }
    }
}

fn with_attempts(error: Error, count: u32) -> Error {
    match error {
        Error::Remote {
            operation,
            message,
            status,
            transient,
            ..
        } => Error::Remote {
            operation,
            message,
            status,
            transient,
            attempts: count,
        },
        other => other,
    }
}
