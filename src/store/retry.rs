//! Retry policy for documentation fetches

use std::time::Duration;

use crate::store::provider::{DocumentationProvider, ProviderError};

/// Exponential backoff for transient provider failures
///
/// Only `ProviderError::Transient` is retried. A permanent failure, or the
/// last transient one, turns into "no documentation".
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first (at least one is always made)
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            multiplier: 2,
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// A single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `retry` (0 is the first retry)
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(self.multiplier.saturating_pow(retry))
            .min(self.max_backoff)
    }

    /// Fetches documentation, retrying transient failures
    pub async fn fetch(&self, provider: &dyn DocumentationProvider, command: &str) -> Option<String> {
        let attempts = self.max_attempts.max(1);

        for attempt in 1..=attempts {
            match provider.get_documentation(command).await {
                Ok(documentation) => return documentation,
                Err(ProviderError::Permanent(reason)) => {
                    log::warn!("documentation for {} unavailable: {}", command, reason);
                    return None;
                }
                Err(ProviderError::Transient(reason)) if attempt == attempts => {
                    log::warn!(
                        "documentation for {} unavailable after {} attempts: {}",
                        command,
                        attempts,
                        reason
                    );
                    return None;
                }
                Err(ProviderError::Transient(reason)) => {
                    let delay = self.backoff_for(attempt - 1);
                    log::debug!(
                        "documentation for {} failed (attempt {}/{}), retrying in {:?}: {}",
                        command,
                        attempt,
                        attempts,
                        delay,
                        reason
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }

        None
    }
}
