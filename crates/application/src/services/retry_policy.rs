use ferrous_resolv_domain::config::MAX_TIMEOUT_SECS;
use ferrous_resolv_domain::{ChannelConfig, ResolveError};
use std::time::{Duration, Instant};

use super::NameserverSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send again to `server`.
    Retry { server: usize },
    /// No attempts left; the query terminates with the given error.
    GiveUp,
}

/// Per-attempt timeout plus the total number of attempts a query may make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    tries: u32,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, tries: u32) -> Self {
        Self {
            timeout: timeout.min(Duration::from_secs_f64(MAX_TIMEOUT_SECS)),
            tries: tries.max(1),
        }
    }

    pub fn from_config(config: &ChannelConfig) -> Self {
        Self::new(config.timeout_duration(), config.tries)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn tries(&self) -> u32 {
        self.tries
    }

    /// Deadline of an attempt dispatched at `now`.
    pub fn deadline(&self, now: Instant) -> Instant {
        now.checked_add(self.timeout).unwrap_or(now)
    }

    /// Decides what happens after an attempt on `current` ended without an
    /// answer. `remaining` counts the attempts not yet made.
    pub fn on_failure(
        &self,
        error: &ResolveError,
        remaining: u32,
        current: usize,
        server_count: usize,
        selector: &NameserverSelector,
    ) -> RetryDecision {
        let retryable = matches!(error, ResolveError::Timeout) || error.is_retryable();
        if !retryable || remaining == 0 || server_count == 0 {
            return RetryDecision::GiveUp;
        }
        RetryDecision::Retry {
            server: selector.next(current, server_count),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ChannelConfig::default())
    }
}
