use serde::{Deserialize, Serialize};

use super::RetryPolicy;
use crate::error::{CairnError, Result};

/// Tuning knobs for one scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum number of tasks handed to the executor at once
    pub concurrency_limit: usize,
    pub retry: RetryPolicy,
    /// When false, the first terminal failure stops dispatching and cancels
    /// every task still pending
    pub continue_on_failure: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            retry: RetryPolicy::default(),
            continue_on_failure: true,
        }
    }
}

impl SchedulerConfig {
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Stop at the first terminal failure.
    pub fn fail_fast(mut self) -> Self {
        self.continue_on_failure = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.concurrency_limit == 0 {
            return Err(CairnError::invalid_input("concurrency_limit")
                .with_reason("at least one worker is required"));
        }
        if self.retry.max_attempts == 0 {
            return Err(CairnError::invalid_input("max_attempts")
                .with_reason("at least one attempt is required"));
        }
        Ok(())
    }
}
