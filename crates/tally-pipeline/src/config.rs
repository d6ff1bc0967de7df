//! Pipeline configuration
//!
//! Constructed once by the embedding layer and passed in; the core never
//! reads process environment or files.

use serde::{Deserialize, Serialize};

use tally_stage::{RetryPolicy, DEFAULT_INPUT_CAP};

/// Configuration for a [`crate::MeetingPipeline`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Retry/backoff policy shared by all stage calls
    pub retry: RetryPolicy,
    /// Cap on sanitized meeting text, in chars
    pub input_cap: usize,
}

impl PipelineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With a retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// With an input cap
    #[inline]
    #[must_use]
    pub fn with_input_cap(mut self, cap: usize) -> Self {
        self.input_cap = cap;
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            input_cap: DEFAULT_INPUT_CAP,
        }
    }
}
