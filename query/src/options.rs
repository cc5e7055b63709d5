use std::time::Duration;

/// Fallback toast title and error text ("failed to load data").
pub const DEFAULT_ERROR_MESSAGE: &str = "Gagal memuat data";

/// Retry and notification settings for one executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    /// Maximum number of retries (not counting the first attempt).
    pub max_retries: u32,
    /// Base backoff delay; retry `n` waits `retry_delay * n`.
    pub retry_delay: Duration,
    /// Toast title, and error text when a failure carries no message.
    pub error_message: String,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_delay: Duration::from_millis(1000),
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl QueryOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub fn with_error_message(mut self, error_message: impl Into<String>) -> Self {
        self.error_message = error_message.into();
        self
    }

    /// Total number of attempts one execution may make.
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the given retry.
    ///
    /// - `retry`: 1 before the second attempt, 2 before the third, etc.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        self.retry_delay.saturating_mul(retry)
    }
}
