//! Tunables for paging, batch writes and input debouncing.

use serde::Deserialize;
use std::{env, time};

/// Largest number of requests DynamoDB accepts in one `BatchWriteItem` call.
pub const MAX_BATCH_WRITE_SIZE: usize = 25;

/// Default number of items requested per page.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Runtime settings.
///
/// ```rust
/// use dynamodb_browser::settings::Settings;
///
/// let settings: Settings = serde_json::from_str(r#"{"page_size": 50}"#).unwrap();
/// assert_eq!(settings.page_size(), 50);
/// assert_eq!(settings.batch_write_size(), 25);
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Items requested per query / scan page.
    pub page_size: i32,
    /// Write requests per `BatchWriteItem` call, capped at [`MAX_BATCH_WRITE_SIZE`].
    pub batch_write_size: usize,
    /// Batches in flight at the same time.
    pub batch_concurrency: usize,
    /// How many times unprocessed batch requests are resubmitted.
    pub batch_max_retries: u32,
    /// Delay before the first resubmission, doubled on every attempt.
    pub batch_retry_delay_ms: u64,
    /// Quiet period after the last keystroke before a document is validated.
    pub debounce_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            batch_write_size: MAX_BATCH_WRITE_SIZE,
            batch_concurrency: 4,
            batch_max_retries: 3,
            batch_retry_delay_ms: 100,
            debounce_ms: 100,
        }
    }
}

impl Settings {
    /// Defaults overridden by `DYNAMODB_BROWSER_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            page_size: env_parse("DYNAMODB_BROWSER_PAGE_SIZE", defaults.page_size),
            batch_write_size: env_parse(
                "DYNAMODB_BROWSER_BATCH_WRITE_SIZE",
                defaults.batch_write_size,
            ),
            batch_concurrency: env_parse(
                "DYNAMODB_BROWSER_BATCH_CONCURRENCY",
                defaults.batch_concurrency,
            ),
            batch_max_retries: env_parse(
                "DYNAMODB_BROWSER_BATCH_MAX_RETRIES",
                defaults.batch_max_retries,
            ),
            batch_retry_delay_ms: env_parse(
                "DYNAMODB_BROWSER_BATCH_RETRY_DELAY_MS",
                defaults.batch_retry_delay_ms,
            ),
            debounce_ms: env_parse("DYNAMODB_BROWSER_DEBOUNCE_MS", defaults.debounce_ms),
        }
    }

    /// Page size, at least 1.
    #[must_use]
    pub fn page_size(&self) -> i32 {
        self.page_size.max(1)
    }

    /// Batch size, between 1 and [`MAX_BATCH_WRITE_SIZE`].
    #[must_use]
    pub fn batch_write_size(&self) -> usize {
        self.batch_write_size.clamp(1, MAX_BATCH_WRITE_SIZE)
    }

    /// Batch concurrency, at least 1.
    #[must_use]
    pub fn batch_concurrency(&self) -> usize {
        self.batch_concurrency.max(1)
    }

    /// Delay before the given resubmission attempt (1-indexed).
    #[must_use]
    pub fn batch_retry_delay(&self, attempt: u32) -> time::Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        time::Duration::from_millis(self.batch_retry_delay_ms.saturating_mul(factor))
    }

    /// Debounce window.
    #[must_use]
    pub fn debounce(&self) -> time::Duration {
        time::Duration::from_millis(self.debounce_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}
