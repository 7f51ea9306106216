use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_WORKERS: usize = 4;

/// Retries after the first attempt, per image.
pub const RETRIES: u32 = 2;
/// Retries in extended mode, where four images are fetched per job.
pub const EXTENDED_RETRIES: u32 = 1;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36";

/// Image download settings (`[download]`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Concurrent downloads
    pub workers: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// Wait between attempts in milliseconds
    pub retry_delay_ms: u64,

    pub user_agent: String,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: 30,
            retry_delay_ms: 2000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl DownloadConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// At least one worker.
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
