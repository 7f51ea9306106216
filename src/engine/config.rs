use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_SCROLL_DELAY_MS: u64 = 100;
pub const MAX_SCROLL_DELAY_MS: u64 = 5000;
pub const DEFAULT_SCROLL_DELAY_MS: u64 = 1000;

/// Timing and termination settings for a harvest run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Wait after each scroll step in milliseconds (default: 1000, range 100-5000)
    pub scroll_delay_ms: u64,

    /// Distance of one scroll step in pixels (default: 600)
    pub scroll_step: f64,

    /// Unchanged scroll offsets in a row that end the run (default: 5)
    pub stall_threshold: u32,

    /// Wait before the first pass in milliseconds (default: 50)
    pub warm_up_ms: u64,

    /// Poll interval while the feed shows loading placeholders (default: 500)
    pub settle_poll_ms: u64,

    /// Wait between pressing a copy control and reading the clipboard (default: 200)
    pub copy_settle_ms: u64,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            scroll_delay_ms: DEFAULT_SCROLL_DELAY_MS,
            scroll_step: 600.0,
            stall_threshold: 5,
            warm_up_ms: 50,
            settle_poll_ms: 500,
            copy_settle_ms: 200,
        }
    }
}

impl HarvestConfig {
    /// Override the scroll delay, e.g. from the command line
    pub fn with_scroll_delay(mut self, ms: u64) -> Self {
        self.scroll_delay_ms = ms;
        self
    }

    /// Scroll delay clamped to the supported range
    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(
            self.scroll_delay_ms
                .clamp(MIN_SCROLL_DELAY_MS, MAX_SCROLL_DELAY_MS),
        )
    }

    pub fn warm_up(&self) -> Duration {
        Duration::from_millis(self.warm_up_ms)
    }

    pub fn settle_poll(&self) -> Duration {
        Duration::from_millis(self.settle_poll_ms)
    }

    pub fn copy_settle(&self) -> Duration {
        Duration::from_millis(self.copy_settle_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_harvest_config() {
        let config = HarvestConfig::default();
        assert_eq!(config.scroll_delay(), Duration::from_millis(1000));
        assert_eq!(config.scroll_step, 600.0);
        assert_eq!(config.stall_threshold, 5);
        assert_eq!(config.warm_up(), Duration::from_millis(50));
        assert_eq!(config.settle_poll(), Duration::from_millis(500));
        assert_eq!(config.copy_settle(), Duration::from_millis(200));
    }

    #[test]
    fn test_scroll_delay_is_clamped() {
        let low = HarvestConfig::default().with_scroll_delay(10);
        assert_eq!(low.scroll_delay(), Duration::from_millis(100));

        let high = HarvestConfig::default().with_scroll_delay(60_000);
        assert_eq!(high.scroll_delay(), Duration::from_millis(5000));

        let inside = HarvestConfig::default().with_scroll_delay(2500);
        assert_eq!(inside.scroll_delay(), Duration::from_millis(2500));
    }
}
