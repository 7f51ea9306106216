use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Options for the Chrome instance that renders the feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Whether to run the browser in headless mode (default: false)
    ///
    /// The feed usually needs a signed-in session, so a visible window is
    /// the default.
    pub headless: bool,

    /// Chrome profile directory, reused across runs to keep the login
    pub user_data_dir: Option<PathBuf>,

    /// Page load timeout in seconds (default: 30)
    pub navigation_timeout_secs: u64,

    /// Wait time after page load for the feed to render in milliseconds (default: 2000)
    pub wait_after_load_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            user_data_dir: dirs::data_dir().map(|d| d.join("scroll-harvest").join("chrome-profile")),
            navigation_timeout_secs: 30,
            wait_after_load_ms: 2000,
            user_agent: None,
        }
    }
}

impl BrowserOptions {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }
}
