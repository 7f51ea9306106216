//! Configuration management for scroll-harvest.
//!
//! Configuration is read from `~/.config/scroll-harvest/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use crate::browser::BrowserOptions;
use crate::download::DownloadConfig;
use crate::engine::HarvestConfig;
use crate::locator::LocatorConfig;
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub harvest: HarvestConfig,
    pub locator: LocatorConfig,
    pub browser: BrowserOptions,
    pub download: DownloadConfig,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// If the config file exists but is invalid, returns an error.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from `path`, creating it with defaults if absent.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            Self::create_default_config(path)?;
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(config)
    }

    /// Get the default config file path: `~/.config/scroll-harvest/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("scroll-harvest").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# scroll-harvest configuration

[harvest]
# Wait after each scroll step (milliseconds, 100-5000)
scroll_delay_ms = 1000

# Distance of one scroll step (pixels)
scroll_step = 600.0

# Unchanged scroll offsets in a row before the feed counts as exhausted
stall_threshold = 5

# Wait before the first pass (milliseconds)
warm_up_ms = 50

# Poll interval while the feed shows loading placeholders (milliseconds)
settle_poll_ms = 500

# Wait between pressing a copy control and reading the clipboard (milliseconds)
copy_settle_ms = 200

[browser]
# Run the browser without a window. The feed usually needs a signed-in
# session; sign in once with a visible window and the profile keeps it.
headless = false

# Chrome profile directory (defaults to the user data dir)
# user_data_dir = "/home/me/.local/share/scroll-harvest/chrome-profile"

# Page load timeout in seconds
navigation_timeout_secs = 30

# Wait time after page load for the feed to render (milliseconds)
wait_after_load_ms = 2000

[locator]
# Scroll container of the feed (first match wins)
container_selectors = ["#pageScroll", ".infinite-scroll-component"]

# Item links
anchor_selector = 'a[href*="/jobs/"], a[href*="/imagine"]'

# Ancestor element holding one item
item_selector = 'div[class*="grid-item"], div[class*="aspect-square"]'

# Element inside an item that holds the author line
author_container_selector = 'div[class*="grow relative flex items-center min-h-[32px]"], div[class*="flex items-center"]'

# Author profile link inside the author line
author_link_selector = 'a[href*="user_id="]'

# Button row inside an item that holds the copy control
prompt_buttons_selector = 'div[class*="flex shrink-0 items-center"][class*="-gap"][class*="justify-end"][class*="text-white"][class*="pointer-events-auto"]'

# Copy controls inside the item's button row (first match wins)
copy_control_selectors = [
    'button[aria-label*="copy"]',
    'button[title*="copy"]',
    'button[aria-label*="prompt"]',
    'button[title*="prompt"]',
    'button[class*="copy"]',
    'button[data-testid*="copy"]',
    'button[aria-label*="Copy"]',
    'button[title*="Copy"]',
]

# Any match means the feed is still loading
loading_selector = '[class*="loading"], [class*="spinner"]'

[download]
# Concurrent image downloads
workers = 4

# Per-request timeout in seconds
timeout_secs = 30

# Wait between attempts for a failed image (milliseconds)
retry_delay_ms = 2000

# User agent sent to the image CDN
# user_agent = "Mozilla/5.0 ..."
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_deserializes() {
        let content = Config::default_config_content();
        let config: Config = toml::from_str(&content).expect("Default config should be valid TOML");

        let defaults = LocatorConfig::default();
        assert_eq!(config.harvest.scroll_delay_ms, 1000);
        assert_eq!(config.harvest.stall_threshold, 5);
        assert!(!config.browser.headless);
        assert_eq!(config.locator.container_selectors, defaults.container_selectors);
        assert_eq!(config.locator.anchor_selector, defaults.anchor_selector);
        assert_eq!(config.locator.item_selector, defaults.item_selector);
        assert_eq!(
            config.locator.author_container_selector,
            defaults.author_container_selector
        );
        assert_eq!(config.locator.author_link_selector, defaults.author_link_selector);
        assert_eq!(
            config.locator.prompt_buttons_selector,
            defaults.prompt_buttons_selector
        );
        assert_eq!(config.locator.copy_control_selectors, defaults.copy_control_selectors);
        assert_eq!(config.locator.loading_selector, defaults.loading_selector);
        assert_eq!(config.download.workers, 4);
        assert_eq!(config.download.retry_delay_ms, 2000);
        assert_eq!(config.download.user_agent, DownloadConfig::default().user_agent);
    }

    #[test]
    fn test_partial_config() {
        let content = r##"
[harvest]
scroll_delay_ms = 250
"##;
        let config: Config = toml::from_str(content).expect("Partial config should work");

        // Custom value
        assert_eq!(config.harvest.scroll_delay_ms, 250);
        // Default value
        assert_eq!(config.harvest.copy_settle_ms, 200);
        assert_eq!(config.browser.navigation_timeout_secs, 30);
    }

    #[test]
    fn test_empty_config() {
        let config: Config = toml::from_str("").expect("Empty config should work");
        assert_eq!(config.harvest.scroll_step, 600.0);
        assert_eq!(config.locator.container_selectors[0], "#pageScroll");
    }

    #[test]
    fn test_load_from_creates_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.harvest.scroll_delay_ms, 1000);

        let reloaded = Config::load_from(&path).unwrap();
        assert_eq!(reloaded.harvest.settle_poll_ms, 500);
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[harvest]\nscroll_delay_ms = \"soon\"").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
