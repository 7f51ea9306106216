//! # scroll-harvest
//!
//! Scroll-driven collector for image feeds that hide their prompt text
//! behind a copy button.
//!
//! ## Architecture
//!
//! ```text
//! FeedSurface → Locator → PromptResolver → RecordStore → PresentationSink → Export
//! ```
//!
//! The [`engine::Harvester`] scrolls the feed container step by step, reads
//! each newly rendered item, presses its copy control to obtain the prompt
//! through the clipboard and restores whatever the clipboard held before.
//! The run ends when the scroll offset stops moving or when it is cancelled.
//!
//! ## Quick Start
//!
//! ```bash
//! # Harvest the top feed into the current directory
//! scroll-harvest harvest "https://www.midjourney.com/explore?tab=top"
//!
//! # Slower scrolling, CSV into ./out
//! scroll-harvest harvest "https://www.midjourney.com/explore?user_id=..." --delay 2000 -o out
//!
//! # Fetch the images and prompts listed in the exports
//! scroll-harvest download ./exports ./images --extended
//!
//! # Show where the config file lives
//! scroll-harvest config
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires config, the browser
/// session and the engine together.
pub mod app;

/// Chrome-backed feed surface and clipboard via chromiumoxide.
pub mod browser;

/// Shared clipboard capability.
///
/// - [`ExternalChannel`](channel::ExternalChannel): peek/trigger/read/write
/// - [`MemoryChannel`](channel::MemoryChannel): in-memory implementation
pub mod channel;

/// Command-line interface using clap.
///
/// - `harvest <url>` - Scroll a feed page and export a CSV
/// - `download <csv|dir> <out>` - Fetch images and prompts from exports
/// - `config` - Print the config file path
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/scroll-harvest/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Record`](domain::Record): one harvested feed item
/// - [`EngineState`](domain::EngineState): harvester lifecycle
/// - [`FeedPage`](domain::FeedPage): supported feed pages
pub mod domain;

/// Image and prompt downloads from exported CSV files.
///
/// - [`Downloader`](download::Downloader): bounded-concurrency runner
/// - [`ImageSource`](download::ImageSource): async trait for fetching images
/// - [`HttpImageSource`](download::HttpImageSource): reqwest-based implementation
pub mod download;

/// The scroll-drive harvest engine.
pub mod engine;

/// CSV export and file naming.
pub mod export;

/// Feed item identification.
pub mod locator;

/// Presentation sinks for incremental and final results.
pub mod sink;
