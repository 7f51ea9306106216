//! Chrome-backed feed and clipboard.
//!
//! Uses chromiumoxide to open the feed page and evaluate the locator's
//! scripts in it. The page's own `navigator.clipboard` is the shared buffer
//! the copy controls write into.
//!
//! ```rust,ignore
//! let session = BrowserSession::launch(&options, &url).await?;
//! let feed = session.feed(FeedScripts::new(locator_config));
//! let clipboard = session.clipboard();
//! ```

mod clipboard;
mod config;
mod feed;
mod session;

pub use clipboard::PageClipboard;
pub use config::BrowserOptions;
pub use feed::ChromeFeed;
pub use session::BrowserSession;
