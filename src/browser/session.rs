use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    PermissionDescriptor, PermissionSetting, SetPermissionParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::app::{HarvestError, Result};
use crate::browser::{BrowserOptions, ChromeFeed, PageClipboard};
use crate::locator::FeedScripts;

/// Permissions the prompt round trip needs on the feed's origin.
pub const CLIPBOARD_PERMISSIONS: [&str; 2] = ["clipboard-read", "clipboard-write"];

/// A launched browser with the feed page open.
pub struct BrowserSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    /// Launch Chrome, grant clipboard access for the feed's origin and open
    /// `url`.
    pub async fn launch(options: &BrowserOptions, url: &url::Url) -> Result<Self> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-dev-shm-usage")
            .request_timeout(options.navigation_timeout());

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(ref dir) = options.user_data_dir {
            std::fs::create_dir_all(dir)?;
            builder = builder.user_data_dir(dir);
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            HarvestError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        let origin = url.origin().ascii_serialization();
        for grant in clipboard_grants(&origin) {
            let name = grant.permission.name.clone();
            if let Err(e) = browser.execute(grant).await {
                // Reading the clipboard will fail later and abort the run.
                warn!("Could not grant {} to {}: {}", name, origin, e);
            }
        }

        let page = browser
            .new_page(url.as_str())
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = options.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| HarvestError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        page.wait_for_navigation()
            .await
            .map_err(|e| HarvestError::Browser(format!("Navigation failed: {}", e)))?;

        // The clipboard API only works in a focused document.
        if let Err(e) = page.bring_to_front().await {
            warn!("Could not focus page: {}", e);
        }

        tokio::time::sleep(options.wait_after_load()).await;
        info!("Opened {}", url);

        Ok(Self {
            browser,
            page,
            handler,
        })
    }

    pub fn feed(&self, scripts: FeedScripts) -> ChromeFeed {
        ChromeFeed::new(self.page.clone(), scripts)
    }

    pub fn clipboard(&self) -> PageClipboard {
        PageClipboard::new(self.page.clone())
    }

    pub async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// One `Browser.setPermission` command per clipboard permission for `origin`.
fn clipboard_grants(origin: &str) -> Vec<SetPermissionParams> {
    CLIPBOARD_PERMISSIONS
        .iter()
        .map(|name| {
            let mut grant =
                SetPermissionParams::new(PermissionDescriptor::new(*name), PermissionSetting::Granted);
            grant.origin = Some(origin.to_string());
            grant
        })
        .collect()
}
