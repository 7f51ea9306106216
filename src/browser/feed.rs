use async_trait::async_trait;
use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::engine::{FeedError, FeedSurface};
use crate::locator::{FeedScripts, FeedSnapshot, RawAnchor};

/// The explore feed rendered in a Chrome page.
#[derive(Debug, Clone)]
pub struct ChromeFeed {
    page: Page,
    scripts: FeedScripts,
}

#[derive(Deserialize)]
struct PageSnapshot {
    found: bool,
    #[serde(default)]
    anchors: Vec<RawAnchor>,
}

#[derive(Deserialize)]
struct PageOffset {
    found: bool,
    offset: f64,
}

impl ChromeFeed {
    pub fn new(page: Page, scripts: FeedScripts) -> Self {
        Self { page, scripts }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, FeedError> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| FeedError::Script(format!("Script execution failed: {}", e)))?
            .into_value()
            .map_err(|e| FeedError::Script(format!("Failed to parse result: {:?}", e)))
    }
}

#[async_trait]
impl FeedSurface for ChromeFeed {
    async fn snapshot(&self) -> Result<FeedSnapshot, FeedError> {
        let snapshot: PageSnapshot = self.eval(self.scripts.snapshot_script()).await?;
        if !snapshot.found {
            return Err(FeedError::ContainerMissing);
        }
        Ok(FeedSnapshot {
            anchors: snapshot.anchors,
        })
    }

    async fn is_loading(&self) -> Result<bool, FeedError> {
        self.eval(self.scripts.loading_script()).await
    }

    async fn scroll_offset(&self) -> Result<f64, FeedError> {
        let offset: PageOffset = self.eval(self.scripts.scroll_offset_script()).await?;
        if !offset.found {
            return Err(FeedError::ContainerMissing);
        }
        Ok(offset.offset)
    }

    async fn scroll_by(&self, delta: f64) -> Result<(), FeedError> {
        let scrolled: bool = self.eval(self.scripts.scroll_by_script(delta)).await?;
        if scrolled {
            Ok(())
        } else {
            Err(FeedError::ContainerMissing)
        }
    }
}
