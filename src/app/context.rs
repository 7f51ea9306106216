use std::sync::Arc;

use url::Url;

use crate::app::error::{HarvestError, Result};
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::domain::FeedPage;
use crate::engine::Harvester;
use crate::locator::{ExploreLocator, FeedScripts};

pub struct AppContext {
    pub config: Config,
}

impl AppContext {
    /// Load the config file, creating it with defaults if missing.
    pub fn new() -> Result<Self> {
        Ok(Self::with_config(Config::load()?))
    }

    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Parse `url` and check that it is a harvestable explore feed.
    pub fn feed_url(url: &str) -> Result<(Url, FeedPage)> {
        let parsed =
            Url::parse(url).map_err(|e| HarvestError::InvalidUrl(format!("{}: {}", url, e)))?;
        let page = FeedPage::from_url(&parsed).ok_or_else(|| {
            HarvestError::InvalidUrl(format!(
                "{} (only explore pages with ?tab= or ?user_id= are supported)",
                url
            ))
        })?;
        Ok((parsed, page))
    }

    /// Wire a harvester to the page held by `session`.
    pub fn harvester(&self, session: &BrowserSession) -> Harvester {
        let scripts = FeedScripts::new(self.config.locator.clone());
        Harvester::new(
            Arc::new(session.feed(scripts)),
            Arc::new(ExploreLocator),
            Arc::new(session.clipboard()),
            self.config.harvest.clone(),
        )
    }
}
