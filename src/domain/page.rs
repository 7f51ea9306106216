use url::Url;

pub const HOST: &str = "www.midjourney.com";
pub const EXPLORE_PATH: &str = "/explore";

/// Which explore feed a page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedPage {
    /// `?tab=top`
    Top,
    /// `?tab=likes`
    Likes,
    /// Any other tab, e.g. `?tab=random`
    Tab(String),
    /// `?user_id=<id>`
    User(String),
}

impl FeedPage {
    /// Classify `url`, or `None` when it is not a harvestable feed page.
    pub fn from_url(url: &Url) -> Option<Self> {
        if url.host_str() != Some(HOST) || !url.path().starts_with(EXPLORE_PATH) {
            return None;
        }

        let mut tab = None;
        let mut user_id = None;
        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "tab" if tab.is_none() => tab = Some(value.into_owned()),
                "user_id" if user_id.is_none() => user_id = Some(value.into_owned()),
                _ => {}
            }
        }

        match (tab.as_deref(), user_id) {
            (Some("top"), _) => Some(Self::Top),
            (Some("likes"), _) => Some(Self::Likes),
            (_, Some(id)) => Some(Self::User(id)),
            (Some(other), None) => Some(Self::Tab(other.to_string())),
            (None, None) => None,
        }
    }
}
