use serde::{Deserialize, Serialize};

/// Selectors describing how the host feed is rendered.
///
/// List-valued selectors are tried in order; the first match wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Scroll container of the feed
    pub container_selectors: Vec<String>,

    /// Item links (job and imagine references)
    pub anchor_selector: String,

    /// Closest ancestor of a link that holds one whole item
    pub item_selector: String,

    /// Element inside an item that holds the author line
    pub author_container_selector: String,

    /// Author profile link inside the author line
    pub author_link_selector: String,

    /// Button row that holds the item's copy control
    pub prompt_buttons_selector: String,

    /// Copy control candidates inside the button row
    pub copy_control_selectors: Vec<String>,

    /// Any element matching this means the feed is still loading
    pub loading_selector: String,
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            container_selectors: vec![
                "#pageScroll".to_string(),
                ".infinite-scroll-component".to_string(),
            ],
            anchor_selector: r#"a[href*="/jobs/"], a[href*="/imagine"]"#.to_string(),
            item_selector: r#"div[class*="grid-item"], div[class*="aspect-square"]"#.to_string(),
            author_container_selector:
                r#"div[class*="grow relative flex items-center min-h-[32px]"], div[class*="flex items-center"]"#
                    .to_string(),
            author_link_selector: r#"a[href*="user_id="]"#.to_string(),
            prompt_buttons_selector: concat!(
                r#"div[class*="flex shrink-0 items-center"][class*="-gap"]"#,
                r#"[class*="justify-end"][class*="text-white"][class*="pointer-events-auto"]"#
            )
            .to_string(),
            copy_control_selectors: vec![
                r#"button[aria-label*="copy"]"#.to_string(),
                r#"button[title*="copy"]"#.to_string(),
                r#"button[aria-label*="prompt"]"#.to_string(),
                r#"button[title*="prompt"]"#.to_string(),
                r#"button[class*="copy"]"#.to_string(),
                r#"button[data-testid*="copy"]"#.to_string(),
                r#"button[aria-label*="Copy"]"#.to_string(),
                r#"button[title*="Copy"]"#.to_string(),
            ],
            loading_selector: r#"[class*="loading"], [class*="spinner"]"#.to_string(),
        }
    }
}
