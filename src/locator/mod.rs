//! Locator/extractor for feed items.
//!
//! The page side ([`FeedScripts`]) gathers raw attributes for every item link
//! in the feed container. The Rust side ([`Locator`]) turns those into
//! [`Candidate`]s: it parses the job id, picks the full-resolution image and
//! resolves the author. Markup conventions live in [`LocatorConfig`] and
//! [`rules`], so a new host page version means a new config or a new
//! `Locator`, not a new engine.
//!
//! ```text
//! container → snapshot script → FeedSnapshot → Locator → Vec<Candidate>
//! ```

mod config;
pub mod rules;
mod script;

pub use config::LocatorConfig;
pub(crate) use script::js_literal;
pub use script::{FeedScripts, CONTROL_ATTR};

use serde::Deserialize;
use tracing::debug;

use crate::channel::ControlId;
use crate::domain::Author;

/// Raw item links currently materialized in the feed container.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedSnapshot {
    pub anchors: Vec<RawAnchor>,
}

/// One item link as read from the page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnchor {
    pub href: String,
    pub style: Option<String>,
    /// `src` of the first `<img>` inside the item
    pub img_src: Option<String>,
    pub author: Option<RawAuthor>,
    pub copy_control: Option<ControlId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAuthor {
    pub href: String,
    pub text: String,
}

/// A feed item that passed identification, ready for prompt resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub job_id: String,
    pub job_link: String,
    pub img_link: String,
    pub author: Author,
    pub copy_control: Option<ControlId>,
}

/// Turns a feed snapshot into identified candidates.
pub trait Locator: Send + Sync {
    /// Candidates in snapshot order. Items without a job id or image are
    /// left out; this never fails.
    fn find_candidates(&self, snapshot: &FeedSnapshot) -> Vec<Candidate>;
}

/// Locator for the explore feed (`/jobs/` and `/imagine/` links).
#[derive(Debug, Clone, Copy, Default)]
pub struct ExploreLocator;

impl ExploreLocator {
    pub fn candidate(anchor: &RawAnchor) -> Option<Candidate> {
        let Some(job_id) = rules::parse_job_id(&anchor.href) else {
            debug!("Skipping link without job id: {}", anchor.href);
            return None;
        };

        let Some(img_link) = rules::resolve_image(anchor.style.as_deref(), anchor.img_src.as_deref())
        else {
            debug!("Skipping job {} without image reference", job_id);
            return None;
        };

        Some(Candidate {
            job_id,
            job_link: anchor.href.clone(),
            img_link,
            author: rules::parse_author(anchor.author.as_ref()),
            copy_control: anchor.copy_control.clone(),
        })
    }
}

impl Locator for ExploreLocator {
    fn find_candidates(&self, snapshot: &FeedSnapshot) -> Vec<Candidate> {
        snapshot.anchors.iter().filter_map(Self::candidate).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::USER_NOT_FOUND;

    fn anchor(href: &str, style: Option<&str>) -> RawAnchor {
        RawAnchor {
            href: href.to_string(),
            style: style.map(str::to_string),
            ..RawAnchor::default()
        }
    }

    #[test]
    fn test_find_candidates_skips_bad_items() {
        let snapshot = FeedSnapshot {
            anchors: vec![
                anchor(
                    "https://www.midjourney.com/jobs/a1?index=0",
                    Some(r#"background-image: url("https://cdn.midjourney.com/a1/0_0_640_N.webp")"#),
                ),
                anchor("https://www.midjourney.com/explore", Some(r#"url("x_1_N.png")"#)),
                anchor("https://www.midjourney.com/jobs/no-image", None),
            ],
        };

        let candidates = ExploreLocator.find_candidates(&snapshot);
        assert_eq!(candidates.len(), 1);
        let first = &candidates[0];
        assert_eq!(first.job_id, "a1");
        assert_eq!(first.job_link, "https://www.midjourney.com/jobs/a1?index=0");
        assert_eq!(first.img_link, "https://cdn.midjourney.com/a1/0_0.webp");
        assert_eq!(first.author.user_name, USER_NOT_FOUND);
        assert_eq!(first.copy_control, None);
    }

    #[test]
    fn test_snapshot_deserializes_from_page_json() {
        let json = serde_json::json!({
            "anchors": [{
                "href": "https://www.midjourney.com/imagine/b2/1",
                "style": null,
                "imgSrc": "https://cdn.midjourney.com/b2/0_1_384_N.webp",
                "author": {
                    "href": "https://www.midjourney.com/explore?user_id=u9",
                    "text": "someone"
                },
                "copyControl": "7"
            }]
        });
        let snapshot: FeedSnapshot = serde_json::from_value(json).unwrap();
        let candidates = ExploreLocator.find_candidates(&snapshot);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].job_id, "b2");
        assert_eq!(candidates[0].img_link, "https://cdn.midjourney.com/b2/0_1.webp");
        assert_eq!(candidates[0].author.user_id, "u9");
        assert_eq!(candidates[0].copy_control, Some(ControlId::new("7")));
    }
}
