//! Matching rules for the explore feed's markup conventions.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Author;

use super::RawAuthor;

static STYLE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url\(\s*["']?([^"')]+)["']?\s*\)"#).expect("static regex"));

static RESOLUTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)_N\.(webp|png)$").expect("static regex"));

static RESOLUTION_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_\d+_N(\.(webp|png))$").expect("static regex"));

static USER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"user_id=([^&]+)").expect("static regex"));

/// Extract the job id from an item link.
///
/// `/jobs/<id>?...` and `/imagine/<id>/...` are accepted. Returns `None` for
/// anything else, including an empty id.
pub fn parse_job_id(href: &str) -> Option<String> {
    let id = if let Some((_, rest)) = href.split_once("/jobs/") {
        rest.split('?').next()
    } else if href.contains("/imagine") {
        href.split_once("/imagine/")
            .and_then(|(_, rest)| rest.split('/').next())
    } else {
        None
    }?;

    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// All `url(...)` references in an inline style attribute, in order.
pub fn image_refs(style: &str) -> Vec<String> {
    STYLE_URL
        .captures_iter(style)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Resolution number of a `<digits>_N.<ext>` reference.
pub fn resolution(link: &str) -> Option<u64> {
    RESOLUTION
        .captures(link)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Pick the reference with the largest resolution suffix.
///
/// References without a suffix never displace one that has it; when no
/// reference has a suffix the first one is kept. Ties keep the earlier one.
pub fn select_max_resolution(refs: &[String]) -> Option<&str> {
    let first = refs.first()?;
    let best = refs.iter().fold(first, |best, current| {
        match (resolution(current), resolution(best)) {
            (None, _) => best,
            (Some(_), None) => current,
            (Some(cur), Some(max)) if cur > max => current,
            _ => best,
        }
    });
    Some(best.as_str())
}

/// Strip the `_<digits>_N` marker in front of the extension.
pub fn normalize_image_link(link: &str) -> String {
    RESOLUTION_MARKER.replace(link, "$1").into_owned()
}

/// Full-resolution image for an item, from its style first and its `<img>`
/// second. `None` drops the item.
pub fn resolve_image(style: Option<&str>, img_src: Option<&str>) -> Option<String> {
    let refs = style.map(image_refs).unwrap_or_default();
    let chosen = match select_max_resolution(&refs) {
        Some(link) => link.to_string(),
        None => img_src.filter(|src| !src.is_empty())?.to_string(),
    };
    Some(normalize_image_link(&chosen))
}

/// Author identity from the profile link, falling back to the sentinel.
pub fn parse_author(raw: Option<&RawAuthor>) -> Author {
    let Some(raw) = raw else {
        return Author::default();
    };

    let mut author = Author {
        user_name: raw.text.trim().to_string(),
        ..Author::default()
    };
    if let Some(id) = USER_ID.captures(&raw.href).and_then(|caps| caps.get(1)) {
        author.user_id = id.as_str().to_string();
        author.user_profile_link = raw.href.clone();
    }
    author
}
