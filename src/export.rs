//! CSV export of harvested records.
//!
//! The file is UTF-8 with a byte-order mark so spreadsheet tools pick the
//! right encoding. Free-text columns (prompt, params, metadata) are always
//! quoted; the rest are quoted only when they contain a delimiter.

use std::collections::HashSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Utc};
use regex::Regex;
use tracing::info;
use url::Url;

use crate::app::{HarvestError, Result};
use crate::domain::{webp_to_png, FeedPage, Record};

pub const BOM: &str = "\u{FEFF}";

pub const HEADER: [&str; 9] = [
    "Prompt",
    "Prompt Params",
    "JobId",
    "JobLink",
    "ImgLink",
    "UserName",
    "UserId",
    "UserProfileLink",
    "Metadata",
];

static UNSAFE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]").expect("static regex"));

/// Which records go into an export.
#[derive(Debug, Clone, Default)]
pub enum ExportSelection {
    #[default]
    All,
    Only(HashSet<String>),
}

impl ExportSelection {
    pub fn from_ids(ids: &[String]) -> Self {
        if ids.is_empty() {
            Self::All
        } else {
            Self::Only(ids.iter().cloned().collect())
        }
    }

    /// Selected records, in their original order.
    pub fn apply<'a>(&self, records: &'a [Record]) -> Vec<&'a Record> {
        match self {
            Self::All => records.iter().collect(),
            Self::Only(ids) => records.iter().filter(|r| ids.contains(&r.job_id)).collect(),
        }
    }
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn raw(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        quoted(field)
    } else {
        field.to_string()
    }
}

fn row(record: &Record) -> String {
    [
        quoted(&record.prompt),
        quoted(&record.prompt_params),
        raw(&record.job_id),
        raw(&record.job_link),
        raw(&webp_to_png(&record.img_link)),
        raw(&record.user_name),
        raw(&record.user_id),
        raw(&record.user_profile_link),
        quoted(&record.metadata),
    ]
    .join(",")
}

/// Write the CSV document for `records` to `w`.
pub fn write_csv<W: Write>(mut w: W, records: &[&Record]) -> io::Result<()> {
    write!(w, "{}{}", BOM, HEADER.join(","))?;
    for record in records {
        write!(w, "\n{}", row(record))?;
    }
    Ok(())
}

/// File name prefix describing which feed the records came from.
pub fn file_prefix(page_url: &Url, records: &[&Record]) -> String {
    match FeedPage::from_url(page_url) {
        Some(FeedPage::Top) => "MJ-top".to_string(),
        Some(FeedPage::Likes) => "MJ-likes".to_string(),
        Some(FeedPage::User(user_id)) => {
            let user_name = records
                .first()
                .filter(|r| r.has_known_author())
                .map(|r| UNSAFE_NAME_CHARS.replace_all(&r.user_name, "_").into_owned())
                .unwrap_or_else(|| "unknown".to_string());
            format!("MJ-{}-{}", user_name, user_id)
        }
        _ => "MJ".to_string(),
    }
}

/// `<prefix>_<timestamp>.csv`, timestamped in UTC+8.
pub fn file_name(page_url: &Url, records: &[&Record], now: DateTime<Utc>) -> String {
    let offset = FixedOffset::east_opt(8 * 3600).expect("static offset");
    let stamp = now.with_timezone(&offset).format("%Y-%m-%d_%H-%M-%S");
    format!("{}_{}.csv", file_prefix(page_url, records), stamp)
}

/// Write the selected records into `dir` and return the file path.
pub fn export_to_dir(
    dir: &Path,
    page_url: &Url,
    records: &[Record],
    selection: &ExportSelection,
) -> Result<PathBuf> {
    let selected = selection.apply(records);
    if selected.is_empty() {
        return Err(HarvestError::Other("no records selected".to_string()));
    }

    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(page_url, &selected, Utc::now()));
    let file = fs::File::create(&path)?;
    let mut writer = io::BufWriter::new(file);
    write_csv(&mut writer, &selected)?;
    writer.flush()?;

    info!("Exported {} records to {}", selected.len(), path.display());
    Ok(path)
}
