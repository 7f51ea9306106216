use std::fs;
use std::path::{Path, PathBuf};

use csv::StringRecord;

use crate::app::{HarvestError, Result};

const PROMPT_COLUMNS: &[&str] = &["Prompt"];
const JOB_ID_COLUMNS: &[&str] = &["JobId", "任务id", "任务ID"];
const IMAGE_COLUMNS: &[&str] = &["ImgLink", "图片链接"];
const JOB_LINK_COLUMNS: &[&str] = &["JobLink", "任务链接"];

/// The columns of an exported CSV row that downloading needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub job_id: String,
    pub job_link: Option<String>,
    pub img_link: String,
    pub prompt: String,
}

/// CSV files named by `input`: the file itself, or every `.csv` directly
/// inside a directory, sorted by name.
pub fn csv_inputs(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        if !is_csv(input) {
            return Err(HarvestError::Other(format!(
                "{} is not a CSV file",
                input.display()
            )));
        }
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(HarvestError::Other(format!(
            "{} does not exist",
            input.display()
        )));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(input)? {
        let path = entry?.path();
        if path.is_file() && is_csv(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

fn column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim_start_matches('\u{FEFF}').trim()))
}

fn required(headers: &StringRecord, names: &[&str], path: &Path) -> Result<usize> {
    column(headers, names).ok_or_else(|| {
        HarvestError::Other(format!(
            "{} has no {} column",
            path.display(),
            names[0]
        ))
    })
}

/// Read the rows of one exported CSV file.
pub fn read_rows(path: &Path) -> Result<Vec<ExportRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();

    let prompt = required(&headers, PROMPT_COLUMNS, path)?;
    let job_id = required(&headers, JOB_ID_COLUMNS, path)?;
    let image = required(&headers, IMAGE_COLUMNS, path)?;
    let job_link = column(&headers, JOB_LINK_COLUMNS);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or("").trim().to_string();
        rows.push(ExportRow {
            job_id: field(job_id),
            job_link: job_link.map(field).filter(|link| !link.is_empty()),
            img_link: field(image),
            prompt: field(prompt),
        });
    }
    Ok(rows)
}
