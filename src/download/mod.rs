//! Image downloader for exported CSV files.
//!
//! Every row becomes one task (four in extended mode, one per grid image
//! `0_0..0_3`). A task saves `<jobId>_<n>.png` and, once the image is on
//! disk, the prompt as `<jobId>_<n>.txt` next to it. Files already present
//! are not fetched again.
//!
//! ```text
//! csv_inputs → read_rows → plan_tasks → Downloader (semaphore) → ImageSource
//! ```

mod config;
mod http;
mod rows;

pub use config::{DownloadConfig, DEFAULT_WORKERS, EXTENDED_RETRIES, RETRIES};
pub use http::HttpImageSource;
pub use rows::{csv_inputs, read_rows, ExportRow};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::app::Result;

/// Grid images per job in extended mode.
pub const EXTENDED_IMAGES: usize = 4;

/// Where image bytes come from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn fetch(&self, url: &str, referer: Option<&str>) -> Result<Vec<u8>>;
}

/// One image and its prompt file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// `<jobId>_<n>`
    pub name: String,
    pub url: String,
    pub referer: Option<String>,
    pub image_path: PathBuf,
    pub prompt_path: PathBuf,
    pub prompt: String,
    pub retries: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadOutcome {
    Downloaded,
    /// Image was already present; only the prompt file was written.
    PromptOnly,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub prompt_only: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DownloadSummary {
    pub fn record(&mut self, outcome: DownloadOutcome) {
        match outcome {
            DownloadOutcome::Downloaded => self.downloaded += 1,
            DownloadOutcome::PromptOnly => self.prompt_only += 1,
            DownloadOutcome::Skipped => self.skipped += 1,
            DownloadOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.downloaded + self.prompt_only + self.skipped + self.failed
    }

    pub fn succeeded(&self) -> usize {
        self.total() - self.failed
    }
}

/// Keep characters that are safe in file names; fall back to `task_<n>`.
pub fn task_id(job_id: &str, row_number: usize) -> String {
    let cleaned: String = job_id
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, '.' | '_' | '-' | ' '))
        .collect();
    if cleaned.is_empty() {
        format!("task_{}", row_number)
    } else {
        cleaned
    }
}

/// Replace the grid index after the last `_` of the file stem:
/// `.../0_0.png` becomes `.../0_<index>.png`.
pub fn extended_url(url: &str, index: usize) -> String {
    let name_start = url.rfind('/').map_or(0, |i| i + 1);
    let (base, ext) = match url[name_start..].rfind('.') {
        Some(dot) => url.split_at(name_start + dot),
        None => (url, ""),
    };
    match base.rfind('_') {
        Some(pos) => format!("{}{}{}", &base[..=pos], index, ext),
        None => format!("{}_{}{}", base, index, ext),
    }
}

/// Build the download tasks for `rows`. Rows without an image link are
/// left out.
pub fn plan_tasks(rows: &[ExportRow], out_dir: &Path, extended: bool) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();
    for (i, row) in rows.iter().enumerate() {
        if row.img_link.is_empty() {
            debug!("Row {} has no image link", i + 1);
            continue;
        }
        let id = task_id(&row.job_id, i + 1);

        let variants: Vec<(usize, String)> = if extended {
            (0..EXTENDED_IMAGES)
                .map(|n| (n, extended_url(&row.img_link, n)))
                .collect()
        } else {
            vec![(0, row.img_link.clone())]
        };

        for (n, url) in variants {
            let name = format!("{}_{}", id, n);
            tasks.push(DownloadTask {
                image_path: out_dir.join(format!("{}.png", name)),
                prompt_path: out_dir.join(format!("{}.txt", name)),
                name,
                url,
                referer: row.job_link.clone(),
                prompt: row.prompt.clone(),
                retries: if extended { EXTENDED_RETRIES } else { RETRIES },
            });
        }
    }
    tasks
}

/// Runs download tasks with bounded concurrency.
pub struct Downloader {
    source: Arc<dyn ImageSource>,
    semaphore: Arc<Semaphore>,
    retry_delay: Duration,
}

impl Downloader {
    pub fn new(source: Arc<dyn ImageSource>, config: &DownloadConfig) -> Self {
        Self {
            source,
            semaphore: Arc::new(Semaphore::new(config.workers())),
            retry_delay: config.retry_delay(),
        }
    }

    pub async fn run(&self, tasks: Vec<DownloadTask>) -> DownloadSummary {
        let mut handles = Vec::new();

        for task in tasks {
            let source = self.source.clone();
            let semaphore = self.semaphore.clone();
            let retry_delay = self.retry_delay;

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return DownloadOutcome::Failed;
                };
                process_task(source.as_ref(), &task, retry_delay).await
            }));
        }

        let mut summary = DownloadSummary::default();
        for handle in handles {
            match handle.await {
                Ok(outcome) => summary.record(outcome),
                Err(e) => {
                    error!("Download task join error: {}", e);
                    summary.record(DownloadOutcome::Failed);
                }
            }
        }
        summary
    }
}

async fn exists(path: &Path) -> bool {
    fs::try_exists(path).await.unwrap_or(false)
}

async fn write_prompt(task: &DownloadTask) {
    match fs::write(&task.prompt_path, task.prompt.as_bytes()).await {
        Ok(()) => debug!("Saved prompt {}", task.prompt_path.display()),
        Err(e) => warn!("Failed to save prompt for {}: {}", task.name, e),
    }
}

/// Write through a temporary file so a partial image never looks complete.
async fn save_image(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let tmp = path.with_extension("png.tmp");
    fs::write(&tmp, bytes).await?;
    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(e);
    }
    Ok(())
}

/// Fetch one image, retrying up to `task.retries` times, then write its
/// prompt. The prompt file only exists next to a saved image.
pub async fn process_task(
    source: &dyn ImageSource,
    task: &DownloadTask,
    retry_delay: Duration,
) -> DownloadOutcome {
    let image_exists = exists(&task.image_path).await;
    let prompt_exists = exists(&task.prompt_path).await;

    if image_exists && prompt_exists {
        debug!("Skipping {}, already downloaded", task.name);
        return DownloadOutcome::Skipped;
    }
    if image_exists {
        write_prompt(task).await;
        return DownloadOutcome::PromptOnly;
    }

    let attempts = task.retries + 1;
    for attempt in 1..=attempts {
        let result: Result<()> = match source.fetch(&task.url, task.referer.as_deref()).await {
            Ok(bytes) => save_image(&task.image_path, &bytes).await.map_err(Into::into),
            Err(e) => Err(e),
        };
        match result {
            Ok(()) => {
                write_prompt(task).await;
                info!("Downloaded {}", task.image_path.display());
                return DownloadOutcome::Downloaded;
            }
            Err(e) => warn!(
                "Download of {} failed ({}/{}): {}",
                task.url, attempt, attempts, e
            ),
        }
        if attempt < attempts {
            tokio::time::sleep(retry_delay).await;
        }
    }

    if prompt_exists {
        if let Err(e) = fs::remove_file(&task.prompt_path).await {
            warn!("Failed to remove stale prompt for {}: {}", task.name, e);
        }
    }
    error!("Giving up on {}", task.url);
    DownloadOutcome::Failed
}
