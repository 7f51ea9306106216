use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::app::{AppContext, Result};
use crate::browser::BrowserSession;
use crate::config::Config;
use crate::download::{self, Downloader, HttpImageSource};
use crate::export::{self, ExportSelection};
use crate::sink::ConsoleSink;

/// Options for one `harvest` invocation.
pub struct HarvestArgs<'a> {
    pub url: &'a str,
    pub delay: Option<u64>,
    pub headed: bool,
    pub output: &'a Path,
    pub select: &'a [String],
}

/// Harvest a feed page until it is exhausted or Ctrl-C, then export to CSV.
pub async fn harvest(mut ctx: AppContext, args: HarvestArgs<'_>) -> Result<()> {
    let (url, page) = AppContext::feed_url(args.url)?;
    info!("Harvesting {:?} feed", page);

    if let Some(ms) = args.delay {
        ctx.config.harvest = ctx.config.harvest.clone().with_scroll_delay(ms);
    }
    if args.headed {
        ctx.config.browser.headless = false;
    }

    let session = BrowserSession::launch(&ctx.config.browser, &url).await?;
    let harvester = ctx.harvester(&session);

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupt received, stopping harvest");
                cancel.cancel();
            }
        })
    };

    let mut sink = ConsoleSink::new();
    let outcome = harvester.run(&cancel, &mut sink).await;
    interrupt.abort();
    session.close().await;
    let outcome = outcome?;

    info!(
        "Harvest ended ({}, {:?}) with {} records",
        outcome.state,
        outcome.reason,
        outcome.records.len()
    );

    if outcome.records.is_empty() {
        warn!("Nothing collected, skipping export");
        return Ok(());
    }

    let selection = ExportSelection::from_ids(args.select);
    let path = export::export_to_dir(args.output, &url, &outcome.records, &selection)?;
    println!("Saved {}", path.display());
    Ok(())
}

/// Download images and prompts for every CSV under `input` into `output`.
pub async fn download(
    mut ctx: AppContext,
    input: &Path,
    output: &Path,
    threads: Option<usize>,
    extended: bool,
) -> Result<()> {
    if let Some(workers) = threads {
        ctx.config.download = ctx.config.download.clone().with_workers(workers);
    }

    let files = download::csv_inputs(input)?;
    if files.is_empty() {
        println!("No CSV files in {}", input.display());
        return Ok(());
    }
    std::fs::create_dir_all(output)?;

    let source = Arc::new(HttpImageSource::new(&ctx.config.download)?);
    let downloader = Downloader::new(source, &ctx.config.download);
    let single = files.len() == 1;

    for file in files {
        println!("Processing {}", file.display());
        let rows = match download::read_rows(&file) {
            Ok(rows) => rows,
            Err(e) if !single => {
                error!("Skipping {}: {}", file.display(), e);
                continue;
            }
            Err(e) => return Err(e),
        };

        let tasks = download::plan_tasks(&rows, output, extended);
        if tasks.is_empty() {
            println!("  No image links found");
            continue;
        }

        let summary = downloader.run(tasks).await;
        println!(
            "  Downloaded {}/{} images ({} already present, {} failed)",
            summary.succeeded(),
            summary.total(),
            summary.skipped + summary.prompt_only,
            summary.failed
        );
    }

    Ok(())
}

/// Print the config file location, creating the default file if needed.
pub fn show_config() -> Result<()> {
    let path = Config::default_config_path()?;
    Config::load_from(&path)?;
    println!("{}", path.display());
    Ok(())
}
