use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scroll_harvest::app::AppContext;
use scroll_harvest::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Harvest {
            url,
            delay,
            headed,
            output,
            select,
        } => {
            let ctx = AppContext::new()?;
            let args = commands::HarvestArgs {
                url: &url,
                delay,
                headed,
                output: &output,
                select: &select,
            };
            commands::harvest(ctx, args).await?;
        }
        Commands::Download {
            input,
            output,
            threads,
            extended,
        } => {
            let ctx = AppContext::new()?;
            commands::download(ctx, &input, &output, threads, extended).await?;
        }
        Commands::Config => {
            commands::show_config()?;
        }
    }

    Ok(())
}
