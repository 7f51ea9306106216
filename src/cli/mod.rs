pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "scroll-harvest")]
#[command(about = "Collect prompts and images from an explore feed", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scroll through a feed page and export what it shows
    Harvest {
        /// Explore page URL (?tab=... or ?user_id=...)
        url: String,

        /// Wait after each scroll step in milliseconds (100-5000)
        #[arg(short, long)]
        delay: Option<u64>,

        /// Show the browser window
        #[arg(long)]
        headed: bool,

        /// Directory for the CSV file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Only export these job ids (repeatable)
        #[arg(short, long = "select", value_name = "JOB_ID")]
        select: Vec<String>,
    },
    /// Download the images and prompts listed in exported CSV files
    Download {
        /// A CSV file or a directory of CSV files
        input: PathBuf,

        /// Directory for images and prompt files
        output: PathBuf,

        /// Concurrent downloads
        #[arg(short, long)]
        threads: Option<usize>,

        /// Fetch all four grid images (0_0 to 0_3) of each job
        #[arg(long)]
        extended: bool,
    },
    /// Print the config file path, creating it with defaults if missing
    Config,
}
