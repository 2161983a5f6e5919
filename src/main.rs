// SPDX-License-Identifier: GPL-3.0-only

use camera_inspector::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "camera-inspector")]
#[command(about = "Discover video capture devices and their supported formats")]
#[command(version = env!("GIT_VERSION"))]
#[command(subcommand_required = false)]
struct Cli {
    /// Config file (default: ~/.config/camera-inspector/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Discover cameras, open a stream on each and read their formats
    Scan {
        /// Print device records as JSON
        #[arg(long)]
        json: bool,

        /// Also fetch the detailed diagnostic dump of each device
        #[arg(short, long)]
        details: bool,
    },

    /// Parse a saved `v4l2-ctl --list-formats-ext` listing
    Parse {
        /// File holding the listing ("-" for stdin)
        file: PathBuf,

        /// Print the table as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=camera_inspector=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Parse { file, json }) => cli::parse_listing(&file, json),
        Some(Commands::Scan { json, details }) => cli::scan(&config, json, details).await,
        None => cli::scan(&config, false, false).await,
    }
}
