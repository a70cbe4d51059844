//! hlspack CLI
//!
//! Packages a media file as encrypted HLS inside a zip archive.
//!
//! # Usage
//!
//! ```bash
//! hlspack package --input clip.mp4
//! hlspack package --input clip.mp4 --job-id 3f2a9c   # resume a failed job
//! hlspack status --input clip.mp4 --job-id 3f2a9c --json
//! hlspack clean --input clip.mp4 --job-id 3f2a9c
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use hlspack::adapters::TracingEventSink;
use hlspack::cli::{commands, Cli, Commands};
use hlspack::config_initialization::initialize_configuration_hierarchy;
use hlspack::utils::logging::{LogFormat, LoggingConfig, LoggingSystem};
use hlspack::DefaultAppContainer;

/// Main entry point for the hlspack CLI application
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let resolved = initialize_configuration_hierarchy(&cli).await?;

    // Initialize logging
    let logging = LoggingSystem::new(LoggingConfig {
        level: resolved.log_level,
        format: LogFormat::parse(&cli.log_format)?,
        target: false,
    });
    logging.initialize();
    logging.log_system_info();
    if let Some(path) = &resolved.config_file {
        info!(path = %path.display(), "Configuration file loaded");
    }

    let container = DefaultAppContainer::new(resolved.settings, Arc::new(TracingEventSink::new()))
        .context("Failed to initialize application")?;

    // Execute the requested command
    match cli.command {
        Commands::Package(args) => {
            commands::package(&container, args).await?;
        }
        Commands::Status(args) => {
            commands::status(&container, args).await?;
        }
        Commands::Clean(args) => {
            commands::clean(&container, args).await?;
        }
    }

    Ok(())
}
