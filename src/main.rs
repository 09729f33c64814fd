//! tonie-sync
//!
//! A command-line tool that keeps Creative Tonie slots in sync with a local
//! directory of audio files.
//!
//! # Features
//!
//! - Replace-upload only for slots whose chapters differ from the directory
//! - Video sources converted to MP3 with ffmpeg
//! - Trailing silence of converted files trimmed before upload
//! - Dry runs and a status listing that never change a slot
//!
//! # Usage
//!
//! ```bash
//! tonie-sync sync --input ./audiobook --all --dry-run
//! tonie-sync status --input ./audiobook --json
//! tonie-sync silence --input ./audiobook/01.mp3
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tonie_sync::cli::{commands, Cli, Commands};
use tonie_sync::utils::logging::{LogFormat, LogLevel, LoggingConfig};

/// Main entry point for the tonie-sync CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let (config, env_overrides) = commands::load_config(cli.config.as_deref())?;

    // Initialize logging
    let level = LogLevel::parse(cli.log_level.as_deref().unwrap_or(&config.log_level))
        .context("Invalid log level")?;
    let format = LogFormat::parse(&cli.log_format).context("Invalid log format")?;
    LoggingConfig::new(level, format)
        .initialize()
        .context("Failed to initialize logging")?;

    info!("Starting tonie-sync");
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    // Execute the requested command
    match cli.command {
        Commands::Sync(args) => {
            info!("Executing sync command");
            commands::sync(args, config, cli.slots).await?;
        }
        Commands::Status(args) => {
            info!("Executing status command");
            commands::status(args, config, cli.slots).await?;
        }
        Commands::Silence(args) => {
            info!("Executing silence command");
            commands::silence(args, config, cli.slots).await?;
        }
    }

    info!("tonie-sync completed successfully");
    Ok(())
}
