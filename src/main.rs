//! ShrinkX media compressor
//!
//! Compresses media files with ffmpeg using one of several strategies.
//!
//! # Usage
//!
//! ```bash
//! shrinker probe -i "clip.mp4"
//! shrinker compress -i "clip.mp4" crf --crf 28 --preset fast
//! shrinker compress -i "song.mp3" --interactive audio-bitrate --kbps 128
//! shrinker compress -i "photo.jpg" --json image-quality --quality 8
//! ```

use anyhow::Result;
use clap::Parser;
use tracing::info;

use shrinkx_cli::cli::{commands, Cli, Commands};
use shrinkx_cli::config_initialization::{resolve_configuration, ConfigOverrides};
use shrinkx_cli::utils::logging::LoggingSystem;

/// Main entry point for the ShrinkX CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let overrides = ConfigOverrides::from_cli(&cli);
    let (config, config_source) = resolve_configuration(&overrides)?;

    // Initialize logging
    let logging = LoggingSystem::new(config.logging.clone());
    logging.initialize()?;
    logging.log_system_info();
    match &config_source {
        Some(path) => info!("Configuration loaded from {}", path.display()),
        None => info!("No configuration file found, using defaults"),
    }

    // Execute the requested command
    match cli.command {
        Commands::Probe(args) => {
            info!("Executing probe command");
            commands::probe(args, &config).await?;
        }
        Commands::Compress(args) => {
            info!("Executing compress command");
            commands::compress(args, &config).await?;
        }
        Commands::Config => {
            commands::show_config(&config)?;
        }
    }

    info!("ShrinkX completed successfully");
    Ok(())
}
