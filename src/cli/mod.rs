//! CLI module for ShrinkX
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::{LogFormat, LogLevel};

pub mod args;
pub mod commands;

/// ShrinkX media compressor
///
/// Compresses video, audio and image files with ffmpeg under a chosen
/// strategy, with live progress and pause/resume/cancel control.
#[derive(Parser, Debug)]
#[command(name = "shrinker")]
#[command(about = "ShrinkX media compressor - Shrink media files with ffmpeg")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level
    #[arg(long, global = true, env = "SHRINKX_LOG_LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Log output format (pretty, compact, json)
    #[arg(long, global = true, env = "SHRINKX_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Configuration file to load instead of the default search paths
    #[arg(long, global = true, env = "SHRINKX_CONFIG")]
    pub config: Option<PathBuf>,

    /// ffmpeg executable
    #[arg(long = "ffmpeg", global = true, env = "SHRINKX_FFMPEG_PATH")]
    pub ffmpeg_path: Option<PathBuf>,

    /// Value reported as 100% progress
    #[arg(long, global = true, env = "SHRINKX_PROGRESS_MAX")]
    pub progress_max: Option<f64>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show media metadata and the strategies available for the file
    Probe(args::ProbeArgs),
    /// Compress a file with one strategy
    Compress(args::CompressArgs),
    /// Print the effective configuration as TOML
    Config,
}
