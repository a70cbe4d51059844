//! CLI module for hlspack
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

/// hlspack - encrypted HLS packaging
///
/// Copies a media file into a per-job working directory, encrypts it into HLS
/// segments with a fresh AES-128 key and bundles everything into
/// `<input>.zip` next to the original.
#[derive(Parser, Debug)]
#[command(name = "hlspack")]
#[command(about = "Package a media file as an encrypted HLS zip archive")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "HLSPACK_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format (pretty, compact, json)
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: String,

    /// Configuration file (default: ./hlspack.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding job working directories
    #[arg(long, global = true)]
    pub work_root: Option<PathBuf>,

    /// Transcoder executable
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// HLS segment length in seconds
    #[arg(long, global = true, value_parser = args::segment_duration_in_range)]
    pub segment_duration: Option<u32>,

    /// Abort the transcoder after this many seconds (0 disables the limit)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the packaging pipeline for one file
    Package(args::PackageArgs),
    /// Show which checkpoints of a job exist
    Status(args::StatusArgs),
    /// Discard the working directory of a job
    Clean(args::CleanArgs),
}
