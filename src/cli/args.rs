//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::domain::rules::{MAX_SEGMENT_DURATION, MIN_SEGMENT_DURATION};

/// Arguments for the package command
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Input media file
    #[arg(short, long)]
    pub input: PathBuf,

    /// Reuse an existing job to resume it (default: a new job)
    #[arg(short, long)]
    pub job_id: Option<String>,
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Input media file the job was started for
    #[arg(short, long)]
    pub input: PathBuf,

    /// Job identifier printed by `package`
    #[arg(short, long)]
    pub job_id: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Input media file the job was started for
    #[arg(short, long)]
    pub input: PathBuf,

    /// Job identifier printed by `package`
    #[arg(short, long)]
    pub job_id: String,
}

pub fn segment_duration_in_range(s: &str) -> Result<u32, String> {
    number_range(s, MIN_SEGMENT_DURATION, MAX_SEGMENT_DURATION)
}
