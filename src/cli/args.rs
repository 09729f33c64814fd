//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;
use clap_num::number_range;

use crate::config::SyncConfig;
use crate::domain::model::SlotSelection;

fn parse_jobs(s: &str) -> Result<usize, String> {
    number_range(s, 1, 256)
}

/// Processing overrides shared by commands that touch audio
#[derive(Args, Debug, Default)]
pub struct TuningArgs {
    /// Path to the ffmpeg executable
    #[arg(long)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to the ffprobe executable
    #[arg(long)]
    pub ffprobe_path: Option<PathBuf>,

    /// Bitrate for converted audio (e.g. 128k)
    #[arg(long)]
    pub audio_bitrate: Option<String>,

    /// Minimum trailing silence to trim, in seconds
    #[arg(long)]
    pub min_silence: Option<f64>,

    /// Silence noise floor in dB (negative)
    #[arg(long, allow_hyphen_values = true)]
    pub threshold_db: Option<f64>,

    /// Files converted in parallel
    #[arg(short, long, value_parser = parse_jobs)]
    pub jobs: Option<usize>,

    /// Relative size tolerance when comparing chapters (0 = exact)
    #[arg(long)]
    pub size_tolerance: Option<f64>,
}

impl TuningArgs {
    /// Command-line values win over everything else
    pub fn apply(&self, config: &mut SyncConfig) {
        if let Some(path) = &self.ffmpeg_path {
            config.ffmpeg_path = path.clone();
        }
        if let Some(path) = &self.ffprobe_path {
            config.ffprobe_path = path.clone();
        }
        if let Some(bitrate) = &self.audio_bitrate {
            config.audio_bitrate = bitrate.clone();
        }
        if let Some(min) = self.min_silence {
            config.min_silence_duration = min;
        }
        if let Some(db) = self.threshold_db {
            config.silence_threshold_db = db;
        }
        if let Some(jobs) = self.jobs {
            config.jobs = jobs;
        }
        if let Some(tolerance) = self.size_tolerance {
            config.size_tolerance = tolerance;
        }
    }
}

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Directory with the audio (or video) files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Show what would be uploaded without changing any slot
    #[arg(long)]
    pub dry_run: bool,

    /// Replace content even when it already matches
    #[arg(long)]
    pub force_update: bool,

    /// Convert video files to MP3 and include them
    #[arg(long)]
    pub convert_video: bool,

    /// Keep converted files next to their sources
    #[arg(long)]
    pub keep_converted: bool,

    /// Do not trim trailing silence of converted files
    #[arg(long)]
    pub no_trim: bool,

    /// Target every slot
    #[arg(long, conflicts_with_all = ["outdated", "slot"])]
    pub all: bool,

    /// Target only slots that are out of date
    #[arg(long, conflicts_with = "slot")]
    pub outdated: bool,

    /// Target a slot by id (repeatable)
    #[arg(long = "slot", value_name = "ID")]
    pub slot: Vec<String>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

impl SyncArgs {
    /// Slots targeted by this run; the first slot when nothing is given
    pub fn selection(&self) -> SlotSelection {
        if !self.slot.is_empty() {
            SlotSelection::Ids(self.slot.clone())
        } else if self.all {
            SlotSelection::All
        } else if self.outdated {
            SlotSelection::NeedsUpdate
        } else {
            SlotSelection::First
        }
    }
}

/// Arguments for the status command
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Directory with the audio files
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    /// Relative size tolerance when comparing chapters (0 = exact)
    #[arg(long)]
    pub size_tolerance: Option<f64>,
}

/// Arguments for the silence command
#[derive(Args, Debug)]
pub struct SilenceArgs {
    /// Audio file to analyze
    #[arg(short, long)]
    pub input: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}
