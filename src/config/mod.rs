//! Configuration values and their precedence: CLI > Env > File > Defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::model::SizeTolerance;
use crate::domain::rules::DEFAULT_AUDIO_BITRATE;
use crate::domain::usecases::{SyncContext, DEFAULT_MIN_SILENCE_DURATION, DEFAULT_SILENCE_THRESHOLD_DB};

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "TONIE_SYNC_";

/// Tunable settings for a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Noise floor for silence detection, in dB
    pub silence_threshold_db: f64,
    /// Minimum trailing silence worth trimming, in seconds
    pub min_silence_duration: f64,
    /// Bitrate for converted and re-encoded audio
    pub audio_bitrate: String,
    /// Relative tolerance for size/duration comparison (0.0 = exact)
    pub size_tolerance: f64,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// Concurrent conversion/analysis tasks
    pub jobs: usize,
    pub log_level: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
            min_silence_duration: DEFAULT_MIN_SILENCE_DURATION,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
            size_tolerance: 0.0,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            jobs: num_cpus::get(),
            log_level: "info".to_string(),
        }
    }
}

impl SyncConfig {
    /// Apply `TONIE_SYNC_*` variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<usize, DomainError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut overrides = 0;
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("SILENCE_THRESHOLD_DB") {
            self.silence_threshold_db = parse_env("SILENCE_THRESHOLD_DB", &v)?;
            overrides += 1;
        }
        if let Some(v) = var("MIN_SILENCE_DURATION") {
            self.min_silence_duration = parse_env("MIN_SILENCE_DURATION", &v)?;
            overrides += 1;
        }
        if let Some(v) = var("AUDIO_BITRATE") {
            self.audio_bitrate = v;
            overrides += 1;
        }
        if let Some(v) = var("SIZE_TOLERANCE") {
            self.size_tolerance = parse_env("SIZE_TOLERANCE", &v)?;
            overrides += 1;
        }
        if let Some(v) = var("FFMPEG_PATH") {
            self.ffmpeg_path = PathBuf::from(v);
            overrides += 1;
        }
        if let Some(v) = var("FFPROBE_PATH") {
            self.ffprobe_path = PathBuf::from(v);
            overrides += 1;
        }
        if let Some(v) = var("JOBS") {
            self.jobs = parse_env("JOBS", &v)?;
            overrides += 1;
        }
        if let Some(v) = var("LOG_LEVEL") {
            self.log_level = v;
            overrides += 1;
        }

        Ok(overrides)
    }

    /// Reject values the planner cannot work with
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.silence_threshold_db.is_finite() || self.silence_threshold_db >= 0.0 {
            return Err(DomainError::Config(format!(
                "silence_threshold_db must be negative, got {}",
                self.silence_threshold_db
            )));
        }
        if !self.min_silence_duration.is_finite() || self.min_silence_duration <= 0.0 {
            return Err(DomainError::Config(format!(
                "min_silence_duration must be positive, got {}",
                self.min_silence_duration
            )));
        }
        if !self.size_tolerance.is_finite() || self.size_tolerance < 0.0 {
            return Err(DomainError::Config(format!(
                "size_tolerance must be zero or positive, got {}",
                self.size_tolerance
            )));
        }
        if self.jobs == 0 {
            return Err(DomainError::Config("jobs must be at least 1".to_string()));
        }
        if self.audio_bitrate.trim().is_empty() {
            return Err(DomainError::Config("audio_bitrate cannot be empty".to_string()));
        }
        crate::utils::logging::LogLevel::parse(&self.log_level)?;
        Ok(())
    }

    /// Planning context for a run
    pub fn sync_context(&self, force_update: bool) -> SyncContext {
        SyncContext {
            force_update,
            tolerance: SizeTolerance::relative(self.size_tolerance),
            silence_threshold_db: self.silence_threshold_db,
            min_silence_duration: self.min_silence_duration,
            audio_bitrate: self.audio_bitrate.clone(),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, DomainError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| {
        DomainError::Config(format!("Invalid value for {}{}: {} ({})", ENV_PREFIX, name, value, e))
    })
}
