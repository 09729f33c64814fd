//! FFprobe adapter for media file probing
//!
//! Durations and codecs come from `ffprobe -print_format json`; silence
//! transcripts come from an ffmpeg `silencedetect` pass into a null sink.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::adapters::exec_ffmpeg::{run_tool, FfmpegCommand};
use crate::domain::errors::*;
use crate::ports::*;

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
}

/// `silencedetect` filter expression
pub fn silencedetect_filter(threshold_db: f64, min_silence_duration: f64) -> String {
    format!("silencedetect=noise={}dB:d={}", threshold_db, min_silence_duration)
}

/// FFprobe-based probe adapter
pub struct FFprobeAdapter {
    ffprobe_path: PathBuf,
    ffmpeg_path: PathBuf,
}

impl FFprobeAdapter {
    /// Create new FFprobe adapter
    pub fn new(ffprobe_path: impl Into<PathBuf>, ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    async fn probe_json(&self, file_path: &Path) -> Result<FfprobeOutput, DomainError> {
        if !file_path.exists() {
            return Err(DomainError::FsFail(format!(
                "File not found: {}",
                file_path.display()
            )));
        }

        let args: Vec<String> = vec![
            "-v".into(),
            "quiet".into(),
            "-print_format".into(),
            "json".into(),
            "-show_format".into(),
            "-show_streams".into(),
            file_path.to_string_lossy().to_string(),
        ];
        let output = run_tool(&self.ffprobe_path, &args).await?;
        parse_probe_output(&output.stdout)
    }
}

fn parse_probe_output(stdout: &[u8]) -> Result<FfprobeOutput, DomainError> {
    serde_json::from_slice(stdout)
        .map_err(|e| DomainError::ProcessingError(format!("Unreadable ffprobe output: {}", e)))
}

fn duration_of(probe: &FfprobeOutput) -> Result<f64, DomainError> {
    probe
        .format
        .as_ref()
        .and_then(|f| f.duration.as_deref())
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
        .ok_or_else(|| DomainError::ProcessingError("ffprobe reported no duration".to_string()))
}

fn audio_codec_of(probe: &FfprobeOutput) -> Option<String> {
    probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("audio"))
        .and_then(|s| s.codec_name.clone())
}

#[async_trait]
impl ProbePort for FFprobeAdapter {
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError> {
        let probe = self.probe_json(file_path).await?;
        duration_of(&probe)
    }

    async fn probe_audio_codec(&self, file_path: &Path) -> Result<Option<String>, DomainError> {
        let probe = self.probe_json(file_path).await?;
        Ok(audio_codec_of(&probe))
    }

    async fn detect_silence(
        &self,
        file_path: &Path,
        threshold_db: f64,
        min_silence_duration: f64,
    ) -> Result<String, DomainError> {
        let cmd = FfmpegCommand::null_sink(file_path)
            .log_level("info")
            .no_video()
            .audio_filter(silencedetect_filter(threshold_db, min_silence_duration));
        let output = run_tool(&self.ffmpeg_path, &cmd.build_args()).await?;

        // silencedetect reports on the log stream
        let transcript = String::from_utf8_lossy(&output.stderr).to_string();
        debug!(file = %file_path.display(), lines = transcript.lines().count(), "Silence transcript captured");
        Ok(transcript)
    }
}
