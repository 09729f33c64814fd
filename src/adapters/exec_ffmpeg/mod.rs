//! FFmpeg execution adapter
//!
//! Spawns the ffmpeg executable for video-to-audio conversion and trim cuts.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// Sample rate of converted audio
const CONVERTED_SAMPLE_RATE: &str = "44100";

/// Builder for FFmpeg commands.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    input: PathBuf,
    output: PathBuf,
    /// Arguments placed after `-i <input>`
    output_args: Vec<String>,
    overwrite: bool,
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Command that decodes the input and discards the result (`-f null -`)
    pub fn null_sink(input: impl AsRef<Path>) -> Self {
        Self::new(input, "-").output_arg("-f").output_arg("null")
    }

    /// Add output argument (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Drop video streams.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Stop writing at `seconds`.
    pub fn limit_to(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set audio sample rate.
    pub fn sample_rate(self, rate: impl Into<String>) -> Self {
        self.output_arg("-ar").output_arg(rate)
    }

    /// Set audio filter.
    pub fn audio_filter(self, filter: impl Into<String>) -> Self {
        self.output_arg("-af").output_arg(filter)
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-hide_banner".to_string());
        args.push("-nostats".to_string());
        args.push("-v".to_string());
        args.push(self.log_level.clone());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.clone());

        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Run an external tool to completion and capture its output.
pub(crate) async fn run_tool(program: &Path, args: &[String]) -> Result<Output, DomainError> {
    debug!("Running: {} {}", program.display(), args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| DomainError::ToolUnavailable(format!("{}: {}", program.display(), e)))?;

    if !output.status.success() {
        return Err(DomainError::ProcessingError(format!(
            "{} exited with {}: {}",
            program.display(),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(output)
}

/// `<stem>.mp3` in `dir`, or `<stem>_N.mp3` if that name is taken
pub fn unique_audio_path(dir: &Path, stem: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{}.mp3", stem));
    let mut counter = 1;
    while candidate.exists() {
        candidate = dir.join(format!("{}_{}.mp3", stem, counter));
        counter += 1;
    }
    candidate
}

/// FFmpeg-based execution adapter
pub struct FFmpegAdapter {
    ffmpeg_path: PathBuf,
}

impl FFmpegAdapter {
    /// Create new FFmpeg adapter
    pub fn new(ffmpeg_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
        }
    }

    /// Arguments for writing `input` to `output` under a trim action
    pub fn cut_command(input: &Path, output: &Path, action: &TrimAction) -> FfmpegCommand {
        let cmd = FfmpegCommand::new(input, output).no_video();
        match action {
            TrimAction::Passthrough => cmd.audio_codec("copy"),
            TrimAction::Cut { at_seconds, method } => {
                let cmd = cmd.limit_to(*at_seconds);
                match method {
                    CutMethod::StreamCopy => cmd.audio_codec("copy"),
                    CutMethod::Reencode { bitrate } => cmd.audio_codec("libmp3lame").audio_bitrate(bitrate.clone()),
                }
            }
        }
    }

    /// Arguments for extracting MP3 audio from a video file
    pub fn convert_command(input: &Path, output: &Path, audio_bitrate: &str) -> FfmpegCommand {
        FfmpegCommand::new(input, output)
            .no_video()
            .audio_codec("libmp3lame")
            .audio_bitrate(audio_bitrate)
            .sample_rate(CONVERTED_SAMPLE_RATE)
    }
}

#[async_trait]
impl ExecutePort for FFmpegAdapter {
    async fn is_available(&self) -> bool {
        run_tool(&self.ffmpeg_path, &["-version".to_string()]).await.is_ok()
    }

    async fn convert_to_audio(
        &self,
        input: &Path,
        output_dir: &Path,
        audio_bitrate: &str,
    ) -> Result<PathBuf, DomainError> {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| DomainError::BadArgs(format!("No file name: {}", input.display())))?;
        let output = unique_audio_path(output_dir, &stem);

        info!(
            "Converting video to audio: {} -> {}",
            input.display(),
            output.display()
        );
        let cmd = Self::convert_command(input, &output, audio_bitrate);
        run_tool(&self.ffmpeg_path, &cmd.build_args()).await?;
        Ok(output)
    }

    async fn cut_audio(&self, input: &Path, output: &Path, action: &TrimAction) -> Result<(), DomainError> {
        if let TrimAction::Cut { at_seconds, .. } = action {
            info!("Trimming trailing silence of {} at {:.3}s", input.display(), at_seconds);
        }
        let cmd = Self::cut_command(input, output, action);
        run_tool(&self.ffmpeg_path, &cmd.build_args()).await?;
        Ok(())
    }
}
