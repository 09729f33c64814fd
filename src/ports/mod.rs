// Ports - Interface definitions (contracts)

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::domain::errors::*;
use crate::domain::model::*;

/// Port for media probing and silence detection
#[async_trait]
pub trait ProbePort: Send + Sync {
    /// Total playable duration in seconds
    async fn probe_duration(&self, file_path: &Path) -> Result<f64, DomainError>;

    /// Codec name of the first audio stream, if any
    async fn probe_audio_codec(&self, file_path: &Path) -> Result<Option<String>, DomainError>;

    /// Raw silence-detection transcript for the file
    async fn detect_silence(
        &self,
        file_path: &Path,
        threshold_db: f64,
        min_silence_duration: f64,
    ) -> Result<String, DomainError>;
}

/// Port for transcoding operations
#[async_trait]
pub trait ExecutePort: Send + Sync {
    /// Check that the transcoder can be started
    async fn is_available(&self) -> bool;

    /// Extract the audio of a video file as MP3 into `output_dir`; returns the written path
    async fn convert_to_audio(
        &self,
        input: &Path,
        output_dir: &Path,
        audio_bitrate: &str,
    ) -> Result<PathBuf, DomainError>;

    /// Write `input` to `output` according to a trim action
    async fn cut_audio(&self, input: &Path, output: &Path, action: &TrimAction) -> Result<(), DomainError>;
}

/// Port for file system operations
#[async_trait]
pub trait FsPort: Send + Sync {
    /// Check if directory exists
    async fn directory_exists(&self, dir_path: &Path) -> Result<bool, DomainError>;

    /// Regular files directly inside `dir_path` (not recursive)
    async fn list_directory(&self, dir_path: &Path) -> Result<Vec<RawEntry>, DomainError>;

    /// Get file size
    async fn file_size(&self, file_path: &Path) -> Result<u64, DomainError>;

    /// Move file, replacing the destination
    async fn move_file(&self, from: &Path, to: &Path) -> Result<(), DomainError>;
}

/// Port for the remote slot service
#[async_trait]
pub trait SlotPort: Send + Sync {
    /// Every slot reachable by the account, across households
    async fn list_slots(&self) -> Result<Vec<RemoteSlot>, DomainError>;

    /// Remove all chapters of a slot and upload `chapters` in order
    async fn replace_chapters(
        &self,
        slot_id: &str,
        chapters: &[LocalFileDescriptor],
    ) -> Result<(), DomainError>;
}
