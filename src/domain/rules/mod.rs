// Domain rules - Business logic and policies

use tracing::debug;

use crate::domain::catalog::normalize_title;
use crate::domain::model::*;
use crate::domain::silence::meets_minimum;

/// Default bitrate handed to the transcoder when a cut needs a re-encode
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";

/// Business rules for trimming trailing silence
#[derive(Debug, Clone)]
pub struct TrimPlanner {
    audio_bitrate: String,
}

impl Default for TrimPlanner {
    fn default() -> Self {
        Self::new(DEFAULT_AUDIO_BITRATE)
    }
}

impl TrimPlanner {
    pub fn new(audio_bitrate: impl Into<String>) -> Self {
        Self {
            audio_bitrate: audio_bitrate.into(),
        }
    }

    /// Decide whether to cut a file at the start of its trailing silence.
    ///
    /// Trims only when the silence from `interval.start` to the end of file is at
    /// least `min_silence_duration`. A file that is silent from the first sample
    /// is passed through rather than cut to nothing.
    pub fn plan(
        &self,
        interval: Option<&SilenceInterval>,
        duration_seconds: f64,
        min_silence_duration: f64,
        source_codec: Option<&str>,
    ) -> TrimDecision {
        let Some(interval) = interval else {
            return TrimDecision::passthrough();
        };

        let start = interval.start_seconds;
        if start <= 0.0 {
            debug!(duration = duration_seconds, "Whole file is silent, not trimming");
            return TrimDecision::passthrough();
        }
        if start > duration_seconds {
            debug!(start, duration = duration_seconds, "Silence starts after end of file");
            return TrimDecision::passthrough();
        }

        let trailing = duration_seconds - start;
        if !meets_minimum(trailing, min_silence_duration) {
            debug!(trailing, min_silence_duration, "Trailing silence too short");
            return TrimDecision::passthrough();
        }

        TrimDecision::cut(start, self.cut_method(source_codec))
    }

    /// Stream copy when the codec can be cut without re-encoding
    pub fn cut_method(&self, source_codec: Option<&str>) -> CutMethod {
        match source_codec {
            Some(codec) if supports_copy(codec) => CutMethod::StreamCopy,
            _ => CutMethod::Reencode {
                bitrate: self.audio_bitrate.clone(),
            },
        }
    }
}

/// Audio codecs that can be cut losslessly by packet copy
pub fn supports_copy(codec: &str) -> bool {
    matches!(codec, "mp3" | "aac" | "flac" | "vorbis" | "opus") || codec.starts_with("pcm_")
}

/// Business rules for deciding whether a slot needs new content
#[derive(Debug, Clone, Default)]
pub struct ContentDiffEngine {
    tolerance: SizeTolerance,
}

impl ContentDiffEngine {
    pub fn new(tolerance: SizeTolerance) -> Self {
        Self { tolerance }
    }

    /// Compare local content against one slot.
    ///
    /// Read-only and deterministic. Any `Update`/`ForceUpdate` means every chapter
    /// on the slot is replaced by `planned_chapters`.
    pub fn diff_slot(
        &self,
        slot: &RemoteSlot,
        local: &[LocalFileDescriptor],
        force_update: bool,
    ) -> SlotSyncDecision {
        let mut planned: Vec<LocalFileDescriptor> = local.to_vec();
        planned.sort_by(LocalFileDescriptor::catalog_order);

        let (action, reason) = self.compare(&planned, &slot.ordered_chapters(), force_update);
        debug!(slot = %slot.id, %action, %reason, "Slot compared");

        SlotSyncDecision {
            slot_id: slot.id.clone(),
            slot_name: slot.name.clone(),
            action,
            reason,
            planned_chapters: if action.replaces_content() { planned } else { Vec::new() },
        }
    }

    fn compare(
        &self,
        local: &[LocalFileDescriptor],
        remote: &[&RemoteChapterDescriptor],
        force_update: bool,
    ) -> (SyncAction, SyncReason) {
        if force_update {
            return (SyncAction::ForceUpdate, SyncReason::Forced);
        }
        if local.is_empty() {
            return (SyncAction::Skip, SyncReason::NothingToUpload);
        }
        if local.len() != remote.len() {
            return (
                SyncAction::Update,
                SyncReason::CountDiffers {
                    local: local.len(),
                    remote: remote.len(),
                },
            );
        }

        for (index, (file, chapter)) in local.iter().zip(remote.iter()).enumerate() {
            if let Some(reason) = self.pair_difference(index, file, chapter) {
                return (SyncAction::Update, reason);
            }
        }

        (SyncAction::Skip, SyncReason::UpToDate)
    }

    /// First difference between a local file and the chapter at the same index
    fn pair_difference(
        &self,
        index: usize,
        file: &LocalFileDescriptor,
        chapter: &RemoteChapterDescriptor,
    ) -> Option<SyncReason> {
        if normalize_title(file.display_name()) != normalize_title(&chapter.title) {
            return Some(SyncReason::TitleMismatch { index });
        }

        if let Some(remote_size) = chapter.size_bytes {
            if !self.tolerance.matches_bytes(file.size_bytes(), remote_size) {
                return Some(SyncReason::SizeMismatch { index });
            }
        } else if let (Some(remote), Some(local)) = (chapter.duration_seconds, file.duration_seconds()) {
            if !self.tolerance.matches_f64(local, remote) {
                return Some(SyncReason::DurationMismatch { index });
            }
        }
        None
    }
}

/// Compare with exact size matching, without slot identity
pub fn diff_slot(
    local: &[LocalFileDescriptor],
    remote_chapters: &[RemoteChapterDescriptor],
    force_update: bool,
) -> SlotSyncDecision {
    let slot = RemoteSlot::new("", "").with_chapters(remote_chapters.to_vec());
    ContentDiffEngine::default().diff_slot(&slot, local, force_update)
}
