// Domain models - Core types and data structures

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::catalog::normalize_title;

/// Maximum length of a chapter title, in characters
pub const TITLE_MAX_LENGTH: usize = 100;

/// Extensions uploaded as-is
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "m4a", "ogg"];

/// Extensions that must be converted to audio before upload
pub const VIDEO_EXTENSIONS: &[&str] = &["mkv", "mp4", "avi", "mov", "wmv", "flv"];

/// Kind of a recognized media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    /// Classify a path by its extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_string_lossy().to_lowercase();
        if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Audio)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }

    pub fn requires_conversion(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// One entry of a directory listing, as produced by the filesystem adapter
#[derive(Debug, Clone, PartialEq)]
pub struct RawEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl RawEntry {
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}

/// A local file that will become one chapter.
///
/// Fields are private so the title and ordering invariants hold for every
/// value; a converted file gets a fresh descriptor via [`LocalFileDescriptor::converted`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocalFileDescriptor {
    path: PathBuf,
    source_path: PathBuf,
    display_name: String,
    size_bytes: u64,
    sort_key: String,
    requires_conversion: bool,
    modified: Option<DateTime<Utc>>,
    duration_seconds: Option<f64>,
}

impl LocalFileDescriptor {
    /// Build a descriptor for a scanned file
    pub fn new(
        path: impl Into<PathBuf>,
        size_bytes: u64,
        modified: Option<DateTime<Utc>>,
        requires_conversion: bool,
    ) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let sort_key = path
            .file_name()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        Self {
            source_path: path.clone(),
            path,
            display_name: normalize_title(&stem),
            size_bytes,
            sort_key,
            requires_conversion,
            modified,
            duration_seconds: None,
        }
    }

    /// Build from a catalog entry
    pub fn from_entry(entry: &RawEntry, kind: MediaKind) -> Self {
        Self::new(
            entry.path.clone(),
            entry.size_bytes,
            entry.modified,
            kind.requires_conversion(),
        )
    }

    /// Descriptor for the converted (and possibly trimmed) output of this file.
    /// Title and ordering stay tied to the source file.
    pub fn converted(&self, path: impl Into<PathBuf>, size_bytes: u64, duration_seconds: Option<f64>) -> Self {
        Self {
            path: path.into(),
            source_path: self.source_path.clone(),
            display_name: self.display_name.clone(),
            size_bytes,
            sort_key: self.sort_key.clone(),
            requires_conversion: false,
            modified: self.modified,
            duration_seconds,
        }
    }

    /// Attach a probed duration
    pub fn with_duration(mut self, duration_seconds: f64) -> Self {
        self.duration_seconds = Some(duration_seconds);
        self
    }

    /// Path of the bytes that will be uploaded
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the file found during the scan
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn sort_key(&self) -> &str {
        &self.sort_key
    }

    pub fn requires_conversion(&self) -> bool {
        self.requires_conversion
    }

    /// True once the descriptor points at converted output
    pub fn is_converted(&self) -> bool {
        self.path != self.source_path
    }

    pub fn modified(&self) -> Option<DateTime<Utc>> {
        self.modified
    }

    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration_seconds
    }

    /// Catalog ordering: case-insensitive file name, then full source path
    pub fn catalog_order(a: &Self, b: &Self) -> Ordering {
        a.sort_key
            .cmp(&b.sort_key)
            .then_with(|| a.source_path.cmp(&b.source_path))
    }
}

/// A chapter already stored on a slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteChapterDescriptor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    pub position: usize,
}

impl RemoteChapterDescriptor {
    pub fn with_size(title: impl Into<String>, size_bytes: u64, position: usize) -> Self {
        Self {
            title: title.into(),
            size_bytes: Some(size_bytes),
            duration_seconds: None,
            position,
        }
    }

    pub fn with_duration(title: impl Into<String>, duration_seconds: f64, position: usize) -> Self {
        Self {
            title: title.into(),
            size_bytes: None,
            duration_seconds: Some(duration_seconds),
            position,
        }
    }
}

/// A Creative Tonie: one target container of ordered chapters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSlot {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub household: Option<String>,
    #[serde(default)]
    pub chapters: Vec<RemoteChapterDescriptor>,
}

impl RemoteSlot {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            household: None,
            chapters: Vec::new(),
        }
    }

    pub fn with_chapters(mut self, chapters: Vec<RemoteChapterDescriptor>) -> Self {
        self.chapters = chapters;
        self
    }

    /// Chapters ordered by their remote position
    pub fn ordered_chapters(&self) -> Vec<&RemoteChapterDescriptor> {
        let mut chapters: Vec<&RemoteChapterDescriptor> = self.chapters.iter().collect();
        chapters.sort_by_key(|c| c.position);
        chapters
    }
}

/// A detected run of silence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SilenceInterval {
    pub start_seconds: f64,
    /// `None` means the silence runs to the end of the file
    pub end_seconds: Option<f64>,
}

impl SilenceInterval {
    pub fn closed(start_seconds: f64, end_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds: Some(end_seconds),
        }
    }

    pub fn open(start_seconds: f64) -> Self {
        Self {
            start_seconds,
            end_seconds: None,
        }
    }

    /// End of the interval, with open intervals ending at `duration`
    pub fn resolved_end(&self, duration: f64) -> f64 {
        self.end_seconds.unwrap_or(duration)
    }

    pub fn length(&self, duration: f64) -> f64 {
        self.resolved_end(duration) - self.start_seconds
    }
}

/// How the transcoder should cut a file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CutMethod {
    /// Lossless packet copy up to the cut point
    StreamCopy,
    /// Full re-encode at the given bitrate
    Reencode { bitrate: String },
}

/// Action handed to the transcoder for one converted file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrimAction {
    Passthrough,
    Cut { at_seconds: f64, method: CutMethod },
}

/// Outcome of silence-trim planning for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrimDecision {
    pub should_trim: bool,
    pub trim_at_seconds: Option<f64>,
    pub action: TrimAction,
}

impl TrimDecision {
    pub fn passthrough() -> Self {
        Self {
            should_trim: false,
            trim_at_seconds: None,
            action: TrimAction::Passthrough,
        }
    }

    pub fn cut(at_seconds: f64, method: CutMethod) -> Self {
        Self {
            should_trim: true,
            trim_at_seconds: Some(at_seconds),
            action: TrimAction::Cut { at_seconds, method },
        }
    }
}

/// Relative tolerance used when comparing size or duration signals.
///
/// `relative = 0.0` is an exact match; `0.01` accepts values within 1% of the larger one.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SizeTolerance {
    pub relative: f64,
}

impl SizeTolerance {
    pub fn exact() -> Self {
        Self { relative: 0.0 }
    }

    pub fn relative(relative: f64) -> Self {
        Self { relative }
    }

    pub fn matches_bytes(&self, a: u64, b: u64) -> bool {
        if a == b {
            return true;
        }
        self.matches_f64(a as f64, b as f64)
    }

    pub fn matches_f64(&self, a: f64, b: f64) -> bool {
        let diff = (a - b).abs();
        diff <= self.relative * a.abs().max(b.abs())
    }
}

/// What to do with one slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Skip,
    Update,
    ForceUpdate,
}

impl SyncAction {
    /// Whether the slot's chapters will be replaced
    pub fn replaces_content(&self) -> bool {
        !matches!(self, SyncAction::Skip)
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncAction::Skip => write!(f, "skip"),
            SyncAction::Update => write!(f, "update"),
            SyncAction::ForceUpdate => write!(f, "force-update"),
        }
    }
}

/// Why a decision was made. Rendered text is stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncReason {
    Forced,
    UpToDate,
    NothingToUpload,
    CountDiffers { local: usize, remote: usize },
    TitleMismatch { index: usize },
    SizeMismatch { index: usize },
    DurationMismatch { index: usize },
}

impl fmt::Display for SyncReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncReason::Forced => write!(f, "forced by caller"),
            SyncReason::UpToDate => write!(f, "up to date"),
            SyncReason::NothingToUpload => write!(f, "no local content to upload"),
            SyncReason::CountDiffers { local, remote } => {
                write!(f, "chapter count differs (local={}, remote={})", local, remote)
            }
            SyncReason::TitleMismatch { index } => write!(f, "title mismatch at index {}", index),
            SyncReason::SizeMismatch { index } => write!(f, "size mismatch at index {}", index),
            SyncReason::DurationMismatch { index } => {
                write!(f, "duration mismatch at index {}", index)
            }
        }
    }
}

/// Decision for one target slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlotSyncDecision {
    pub slot_id: String,
    pub slot_name: String,
    pub action: SyncAction,
    pub reason: SyncReason,
    /// Chapters that replace everything on the slot; empty when skipping
    pub planned_chapters: Vec<LocalFileDescriptor>,
}

impl SlotSyncDecision {
    pub fn needs_upload(&self) -> bool {
        self.action.replaces_content()
    }
}

/// Count of decisions per action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlanSummary {
    pub skip: usize,
    pub update: usize,
    pub force_update: usize,
}

impl PlanSummary {
    pub fn record(&mut self, action: SyncAction) {
        match action {
            SyncAction::Skip => self.skip += 1,
            SyncAction::Update => self.update += 1,
            SyncAction::ForceUpdate => self.force_update += 1,
        }
    }

    /// Slots whose chapters will be replaced
    pub fn pending(&self) -> usize {
        self.update + self.force_update
    }

    pub fn total(&self) -> usize {
        self.skip + self.pending()
    }
}

/// Ordered decisions for every selected slot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncPlan {
    pub decisions: Vec<SlotSyncDecision>,
    pub summary: PlanSummary,
}

impl SyncPlan {
    /// Decisions that require an upload, in plan order
    pub fn pending(&self) -> impl Iterator<Item = &SlotSyncDecision> {
        self.decisions.iter().filter(|d| d.needs_upload())
    }
}

/// Which slots a run targets. Parsing user input into this is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SlotSelection {
    /// The first slot found (non-interactive default)
    #[default]
    First,
    All,
    /// Only slots whose decision is not `Skip`
    NeedsUpdate,
    Ids(Vec<String>),
}
