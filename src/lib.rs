//! tonie-sync library
//!
//! Keeps Creative Tonie slots in sync with a local directory of audio files.
//! The domain layer decides per slot whether a full replace-upload is needed
//! and where converted audio should be cut to drop trailing silence; the
//! adapters drive ffmpeg, the filesystem and the slot store.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use domain::catalog::{build_catalog, normalize_title, CatalogOptions};
pub use domain::errors::DomainError;
pub use domain::model::{
    LocalFileDescriptor, RawEntry, RemoteChapterDescriptor, RemoteSlot, SilenceInterval,
    SizeTolerance, SlotSelection, SlotSyncDecision, SyncAction, SyncPlan, SyncReason,
    TrimDecision,
};
pub use domain::rules::diff_slot;
pub use domain::usecases::{analyze_and_plan_trim, build_sync_plan, SyncContext, SyncPlanBuilder};
pub use error::{SyncError, SyncResult};
