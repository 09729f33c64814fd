// JSON slot store - SlotPort over a manifest file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::info;

use crate::domain::errors::*;
use crate::domain::model::*;
use crate::ports::*;

/// On-disk manifest layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlotManifest {
    #[serde(default)]
    pub slots: Vec<RemoteSlot>,
}

/// Slot store backed by a JSON manifest.
///
/// `replace_chapters` records the uploaded files the way the remote service
/// would list them afterwards, so a second run over the same input is a no-op.
pub struct JsonSlotStore {
    manifest_path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonSlotStore {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    async fn read_manifest(&self) -> Result<SlotManifest, DomainError> {
        let content = tokio::fs::read_to_string(&self.manifest_path).await.map_err(|e| {
            DomainError::SlotStore(format!(
                "Failed to read slot manifest {}: {}",
                self.manifest_path.display(),
                e
            ))
        })?;
        serde_json::from_str(&content)
            .map_err(|e| DomainError::SlotStore(format!("Invalid slot manifest: {}", e)))
    }

    async fn write_manifest(&self, manifest: &SlotManifest) -> Result<(), DomainError> {
        let content = serde_json::to_string_pretty(manifest)
            .map_err(|e| DomainError::SlotStore(format!("Failed to encode slot manifest: {}", e)))?;
        tokio::fs::write(&self.manifest_path, content).await.map_err(|e| {
            DomainError::SlotStore(format!(
                "Failed to write slot manifest {}: {}",
                self.manifest_path.display(),
                e
            ))
        })
    }
}

/// Chapters as the remote lists them after an upload of `files`
pub fn chapters_from_upload(files: &[LocalFileDescriptor]) -> Vec<RemoteChapterDescriptor> {
    files
        .iter()
        .enumerate()
        .map(|(position, file)| RemoteChapterDescriptor {
            title: file.display_name().to_string(),
            size_bytes: Some(file.size_bytes()),
            duration_seconds: file.duration_seconds(),
            position,
        })
        .collect()
}

#[async_trait]
impl SlotPort for JsonSlotStore {
    async fn list_slots(&self) -> Result<Vec<RemoteSlot>, DomainError> {
        Ok(self.read_manifest().await?.slots)
    }

    async fn replace_chapters(
        &self,
        slot_id: &str,
        chapters: &[LocalFileDescriptor],
    ) -> Result<(), DomainError> {
        let _guard = self.write_lock.lock().await;

        let mut manifest = self.read_manifest().await?;
        let slot = manifest
            .slots
            .iter_mut()
            .find(|s| s.id == slot_id)
            .ok_or_else(|| DomainError::SlotStore(format!("Unknown slot: {}", slot_id)))?;

        info!("Clearing all chapters from '{}'", slot.name);
        slot.chapters = chapters_from_upload(chapters);
        info!("Stored {} chapters on '{}'", slot.chapters.len(), slot.name);

        self.write_manifest(&manifest).await
    }
}
