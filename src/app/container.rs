use std::path::Path;
use std::sync::Arc;

use crate::adapters::{FFmpegAdapter, FFprobeAdapter, FsLocalAdapter, JsonSlotStore};
use crate::app::sync_interactor::SyncInteractor;
use crate::config::SyncConfig;
use crate::domain::errors::DomainError;
use crate::ports::{ExecutePort, FsPort, ProbePort, SlotPort};

pub trait AppContainer: Send + Sync {
    fn sync_interactor(&self) -> Arc<SyncInteractor>;
}

/// Wires the ffmpeg, local-disk and JSON manifest adapters
pub struct DefaultAppContainer {
    sync_interactor: Arc<SyncInteractor>,
}

impl DefaultAppContainer {
    pub fn new(config: SyncConfig, slot_manifest: &Path) -> Result<Self, DomainError> {
        config.validate()?;

        let probe_port = Arc::new(FFprobeAdapter::new(
            config.ffprobe_path.clone(),
            config.ffmpeg_path.clone(),
        ));
        let execute_port = Arc::new(FFmpegAdapter::new(config.ffmpeg_path.clone()));
        let fs_port = Arc::new(FsLocalAdapter::new());
        let slot_port = Arc::new(JsonSlotStore::new(slot_manifest));

        let sync_interactor = Arc::new(SyncInteractor::new(
            probe_port as Arc<dyn ProbePort>,
            execute_port as Arc<dyn ExecutePort>,
            fs_port as Arc<dyn FsPort>,
            slot_port as Arc<dyn SlotPort>,
            config,
        ));

        Ok(Self { sync_interactor })
    }
}

impl AppContainer for DefaultAppContainer {
    fn sync_interactor(&self) -> Arc<SyncInteractor> {
        Arc::clone(&self.sync_interactor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_rejects_invalid_config() {
        let mut config = SyncConfig::default();
        config.min_silence_duration = 0.0;
        assert!(DefaultAppContainer::new(config, Path::new("slots.json")).is_err());
    }

    #[test]
    fn test_container_builds_interactor() {
        let mut config = SyncConfig::default();
        config.jobs = 3;
        let container = DefaultAppContainer::new(config, Path::new("slots.json")).unwrap();
        assert_eq!(container.sync_interactor().config().jobs, 3);
    }
}
