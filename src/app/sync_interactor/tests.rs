// Unit tests for the sync interactor

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use tempfile::TempDir;

    use crate::adapters::json_slots::chapters_from_upload;
    use crate::adapters::FsLocalAdapter;
    use crate::app::sync_interactor::*;
    use crate::config::SyncConfig;
    use crate::domain::errors::DomainError;
    use crate::domain::model::*;
    use crate::error::SyncError;
    use crate::ports::*;

    /// Probe answering every file with the same duration and transcript
    struct FixedProbe {
        duration: f64,
        transcript: String,
        codec: Option<String>,
    }

    #[async_trait]
    impl ProbePort for FixedProbe {
        async fn probe_duration(&self, _file_path: &Path) -> Result<f64, DomainError> {
            Ok(self.duration)
        }

        async fn probe_audio_codec(&self, _file_path: &Path) -> Result<Option<String>, DomainError> {
            Ok(self.codec.clone())
        }

        async fn detect_silence(
            &self,
            _file_path: &Path,
            _threshold_db: f64,
            _min_silence_duration: f64,
        ) -> Result<String, DomainError> {
            Ok(self.transcript.clone())
        }
    }

    /// Transcoder writing fixed-size files instead of running ffmpeg
    struct FakeTranscoder {
        available: bool,
        converted_size: usize,
        cut_size: usize,
        fail_stem: Option<&'static str>,
        cuts: Mutex<Vec<TrimAction>>,
    }

    impl FakeTranscoder {
        fn new(available: bool) -> Self {
            Self {
                available,
                converted_size: 1000,
                cut_size: 900,
                fail_stem: None,
                cuts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ExecutePort for FakeTranscoder {
        async fn is_available(&self) -> bool {
            self.available
        }

        async fn convert_to_audio(
            &self,
            input: &Path,
            output_dir: &Path,
            _audio_bitrate: &str,
        ) -> Result<PathBuf, DomainError> {
            let stem = input.file_stem().unwrap().to_string_lossy().to_string();
            if self.fail_stem == Some(stem.as_str()) {
                return Err(DomainError::ProcessingError("ffmpeg exited with 1".to_string()));
            }
            let output = crate::adapters::exec_ffmpeg::unique_audio_path(output_dir, &stem);
            std::fs::write(&output, vec![0u8; self.converted_size]).unwrap();
            Ok(output)
        }

        async fn cut_audio(&self, _input: &Path, output: &Path, action: &TrimAction) -> Result<(), DomainError> {
            self.cuts.lock().unwrap().push(action.clone());
            std::fs::write(output, vec![0u8; self.cut_size]).unwrap();
            Ok(())
        }
    }

    /// In-memory slot service
    struct MemorySlots {
        slots: Mutex<Vec<RemoteSlot>>,
        fail_on: Option<String>,
        uploads: Mutex<Vec<String>>,
    }

    impl MemorySlots {
        fn new(slots: Vec<RemoteSlot>) -> Self {
            Self {
                slots: Mutex::new(slots),
                fail_on: None,
                uploads: Mutex::new(Vec::new()),
            }
        }

        fn failing_on(mut self, slot_id: &str) -> Self {
            self.fail_on = Some(slot_id.to_string());
            self
        }

        fn upload_count(&self) -> usize {
            self.uploads.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl SlotPort for MemorySlots {
        async fn list_slots(&self) -> Result<Vec<RemoteSlot>, DomainError> {
            Ok(self.slots.lock().unwrap().clone())
        }

        async fn replace_chapters(
            &self,
            slot_id: &str,
            chapters: &[LocalFileDescriptor],
        ) -> Result<(), DomainError> {
            if self.fail_on.as_deref() == Some(slot_id) {
                return Err(DomainError::SlotStore("connection reset".to_string()));
            }
            self.uploads.lock().unwrap().push(slot_id.to_string());
            let mut slots = self.slots.lock().unwrap();
            if let Some(slot) = slots.iter_mut().find(|s| s.id == slot_id) {
                slot.chapters = chapters_from_upload(chapters);
            }
            Ok(())
        }
    }

    fn silent_tail_probe() -> FixedProbe {
        FixedProbe {
            duration: 120.0,
            transcript: "[silencedetect @ 0x1] silence_start: 118\n".to_string(),
            codec: Some("mp3".to_string()),
        }
    }

    fn audio_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("01 intro.mp3"), vec![1u8; 10]).unwrap();
        std::fs::write(dir.path().join("02 story.mp3"), vec![1u8; 20]).unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();
        dir
    }

    fn interactor(
        transcoder: Arc<FakeTranscoder>,
        slots: Arc<MemorySlots>,
    ) -> SyncInteractor {
        let mut config = SyncConfig::default();
        config.jobs = 2;
        SyncInteractor::new(
            Arc::new(silent_tail_probe()),
            transcoder,
            Arc::new(FsLocalAdapter::new()),
            slots,
            config,
        )
    }

    fn request(dir: &TempDir) -> SyncRequest {
        SyncRequest {
            input_dir: dir.path().to_path_buf(),
            ..SyncRequest::default()
        }
    }

    #[tokio::test]
    async fn test_sync_uploads_to_outdated_slot() {
        let dir = audio_dir();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), Arc::clone(&slots));

        let report = interactor.execute(request(&dir)).await.unwrap();

        assert_eq!(report.files.len(), 2);
        assert_eq!(report.plan.decisions[0].action, SyncAction::Update);
        assert_eq!(report.successful(), 1);
        assert_eq!(report.completion_message(), "UPDATES COMPLETED: 1/1 successful");

        let stored = slots.list_slots().await.unwrap();
        let titles: Vec<&str> = stored[0].chapters.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["01 intro", "02 story"]);
    }

    #[tokio::test]
    async fn test_second_run_is_up_to_date() {
        let dir = audio_dir();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), Arc::clone(&slots));

        interactor.execute(request(&dir)).await.unwrap();
        let report = interactor.execute(request(&dir)).await.unwrap();

        assert_eq!(report.plan.decisions[0].reason, SyncReason::UpToDate);
        assert!(report.uploads.is_empty());
        assert_eq!(report.completion_message(), "All selected slots are already up to date");
        assert_eq!(slots.upload_count(), 1);
    }

    #[tokio::test]
    async fn test_dry_run_does_not_upload() {
        let dir = audio_dir();
        let slots = Arc::new(MemorySlots::new(vec![
            RemoteSlot::new("t1", "Lion"),
            RemoteSlot::new("t2", "Owl"),
        ]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), Arc::clone(&slots));

        let mut req = request(&dir);
        req.dry_run = true;
        req.selection = SlotSelection::All;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(slots.upload_count(), 0);
        assert_eq!(
            report.completion_message(),
            "DRY RUN COMPLETED: 2/2 slots would be updated"
        );
    }

    #[tokio::test]
    async fn test_failed_upload_does_not_stop_run() {
        let dir = audio_dir();
        let slots = Arc::new(
            MemorySlots::new(vec![RemoteSlot::new("t1", "Lion"), RemoteSlot::new("t2", "Owl")])
                .failing_on("t1"),
        );
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), Arc::clone(&slots));

        let mut req = request(&dir);
        req.selection = SlotSelection::All;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.uploads.len(), 2);
        assert!(!report.uploads[0].succeeded());
        assert!(report.uploads[0].error.as_deref().unwrap().contains("Lion"));
        assert!(report.uploads[1].succeeded());
        assert_eq!(report.completion_message(), "UPDATES COMPLETED: 1/2 successful");
    }

    #[tokio::test]
    async fn test_outdated_selection_drops_skips() {
        let dir = audio_dir();
        let current = RemoteSlot::new("t1", "Lion").with_chapters(vec![
            RemoteChapterDescriptor::with_size("01 intro", 10, 0),
            RemoteChapterDescriptor::with_size("02 story", 20, 1),
        ]);
        let slots = Arc::new(MemorySlots::new(vec![current, RemoteSlot::new("t2", "Owl")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), Arc::clone(&slots));

        let mut req = request(&dir);
        req.selection = SlotSelection::NeedsUpdate;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.plan.decisions.len(), 1);
        assert_eq!(report.plan.decisions[0].slot_id, "t2");
        assert_eq!(report.plan.summary.skip, 0);
    }

    #[tokio::test]
    async fn test_video_conversion_requires_ffmpeg() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("episode.mp4"), vec![1u8; 50]).unwrap();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), slots);

        let err = interactor.execute(request(&dir)).await.unwrap_err();
        assert!(matches!(err, SyncError::Domain(DomainError::ToolUnavailable(_))));
    }

    #[tokio::test]
    async fn test_converted_video_is_trimmed() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("episode.mp4"), vec![1u8; 50]).unwrap();
        let transcoder = Arc::new(FakeTranscoder::new(true));
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::clone(&transcoder), slots);

        let mut req = request(&dir);
        req.keep_converted = true;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.trimmed, 1);
        let file = &report.files[0];
        assert_eq!(file.display_name(), "episode");
        assert_eq!(file.size_bytes(), 900);
        assert_eq!(file.duration_seconds(), Some(118.0));
        assert_eq!(file.path(), dir.path().join("episode.mp3"));
        assert!(!dir.path().join("episode_trimmed.mp3").exists());

        let cuts = transcoder.cuts.lock().unwrap();
        assert_eq!(
            cuts[0],
            TrimAction::Cut {
                at_seconds: 118.0,
                method: CutMethod::StreamCopy
            }
        );
    }

    #[tokio::test]
    async fn test_trim_never_touches_existing_user_files() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("story.mkv"), vec![1u8; 50]).unwrap();
        std::fs::write(dir.path().join("story_trimmed.mp3"), vec![7u8; 77]).unwrap();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(true)), Arc::clone(&slots));

        let mut req = request(&dir);
        req.convert_video = true;
        req.keep_converted = true;
        req.dry_run = true;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.trimmed, 1);
        assert_eq!(std::fs::read(dir.path().join("story_trimmed.mp3")).unwrap(), vec![7u8; 77]);
        for file in &report.plan.decisions[0].planned_chapters {
            assert!(file.path().exists(), "{} missing", file.path().display());
        }
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .filter(|name| name.starts_with('.'))
            .collect();
        assert!(leftovers.is_empty(), "scratch files left: {:?}", leftovers);
        assert_eq!(slots.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_no_trim_leaves_converted_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("episode.mkv"), vec![1u8; 50]).unwrap();
        let transcoder = Arc::new(FakeTranscoder::new(true));
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::clone(&transcoder), slots);

        let mut req = request(&dir);
        req.no_trim = true;
        req.dry_run = true;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.trimmed, 0);
        assert_eq!(report.files[0].size_bytes(), 1000);
        assert!(transcoder.cuts.lock().unwrap().is_empty());
        // Converted into the temp dir, not next to the source
        assert!(!dir.path().join("episode.mp3").exists());
    }

    #[tokio::test]
    async fn test_same_stem_sources_get_distinct_outputs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("episode.mkv"), vec![1u8; 50]).unwrap();
        std::fs::write(dir.path().join("episode.mp4"), vec![1u8; 50]).unwrap();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(true)), slots);

        let mut req = request(&dir);
        req.keep_converted = true;
        req.no_trim = true;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.files.len(), 2);
        assert_ne!(report.files[0].path(), report.files[1].path());
        assert!(report.files[0].source_path().ends_with("episode.mkv"));
    }

    #[tokio::test]
    async fn test_failed_conversion_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.mp4"), vec![1u8; 50]).unwrap();
        std::fs::write(dir.path().join("episode.mp4"), vec![1u8; 50]).unwrap();
        let mut transcoder = FakeTranscoder::new(true);
        transcoder.fail_stem = Some("broken");
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(transcoder), slots);

        let mut req = request(&dir);
        req.no_trim = true;
        let report = interactor.execute(req).await.unwrap();

        assert_eq!(report.files.len(), 1);
        assert_eq!(report.files[0].display_name(), "episode");
        assert_eq!(report.plan.decisions[0].planned_chapters.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_dir() {
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), slots);

        let req = SyncRequest {
            input_dir: PathBuf::from("/no/such/dir"),
            ..SyncRequest::default()
        };
        let err = interactor.execute(req).await.unwrap_err();
        assert!(matches!(err, SyncError::InputPathNotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_directory_uploads_nothing() {
        let dir = TempDir::new().unwrap();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(true)), Arc::clone(&slots));

        let mut req = request(&dir);
        req.convert_video = true;
        req.force_update = true;
        let err = interactor.execute(req).await.unwrap_err();

        assert!(matches!(err, SyncError::Domain(DomainError::EmptyInput(_))));
        assert_eq!(slots.upload_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_slot_id_is_rejected() {
        let dir = audio_dir();
        let slots = Arc::new(MemorySlots::new(vec![RemoteSlot::new("t1", "Lion")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), slots);

        let mut req = request(&dir);
        req.selection = SlotSelection::Ids(vec!["nope".to_string()]);
        let err = interactor.execute(req).await.unwrap_err();
        assert!(matches!(err, SyncError::Domain(DomainError::BadArgs(_))));
    }

    #[tokio::test]
    async fn test_status_lists_every_slot() {
        let dir = audio_dir();
        let current = RemoteSlot::new("t1", "Lion").with_chapters(vec![
            RemoteChapterDescriptor::with_size("01 intro", 10, 0),
            RemoteChapterDescriptor::with_size("02 story", 20, 1),
        ]);
        let slots = Arc::new(MemorySlots::new(vec![current, RemoteSlot::new("t2", "Owl")]));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), slots);

        let status = interactor.status(dir.path()).await.unwrap();

        assert_eq!(status.local_files, 2);
        assert_eq!(status.slots.len(), 2);
        assert_eq!(status.slots[0].action, SyncAction::Skip);
        assert_eq!(status.slots[0].chapter_count, 2);
        assert_eq!(status.slots[1].action, SyncAction::Update);
        assert_eq!(status.slots[1].reason, "chapter count differs (local=2, remote=0)");
    }

    #[tokio::test]
    async fn test_inspect_silence_plans_cut() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("track.mp3");
        std::fs::write(&file, b"data").unwrap();
        let slots = Arc::new(MemorySlots::new(Vec::new()));
        let interactor = interactor(Arc::new(FakeTranscoder::new(false)), slots);

        let inspection = interactor.inspect_silence(&file).await.unwrap();

        assert_eq!(inspection.duration_seconds, 120.0);
        assert_eq!(inspection.trailing_silence, Some(SilenceInterval::open(118.0)));
        assert!(inspection.decision.should_trim);
        assert_eq!(inspection.decision.trim_at_seconds, Some(118.0));
    }
}
