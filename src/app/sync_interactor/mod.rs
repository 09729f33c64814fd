// Sync interactor - Orchestrates scan, conversion, trimming and upload

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tempfile::{TempDir, TempPath};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::config::SyncConfig;
use crate::domain::catalog::{build_catalog, CatalogOptions};
use crate::domain::errors::*;
use crate::domain::model::*;
use crate::domain::usecases::{select_slots, SyncContext, SyncPlanBuilder};
use crate::error::{SyncError, SyncResult};
use crate::ports::*;

/// Options for one sync run
#[derive(Debug, Clone, Default)]
pub struct SyncRequest {
    pub input_dir: PathBuf,
    pub convert_video: bool,
    /// Write converted files next to their sources instead of a temp dir
    pub keep_converted: bool,
    pub no_trim: bool,
    pub dry_run: bool,
    pub force_update: bool,
    pub selection: SlotSelection,
}

/// Result of one slot upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadOutcome {
    pub slot_id: String,
    pub slot_name: String,
    pub chapters: usize,
    pub error: Option<String>,
}

impl UploadOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a sync run decided and did
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub files: Vec<LocalFileDescriptor>,
    pub plan: SyncPlan,
    pub uploads: Vec<UploadOutcome>,
    pub converted: usize,
    pub trimmed: usize,
    pub dry_run: bool,
}

impl SyncReport {
    /// Decisions carried out (or that would be, on a dry run)
    pub fn targeted(&self) -> usize {
        self.plan.summary.pending()
    }

    pub fn successful(&self) -> usize {
        self.uploads.iter().filter(|u| u.succeeded()).count()
    }

    pub fn completion_message(&self) -> String {
        if self.targeted() == 0 {
            "All selected slots are already up to date".to_string()
        } else if self.dry_run {
            format!(
                "DRY RUN COMPLETED: {}/{} slots would be updated",
                self.targeted(),
                self.plan.summary.total()
            )
        } else {
            format!(
                "UPDATES COMPLETED: {}/{} successful",
                self.successful(),
                self.targeted()
            )
        }
    }
}

/// One row of the status listing
#[derive(Debug, Clone, Serialize)]
pub struct SlotStatus {
    pub slot_id: String,
    pub slot_name: String,
    pub household: Option<String>,
    pub chapter_count: usize,
    pub action: SyncAction,
    pub reason: String,
}

/// Status of every known slot against the local directory
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub local_files: usize,
    pub slots: Vec<SlotStatus>,
}

/// Silence analysis of a single file
#[derive(Debug, Clone, Serialize)]
pub struct SilenceInspection {
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub audio_codec: Option<String>,
    pub trailing_silence: Option<SilenceInterval>,
    pub decision: TrimDecision,
}

/// Per-file preparation state shared by spawned tasks
#[derive(Clone)]
struct FilePreparer {
    probe_port: Arc<dyn ProbePort>,
    execute_port: Arc<dyn ExecutePort>,
    fs_port: Arc<dyn FsPort>,
    context: SyncContext,
    output_dir: PathBuf,
    trim: bool,
}

/// What preparing one file produced
struct PreparedFile {
    descriptor: LocalFileDescriptor,
    converted: bool,
    trimmed: bool,
}

impl FilePreparer {
    /// Convert a video source and trim its trailing silence
    #[instrument(skip(self, file), fields(source = %file.source_path().display()))]
    async fn prepare(&self, file: LocalFileDescriptor) -> Result<PreparedFile, DomainError> {
        if !file.requires_conversion() {
            return Ok(PreparedFile {
                descriptor: file,
                converted: false,
                trimmed: false,
            });
        }

        let converted_path = self
            .execute_port
            .convert_to_audio(file.path(), &self.output_dir, &self.context.audio_bitrate)
            .await?;
        info!("Converted to {}", converted_path.display());

        let mut duration = self.probe_duration(&converted_path).await;
        let mut trimmed = false;
        if self.trim {
            if let Some(total) = duration {
                if let Some(cut_at) = self.trim_trailing_silence(&converted_path, total).await {
                    duration = Some(cut_at);
                    trimmed = true;
                }
            }
        }

        let size = self.fs_port.file_size(&converted_path).await?;
        Ok(PreparedFile {
            descriptor: file.converted(converted_path, size, duration),
            converted: true,
            trimmed,
        })
    }

    async fn probe_duration(&self, path: &Path) -> Option<f64> {
        match self.probe_port.probe_duration(path).await {
            Ok(duration) => Some(duration),
            Err(e) => {
                warn!("Could not probe duration of {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Cut in place when the plan says so; returns the new duration.
    /// Any failure leaves the file untouched.
    async fn trim_trailing_silence(&self, path: &Path, duration: f64) -> Option<f64> {
        let transcript = match self
            .probe_port
            .detect_silence(
                path,
                self.context.silence_threshold_db,
                self.context.min_silence_duration,
            )
            .await
        {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!("Silence detection failed for {}: {}", path.display(), e);
                return None;
            }
        };

        let interval = self.context.silence_analyzer().analyze(&transcript, duration);
        let codec = self.probe_port.probe_audio_codec(path).await.ok().flatten();
        let decision = self.context.trim_planner().plan(
            interval.as_ref(),
            duration,
            self.context.min_silence_duration,
            codec.as_deref(),
        );

        let cut_at = match decision.trim_at_seconds {
            Some(at) if decision.should_trim => at,
            _ => {
                debug!("No trailing silence to trim in {}", path.display());
                return None;
            }
        };

        let trimmed_path = match trim_scratch_file(path) {
            Ok(scratch) => scratch,
            Err(e) => {
                warn!("Could not create scratch file for {}: {}", path.display(), e);
                return None;
            }
        };
        if let Err(e) = self.execute_port.cut_audio(path, &trimmed_path, &decision.action).await {
            warn!("Trimming {} failed, keeping untrimmed file: {}", path.display(), e);
            return None;
        }
        if let Err(e) = self.fs_port.move_file(&trimmed_path, path).await {
            warn!("Could not replace {} with trimmed copy: {}", path.display(), e);
            return None;
        }

        info!(
            "Trimmed {:.2}s of trailing silence from {}",
            duration - cut_at,
            path.display()
        );
        Some(cut_at)
    }
}

/// Hidden scratch file next to `path` for the cut to be written into.
/// Removed on drop if it is still there.
fn trim_scratch_file(path: &Path) -> std::io::Result<TempPath> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp3".to_string());
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    Ok(tempfile::Builder::new()
        .prefix(".tonie-trim-")
        .suffix(&format!(".{}", extension))
        .tempfile_in(dir)?
        .into_temp_path())
}

/// Interactor for the sync, status and silence use cases
pub struct SyncInteractor {
    probe_port: Arc<dyn ProbePort>,
    execute_port: Arc<dyn ExecutePort>,
    fs_port: Arc<dyn FsPort>,
    slot_port: Arc<dyn SlotPort>,
    config: SyncConfig,
}

impl SyncInteractor {
    /// Create new sync interactor with injected ports
    pub fn new(
        probe_port: Arc<dyn ProbePort>,
        execute_port: Arc<dyn ExecutePort>,
        fs_port: Arc<dyn FsPort>,
        slot_port: Arc<dyn SlotPort>,
        config: SyncConfig,
    ) -> Self {
        Self {
            probe_port,
            execute_port,
            fs_port,
            slot_port,
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run a full sync
    pub async fn execute(&self, request: SyncRequest) -> SyncResult<SyncReport> {
        info!(
            "Starting sync of {} (dry_run={}, force_update={})",
            request.input_dir.display(),
            request.dry_run,
            request.force_update
        );

        let catalog = self
            .scan(&request.input_dir, request.convert_video)
            .await?;
        let context = self.config.sync_context(request.force_update);

        // Holds the temp dir until the run is over
        let mut scratch: Option<TempDir> = None;
        let files = if catalog.iter().any(|f| f.requires_conversion()) {
            if !self.execute_port.is_available().await {
                return Err(DomainError::ToolUnavailable(
                    "ffmpeg is required to convert video files but was not found".to_string(),
                )
                .into());
            }
            let output_dir = if request.keep_converted {
                request.input_dir.clone()
            } else {
                let dir = TempDir::new()?;
                let path = dir.path().to_path_buf();
                scratch = Some(dir);
                path
            };
            self.prepare_files(catalog, &context, output_dir, !request.no_trim)
                .await?
        } else {
            catalog
                .into_iter()
                .map(|descriptor| PreparedFile {
                    descriptor,
                    converted: false,
                    trimmed: false,
                })
                .collect()
        };

        let converted = files.iter().filter(|f| f.converted).count();
        let trimmed = files.iter().filter(|f| f.trimmed).count();
        let mut files: Vec<LocalFileDescriptor> = files.into_iter().map(|f| f.descriptor).collect();
        files.sort_by(LocalFileDescriptor::catalog_order);
        info!("Prepared {} files ({} converted, {} trimmed)", files.len(), converted, trimmed);

        if files.is_empty() {
            return Err(DomainError::EmptyInput(format!(
                "nothing to upload from {}",
                request.input_dir.display()
            ))
            .into());
        }

        let all_slots = self.slot_port.list_slots().await?;
        if all_slots.is_empty() {
            return Err(DomainError::SlotStore("no slots available".to_string()).into());
        }
        let selected = select_slots(&all_slots, &request.selection)?;
        let mut plan = SyncPlanBuilder::new(context).build(&files, &selected);
        if request.selection == SlotSelection::NeedsUpdate {
            plan = only_pending(plan);
        }

        for decision in &plan.decisions {
            info!(
                "{}: {} ({})",
                decision.slot_name, decision.action, decision.reason
            );
        }

        let uploads = if request.dry_run {
            Vec::new()
        } else {
            self.upload(&plan).await
        };

        let report = SyncReport {
            files,
            plan,
            uploads,
            converted,
            trimmed,
            dry_run: request.dry_run,
        };
        info!("{}", report.completion_message());

        drop(scratch);
        Ok(report)
    }

    /// Compare every slot against the local directory without changing anything
    pub async fn status(&self, input_dir: &Path) -> SyncResult<StatusReport> {
        let files = self.scan(input_dir, false).await?;
        if files.iter().any(|f| f.requires_conversion()) {
            warn!("Video sources are compared before conversion; their slots will show as outdated");
        }

        let slots = self.slot_port.list_slots().await?;
        let plan = SyncPlanBuilder::new(self.config.sync_context(false)).build(&files, &slots);

        let rows = slots
            .iter()
            .zip(plan.decisions.iter())
            .map(|(slot, decision)| SlotStatus {
                slot_id: slot.id.clone(),
                slot_name: slot.name.clone(),
                household: slot.household.clone(),
                chapter_count: slot.chapters.len(),
                action: decision.action,
                reason: decision.reason.to_string(),
            })
            .collect();

        Ok(StatusReport {
            local_files: files.len(),
            slots: rows,
        })
    }

    /// Probe one file and plan its trim without touching it
    pub async fn inspect_silence(&self, file_path: &Path) -> SyncResult<SilenceInspection> {
        if !file_path.is_file() {
            return Err(SyncError::InputPathNotFound {
                path: file_path.display().to_string(),
            });
        }

        let context = self.config.sync_context(false);
        let duration = self.probe_port.probe_duration(file_path).await?;
        let codec = self.probe_port.probe_audio_codec(file_path).await?;
        let transcript = self
            .probe_port
            .detect_silence(
                file_path,
                context.silence_threshold_db,
                context.min_silence_duration,
            )
            .await?;

        let trailing_silence = context.silence_analyzer().try_analyze(&transcript, duration)?;
        let decision = context.trim_planner().plan(
            trailing_silence.as_ref(),
            duration,
            context.min_silence_duration,
            codec.as_deref(),
        );

        Ok(SilenceInspection {
            path: file_path.to_path_buf(),
            duration_seconds: duration,
            audio_codec: codec,
            trailing_silence,
            decision,
        })
    }

    async fn scan(&self, input_dir: &Path, convert_video: bool) -> SyncResult<Vec<LocalFileDescriptor>> {
        if !self.fs_port.directory_exists(input_dir).await? {
            return Err(SyncError::InputPathNotFound {
                path: input_dir.display().to_string(),
            });
        }

        let entries = self.fs_port.list_directory(input_dir).await?;
        let catalog = build_catalog(&entries, &CatalogOptions { convert_video })?;
        info!("Found {} files in {}", catalog.len(), input_dir.display());
        Ok(catalog)
    }

    /// Convert and trim with at most `jobs` files in flight.
    /// A file that fails to convert is logged and left out.
    async fn prepare_files(
        &self,
        catalog: Vec<LocalFileDescriptor>,
        context: &SyncContext,
        output_dir: PathBuf,
        trim: bool,
    ) -> Result<Vec<PreparedFile>, DomainError> {
        let preparer = FilePreparer {
            probe_port: Arc::clone(&self.probe_port),
            execute_port: Arc::clone(&self.execute_port),
            fs_port: Arc::clone(&self.fs_port),
            context: context.clone(),
            output_dir,
            trim,
        };
        let semaphore = Arc::new(Semaphore::new(self.config.jobs.max(1)));

        // Sources sharing a stem would race for the same output name, so
        // each stem is handled by a single task.
        let mut groups: BTreeMap<String, Vec<LocalFileDescriptor>> = BTreeMap::new();
        for file in catalog {
            let stem = file
                .source_path()
                .file_stem()
                .map(|s| s.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            groups.entry(stem).or_default().push(file);
        }

        let mut handles = Vec::with_capacity(groups.len());
        for (_, group) in groups {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| DomainError::ProcessingError(format!("Worker pool closed: {}", e)))?;
            let job = preparer.clone();
            handles.push(tokio::spawn(async move {
                let mut results = Vec::with_capacity(group.len());
                for file in group {
                    let source = file.source_path().to_path_buf();
                    match job.prepare(file).await {
                        Ok(prepared) => results.push(prepared),
                        Err(e) => error!("Failed to convert {}, skipping: {}", source.display(), e),
                    }
                }
                drop(permit);
                results
            }));
        }

        let mut prepared = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(results) => prepared.extend(results),
                Err(e) => {
                    error!(error = %e, "Preparation task panicked");
                    return Err(DomainError::ProcessingError(format!(
                        "File preparation task failed: {}",
                        e
                    )));
                }
            }
        }
        Ok(prepared)
    }

    /// Replace chapters on every pending slot; one failure does not stop the rest
    async fn upload(&self, plan: &SyncPlan) -> Vec<UploadOutcome> {
        let mut outcomes = Vec::new();
        for decision in plan.pending() {
            info!(
                "Uploading {} chapters to '{}'",
                decision.planned_chapters.len(),
                decision.slot_name
            );
            let error = match self
                .slot_port
                .replace_chapters(&decision.slot_id, &decision.planned_chapters)
                .await
            {
                Ok(()) => None,
                Err(e) => {
                    let err = SyncError::UploadError {
                        slot: decision.slot_name.clone(),
                        message: e.to_string(),
                    };
                    error!("{}", err);
                    Some(err.to_string())
                }
            };
            outcomes.push(UploadOutcome {
                slot_id: decision.slot_id.clone(),
                slot_name: decision.slot_name.clone(),
                chapters: decision.planned_chapters.len(),
                error,
            });
        }
        outcomes
    }
}

/// Keep only decisions that replace content
fn only_pending(plan: SyncPlan) -> SyncPlan {
    let decisions: Vec<SlotSyncDecision> = plan
        .decisions
        .into_iter()
        .filter(|d| d.needs_upload())
        .collect();
    let mut summary = PlanSummary::default();
    for decision in &decisions {
        summary.record(decision.action);
    }
    SyncPlan { decisions, summary }
}

#[cfg(test)]
mod tests;
