// Domain use cases - Composition of the pure planning steps

use tracing::info;

use crate::domain::errors::DomainError;
use crate::domain::model::*;
use crate::domain::rules::{ContentDiffEngine, TrimPlanner, DEFAULT_AUDIO_BITRATE};
use crate::domain::silence::SilenceAnalyzer;

/// Default `silencedetect` noise floor
pub const DEFAULT_SILENCE_THRESHOLD_DB: f64 = -50.0;

/// Default minimum length of trailing silence worth trimming
pub const DEFAULT_MIN_SILENCE_DURATION: f64 = 2.0;

/// Explicit context for one planning run
#[derive(Debug, Clone, PartialEq)]
pub struct SyncContext {
    pub force_update: bool,
    pub tolerance: SizeTolerance,
    pub silence_threshold_db: f64,
    pub min_silence_duration: f64,
    pub audio_bitrate: String,
}

impl Default for SyncContext {
    fn default() -> Self {
        Self {
            force_update: false,
            tolerance: SizeTolerance::exact(),
            silence_threshold_db: DEFAULT_SILENCE_THRESHOLD_DB,
            min_silence_duration: DEFAULT_MIN_SILENCE_DURATION,
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }
}

impl SyncContext {
    pub fn with_force_update(mut self, force_update: bool) -> Self {
        self.force_update = force_update;
        self
    }

    pub fn with_tolerance(mut self, tolerance: SizeTolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn silence_analyzer(&self) -> SilenceAnalyzer {
        SilenceAnalyzer::new(self.silence_threshold_db, self.min_silence_duration)
    }

    pub fn trim_planner(&self) -> TrimPlanner {
        TrimPlanner::new(self.audio_bitrate.clone())
    }
}

/// Analyze a silence transcript and plan the trim for one file
pub fn analyze_and_plan_trim(
    transcript: &str,
    duration_seconds: f64,
    threshold_db: f64,
    min_silence_duration: f64,
) -> TrimDecision {
    let interval = SilenceAnalyzer::new(threshold_db, min_silence_duration).analyze(transcript, duration_seconds);
    TrimPlanner::default().plan(interval.as_ref(), duration_seconds, min_silence_duration, None)
}

/// Builds the per-slot plan for a run
#[derive(Debug, Clone, Default)]
pub struct SyncPlanBuilder {
    context: SyncContext,
}

impl SyncPlanBuilder {
    pub fn new(context: SyncContext) -> Self {
        Self { context }
    }

    /// One decision per selected slot, in the order given
    pub fn build(&self, local: &[LocalFileDescriptor], selected_slots: &[RemoteSlot]) -> SyncPlan {
        let engine = ContentDiffEngine::new(self.context.tolerance);
        let mut summary = PlanSummary::default();

        let decisions: Vec<SlotSyncDecision> = selected_slots
            .iter()
            .map(|slot| {
                let decision = engine.diff_slot(slot, local, self.context.force_update);
                summary.record(decision.action);
                decision
            })
            .collect();

        info!(
            slots = decisions.len(),
            skip = summary.skip,
            update = summary.update,
            force_update = summary.force_update,
            "Sync plan built"
        );

        SyncPlan { decisions, summary }
    }
}

/// Plan with a default context apart from `force_update`
pub fn build_sync_plan(
    local: &[LocalFileDescriptor],
    selected_slots: &[RemoteSlot],
    force_update: bool,
) -> SyncPlan {
    SyncPlanBuilder::new(SyncContext::default().with_force_update(force_update)).build(local, selected_slots)
}

/// Resolve a selection against the known slots.
///
/// `NeedsUpdate` is resolved against a plan, so here it keeps every slot;
/// see [`SyncPlan::pending`].
pub fn select_slots(slots: &[RemoteSlot], selection: &SlotSelection) -> Result<Vec<RemoteSlot>, DomainError> {
    match selection {
        SlotSelection::First => Ok(slots.iter().take(1).cloned().collect()),
        SlotSelection::All | SlotSelection::NeedsUpdate => Ok(slots.to_vec()),
        SlotSelection::Ids(ids) => {
            let unknown: Vec<&String> = ids
                .iter()
                .filter(|id| !slots.iter().any(|s| &s.id == *id))
                .collect();
            if !unknown.is_empty() {
                return Err(DomainError::BadArgs(format!("Unknown slot ids: {:?}", unknown)));
            }
            // Keep listing order so repeated runs see the same plan order.
            Ok(slots.iter().filter(|s| ids.contains(&s.id)).cloned().collect())
        }
    }
}
