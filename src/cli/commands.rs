//! Command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::adapters::TomlConfigAdapter;
use crate::app::sync_interactor::{SilenceInspection, StatusReport, SyncRequest};
use crate::app::{AppContainer, DefaultAppContainer, SyncReport};
use crate::cli::args::{SilenceArgs, StatusArgs, SyncArgs};
use crate::config::SyncConfig;
use crate::utils::{format_file_size, format_seconds};

/// Defaults, then the config file, then `TONIE_SYNC_*` variables.
/// Also returns how many variables were applied.
pub fn load_config(config_path: Option<&Path>) -> Result<(SyncConfig, usize)> {
    let mut config = TomlConfigAdapter::resolve(config_path).context("Failed to load configuration")?;
    let overrides = config
        .apply_env(|key| std::env::var(key).ok())
        .context("Invalid environment configuration")?;
    Ok((config, overrides))
}

/// Execute the sync command
pub async fn sync(args: SyncArgs, mut config: SyncConfig, slot_manifest: PathBuf) -> Result<()> {
    info!("Starting sync operation");
    info!("Input: {}", args.input.display());
    info!("Slots: {}", slot_manifest.display());

    args.tuning.apply(&mut config);
    let container = DefaultAppContainer::new(config, &slot_manifest)
        .context("Invalid configuration")?;

    let request = SyncRequest {
        input_dir: args.input.clone(),
        convert_video: args.convert_video,
        keep_converted: args.keep_converted,
        no_trim: args.no_trim,
        dry_run: args.dry_run,
        force_update: args.force_update,
        selection: args.selection(),
    };

    let report = container
        .sync_interactor()
        .execute(request)
        .await
        .context("Sync failed")?;

    display_sync_report(&report);

    let failed = report.uploads.iter().filter(|u| !u.succeeded()).count();
    if failed > 0 {
        error!("{} slot update(s) failed", failed);
        return Err(anyhow::anyhow!(
            "{} of {} slot updates failed",
            failed,
            report.uploads.len()
        ));
    }

    info!("Sync operation completed successfully");
    Ok(())
}

/// Execute the status command
pub async fn status(args: StatusArgs, mut config: SyncConfig, slot_manifest: PathBuf) -> Result<()> {
    info!("Starting status operation");

    if let Some(tolerance) = args.size_tolerance {
        config.size_tolerance = tolerance;
    }
    let container = DefaultAppContainer::new(config, &slot_manifest)
        .context("Invalid configuration")?;

    let report = container
        .sync_interactor()
        .status(&args.input)
        .await
        .context("Failed to read slot status")?;

    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .context("Failed to serialize status to JSON")?;
        println!("{}", json);
    } else {
        display_status(&report);
    }

    info!("Status operation completed successfully");
    Ok(())
}

/// Execute the silence command
pub async fn silence(args: SilenceArgs, mut config: SyncConfig, slot_manifest: PathBuf) -> Result<()> {
    info!("Starting silence analysis");
    info!("Input: {}", args.input.display());

    args.tuning.apply(&mut config);
    let container = DefaultAppContainer::new(config, &slot_manifest)
        .context("Invalid configuration")?;

    let inspection = container
        .sync_interactor()
        .inspect_silence(&args.input)
        .await
        .context("Failed to analyze silence")?;

    if args.json {
        let json = serde_json::to_string_pretty(&inspection)
            .context("Failed to serialize silence analysis to JSON")?;
        println!("{}", json);
    } else {
        display_silence(&inspection);
    }

    Ok(())
}

/// Display the plan and the outcome of a sync run
fn display_sync_report(report: &SyncReport) {
    println!("Local Files ({})", report.files.len());
    println!("===============");
    for (i, file) in report.files.iter().enumerate() {
        let duration = file
            .duration_seconds()
            .map(|d| format!(", {}", format_seconds(d)))
            .unwrap_or_default();
        println!(
            "  {:>2}. {} ({}{})",
            i + 1,
            file.display_name(),
            format_file_size(file.size_bytes()),
            duration
        );
    }
    if report.converted > 0 {
        println!(
            "  {} converted from video, {} trimmed",
            report.converted, report.trimmed
        );
    }
    println!();

    println!("Slot Plan");
    println!("=========");
    for decision in &report.plan.decisions {
        println!(
            "  {} [{}]: {} ({})",
            decision.slot_name, decision.slot_id, decision.action, decision.reason
        );
    }
    println!();

    for upload in &report.uploads {
        match &upload.error {
            None => println!(
                "  ✓ {}: {} chapters uploaded",
                upload.slot_name, upload.chapters
            ),
            Some(message) => println!("  ✗ {}: {}", upload.slot_name, message),
        }
    }

    println!("{}", report.completion_message());
}

/// Display slot status in human-readable format
fn display_status(report: &StatusReport) {
    println!("Slot Status");
    println!("===========");
    println!("Local files: {}", report.local_files);
    println!();

    for slot in &report.slots {
        let household = slot
            .household
            .as_deref()
            .map(|h| format!(" ({})", h))
            .unwrap_or_default();
        let marker = if slot.action.replaces_content() { "✗" } else { "✓" };
        println!(
            "  {} {}{} [{}]: {} chapters, {}",
            marker, slot.slot_name, household, slot.slot_id, slot.chapter_count, slot.reason
        );
    }
}

/// Display silence analysis in human-readable format
fn display_silence(inspection: &SilenceInspection) {
    println!("Silence Analysis");
    println!("================");
    println!("File: {}", inspection.path.display());
    println!("Duration: {}", format_seconds(inspection.duration_seconds));
    println!(
        "Audio Codec: {}",
        inspection.audio_codec.as_deref().unwrap_or("unknown")
    );

    match &inspection.trailing_silence {
        Some(interval) => println!(
            "Trailing Silence: {} - {} ({:.2}s)",
            format_seconds(interval.start_seconds),
            format_seconds(interval.resolved_end(inspection.duration_seconds)),
            interval.length(inspection.duration_seconds)
        ),
        None => println!("Trailing Silence: none"),
    }

    match inspection.decision.trim_at_seconds {
        Some(at) if inspection.decision.should_trim => {
            println!("Decision: trim at {}", format_seconds(at))
        }
        _ => println!("Decision: keep whole file"),
    }
}
