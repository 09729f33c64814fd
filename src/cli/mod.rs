//! CLI module for tonie-sync
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub mod args;
pub mod commands;

pub use args::{SilenceArgs, StatusArgs, SyncArgs, TuningArgs};

/// tonie-sync
///
/// Keeps Creative Tonie slots in sync with a local directory of audio files,
/// converting video sources and trimming their trailing silence on the way.
#[derive(Parser, Debug)]
#[command(name = "tonie-sync")]
#[command(about = "Sync a local audio directory to Creative Tonie slots")]
#[command(version)]
#[command(long_about = None)]
pub struct Cli {
    /// Logging level (defaults to the configured level)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "compact", global = true)]
    pub log_format: String,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "TONIE_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Slot manifest used as the slot store
    #[arg(long, global = true, env = "TONIE_SYNC_SLOTS", default_value = "slots.json")]
    pub slots: PathBuf,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload the local directory to the selected slots where needed
    Sync(args::SyncArgs),
    /// Show every slot and whether it matches the local directory
    Status(args::StatusArgs),
    /// Analyze trailing silence of one audio file
    Silence(args::SilenceArgs),
}
