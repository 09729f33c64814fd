//! Trailing-silence detection from ffmpeg `silencedetect` transcripts
//!
//! The transcoder runs `-af silencedetect=noise=<dB>:d=<secs>` and prints lines such as
//!
//! ```text
//! [silencedetect @ 0x5581] silence_start: 118.003
//! [silencedetect @ 0x5581] silence_end: 120 | silence_duration: 1.997
//! ```
//!
//! This module turns that text into intervals and picks the one that reaches
//! the end of the file. Analysis is advisory: anything it cannot read is
//! treated as "no trailing silence".

use tracing::{debug, warn};

use crate::domain::errors::DomainError;
use crate::domain::model::SilenceInterval;

/// Tolerance used both for "reaches the end of file" and for merging adjacent intervals
pub const TAIL_EPSILON_SECONDS: f64 = 0.5;

/// Slack for comparing a silence length against its minimum; transcript
/// timestamps are decimal and do not subtract exactly
pub const LENGTH_EPSILON_SECONDS: f64 = 1e-6;

/// `length >= minimum`, up to [`LENGTH_EPSILON_SECONDS`]
pub fn meets_minimum(length: f64, minimum: f64) -> bool {
    length + LENGTH_EPSILON_SECONDS >= minimum
}

const START_MARKER: &str = "silence_start:";
const END_MARKER: &str = "silence_end:";

/// Parse every silence interval in a transcript, in order of appearance.
///
/// A start without a matching end yields an open interval. An end without a
/// pending start is ignored. Non-numeric timestamps are an error.
pub fn parse_transcript(transcript: &str) -> Result<Vec<SilenceInterval>, DomainError> {
    let mut intervals = Vec::new();
    let mut pending_start: Option<f64> = None;

    for (line_no, line) in transcript.lines().enumerate() {
        if let Some(value) = marker_value(line, START_MARKER) {
            let start = parse_seconds(value, line_no)?;
            if let Some(previous) = pending_start.replace(start) {
                // Two starts in a row: the first never closed before the second opened.
                intervals.push(SilenceInterval::closed(previous, start));
            }
        } else if let Some(value) = marker_value(line, END_MARKER) {
            let end = parse_seconds(value, line_no)?;
            match pending_start.take() {
                Some(start) => intervals.push(SilenceInterval::closed(start, end)),
                None => debug!(line = line_no + 1, "silence_end without silence_start"),
            }
        }
    }

    if let Some(start) = pending_start {
        intervals.push(SilenceInterval::open(start));
    }

    Ok(intervals)
}

/// Text following `marker` up to the next `|` separator
fn marker_value<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let rest = &line[line.find(marker)? + marker.len()..];
    Some(rest.split('|').next().unwrap_or(rest).trim())
}

fn parse_seconds(value: &str, line_no: usize) -> Result<f64, DomainError> {
    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() => Ok(seconds),
        _ => Err(DomainError::ParseWarning(format!(
            "line {}: invalid timestamp '{}'",
            line_no + 1,
            value
        ))),
    }
}

/// Locates the trailing silence interval of a file
#[derive(Debug, Clone)]
pub struct SilenceAnalyzer {
    threshold_db: f64,
    min_silence_duration: f64,
    epsilon: f64,
}

impl SilenceAnalyzer {
    pub fn new(threshold_db: f64, min_silence_duration: f64) -> Self {
        Self {
            threshold_db,
            min_silence_duration,
            epsilon: TAIL_EPSILON_SECONDS,
        }
    }

    /// Trailing silence of a file, or `None`.
    ///
    /// Intervals shorter than the minimum silence duration are ignored once
    /// contiguous ones have been merged.
    ///
    /// Fails open: a malformed transcript or a bad duration is logged and
    /// reported as "no trailing silence".
    pub fn analyze(&self, transcript: &str, duration_seconds: f64) -> Option<SilenceInterval> {
        match self.try_analyze(transcript, duration_seconds) {
            Ok(interval) => interval,
            Err(e) => {
                warn!(threshold_db = self.threshold_db, "Ignoring silence analysis: {}", e);
                None
            }
        }
    }

    /// Strict variant of [`SilenceAnalyzer::analyze`]
    pub fn try_analyze(
        &self,
        transcript: &str,
        duration_seconds: f64,
    ) -> Result<Option<SilenceInterval>, DomainError> {
        if !duration_seconds.is_finite() || duration_seconds < 0.0 {
            return Err(DomainError::ParseWarning(format!(
                "invalid duration {}",
                duration_seconds
            )));
        }

        let intervals = self.merge_contiguous(parse_transcript(transcript)?, duration_seconds);
        let trailing = intervals
            .into_iter()
            .filter(|i| meets_minimum(i.length(duration_seconds), self.min_silence_duration))
            .filter(|i| (duration_seconds - i.resolved_end(duration_seconds)).abs() <= self.epsilon)
            .last();

        debug!(
            duration = duration_seconds,
            min_silence = self.min_silence_duration,
            trailing = ?trailing,
            "Silence analysis complete"
        );
        Ok(trailing)
    }

    /// Sort by start and merge intervals separated by less than epsilon.
    /// Degenerate intervals (end before start) are dropped.
    fn merge_contiguous(&self, mut intervals: Vec<SilenceInterval>, duration: f64) -> Vec<SilenceInterval> {
        intervals.retain(|i| i.resolved_end(duration) >= i.start_seconds);
        intervals.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        let mut merged: Vec<SilenceInterval> = Vec::with_capacity(intervals.len());
        for interval in intervals {
            match merged.last_mut() {
                Some(last) if interval.start_seconds - last.resolved_end(duration) < self.epsilon => {
                    let last_end = last.resolved_end(duration);
                    let next_end = interval.resolved_end(duration);
                    // An open interval absorbs whatever it merges with.
                    last.end_seconds = match (last.end_seconds, interval.end_seconds) {
                        (None, _) | (_, None) => None,
                        _ => Some(last_end.max(next_end)),
                    };
                }
                _ => merged.push(interval),
            }
        }
        merged
    }
}
