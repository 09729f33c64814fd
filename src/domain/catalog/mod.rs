//! File catalog: turns a directory listing into ordered chapter candidates

use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Options for catalog construction
#[derive(Debug, Clone, Default)]
pub struct CatalogOptions {
    /// Include video sources (marked for conversion)
    pub convert_video: bool,
}

/// Collapse whitespace and cut to [`TITLE_MAX_LENGTH`] characters.
///
/// The cut always lands on a character boundary.
pub fn normalize_title(raw: &str) -> String {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(TITLE_MAX_LENGTH) {
        Some((byte_index, _)) => collapsed[..byte_index].trim_end().to_string(),
        None => collapsed,
    }
}

/// Build the ordered catalog for one scan.
///
/// Unrecognized entries are dropped. Video entries are kept when conversion is
/// enabled, or when there is no audio at all (conversion is then implied).
pub fn build_catalog(
    entries: &[RawEntry],
    options: &CatalogOptions,
) -> Result<Vec<LocalFileDescriptor>, DomainError> {
    let mut audio = Vec::new();
    let mut video = Vec::new();

    for entry in entries {
        match MediaKind::from_path(&entry.path) {
            Some(MediaKind::Audio) => audio.push(entry),
            Some(MediaKind::Video) => video.push(entry),
            None => debug!(path = %entry.path.display(), "Skipping unrecognized file"),
        }
    }

    let auto_convert = audio.is_empty() && !video.is_empty() && !options.convert_video;
    if auto_convert {
        info!(
            "No audio files found, but found {} video files; enabling conversion",
            video.len()
        );
    }
    let include_video = options.convert_video || auto_convert;

    let mut catalog: Vec<LocalFileDescriptor> = audio
        .iter()
        .map(|e| LocalFileDescriptor::from_entry(e, MediaKind::Audio))
        .collect();
    if include_video {
        catalog.extend(
            video
                .iter()
                .map(|e| LocalFileDescriptor::from_entry(e, MediaKind::Video)),
        );
    }

    if catalog.is_empty() && !options.convert_video {
        return Err(DomainError::EmptyInput(
            "no audio or video files in the listing".to_string(),
        ));
    }

    catalog.sort_by(LocalFileDescriptor::catalog_order);

    if let Some(long) = catalog
        .iter()
        .find(|f| f.display_name().chars().count() > TITLE_MAX_LENGTH)
    {
        return Err(DomainError::PolicyViolation(format!(
            "title longer than {} characters: {}",
            TITLE_MAX_LENGTH,
            long.display_name()
        )));
    }

    debug!(files = catalog.len(), "Catalog built");
    Ok(catalog)
}

#[cfg(test)]
mod tests;
