// Unit tests for the file catalog

#[cfg(test)]
mod tests {
    use crate::domain::catalog::*;
    use crate::domain::errors::DomainError;
    use crate::domain::model::*;

    fn entries(names: &[&str]) -> Vec<RawEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| RawEntry::new(format!("/in/{}", n), (i as u64 + 1) * 1000))
            .collect()
    }

    fn names(catalog: &[LocalFileDescriptor]) -> Vec<String> {
        catalog.iter().map(|f| f.display_name().to_string()).collect()
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let catalog = build_catalog(
            &entries(&["b-song.mp3", "A-song.wav", "c-song.ogg"]),
            &CatalogOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&catalog), vec!["A-song", "b-song", "c-song"]);
    }

    #[test]
    fn test_same_name_different_case_breaks_tie_by_path() {
        let catalog = build_catalog(
            &entries(&["track.mp3", "TRACK.mp3"]),
            &CatalogOptions::default(),
        )
        .unwrap();
        let paths: Vec<String> = catalog
            .iter()
            .map(|f| f.path().to_string_lossy().to_string())
            .collect();
        assert_eq!(paths, vec!["/in/TRACK.mp3", "/in/track.mp3"]);
    }

    #[test]
    fn test_repeated_builds_are_identical() {
        let input = entries(&["02.mp3", "01.mp3", "10.mp3", "readme.txt"]);
        let first = build_catalog(&input, &CatalogOptions::default()).unwrap();
        let second = build_catalog(&input, &CatalogOptions::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unrecognized_entries_dropped() {
        let catalog = build_catalog(
            &entries(&["cover.jpg", "song.mp3", "notes.txt"]),
            &CatalogOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&catalog), vec!["song"]);
    }

    #[test]
    fn test_video_excluded_without_conversion_when_audio_present() {
        let catalog = build_catalog(
            &entries(&["song.mp3", "movie.mkv"]),
            &CatalogOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&catalog), vec!["song"]);
    }

    #[test]
    fn test_video_included_and_marked_when_converting() {
        let catalog = build_catalog(
            &entries(&["song.mp3", "movie.mkv"]),
            &CatalogOptions { convert_video: true },
        )
        .unwrap();
        assert_eq!(catalog.len(), 2);
        let movie = catalog.iter().find(|f| f.display_name() == "movie").unwrap();
        assert!(movie.requires_conversion());
        let song = catalog.iter().find(|f| f.display_name() == "song").unwrap();
        assert!(!song.requires_conversion());
    }

    #[test]
    fn test_video_only_directory_enables_conversion() {
        let catalog = build_catalog(
            &entries(&["b.mp4", "a.avi"]),
            &CatalogOptions::default(),
        )
        .unwrap();
        assert_eq!(names(&catalog), vec!["a", "b"]);
        assert!(catalog.iter().all(|f| f.requires_conversion()));
    }

    #[test]
    fn test_empty_without_conversion_is_input_error() {
        let err = build_catalog(&entries(&["notes.txt"]), &CatalogOptions::default()).unwrap_err();
        assert!(matches!(err, DomainError::EmptyInput(_)));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_empty_with_conversion_is_ok() {
        let catalog = build_catalog(&[], &CatalogOptions { convert_video: true }).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_long_title_truncated() {
        let long = "x".repeat(150);
        assert_eq!(normalize_title(&long).chars().count(), 100);
    }

    #[test]
    fn test_short_title_unchanged() {
        let exact = "y".repeat(100);
        assert_eq!(normalize_title(&exact), exact);
        assert_eq!(normalize_title("01-intro"), "01-intro");
    }

    #[test]
    fn test_truncation_respects_multibyte_characters() {
        let title = format!("{}{}", "a".repeat(99), "äöü");
        let normalized = normalize_title(&title);
        assert_eq!(normalized.chars().count(), 100);
        assert!(normalized.ends_with('ä'));
    }

    #[test]
    fn test_whitespace_normalized() {
        assert_eq!(normalize_title("  Chapter \t 1\nPart  2 "), "Chapter 1 Part 2");
    }

    #[test]
    fn test_truncation_does_not_leave_trailing_space() {
        let title = format!("{} tail", "z".repeat(99));
        assert_eq!(normalize_title(&title), "z".repeat(99));
    }
}
