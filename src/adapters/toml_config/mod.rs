// TOML config adapter - Configuration files in TOML

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::info;

use crate::config::SyncConfig;
use crate::domain::errors::*;

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "tonie_sync.toml";

/// Top-level layout: settings live under `[tonie_sync]`
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    tonie_sync: SyncConfig,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Parse a configuration document; missing keys keep their defaults
    pub fn parse(content: &str) -> Result<SyncConfig, DomainError> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| DomainError::Config(format!("Failed to parse TOML config: {}", e)))?;
        Ok(file.tonie_sync)
    }

    /// Load a configuration file
    pub fn load(file_path: &Path) -> Result<SyncConfig, DomainError> {
        let content = std::fs::read_to_string(file_path).map_err(|e| {
            DomainError::Config(format!(
                "Failed to read config file {}: {}",
                file_path.display(),
                e
            ))
        })?;
        Self::parse(&content)
    }

    /// Platform config location, e.g. `$XDG_CONFIG_HOME/tonie-sync/config.toml`
    pub fn default_config_path() -> Option<PathBuf> {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return Some(PathBuf::from(appdata).join("tonie-sync").join("config.toml"));
        }
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return Some(PathBuf::from(xdg).join("tonie-sync").join("config.toml"));
        }
        std::env::var_os("HOME")
            .map(|home| PathBuf::from(home).join(".config").join("tonie-sync").join("config.toml"))
    }

    /// Explicit path if given (must exist), else the first existing default location,
    /// else built-in defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<SyncConfig, DomainError> {
        if let Some(path) = explicit {
            info!("Loading configuration from: {}", path.display());
            return Self::load(path);
        }

        let candidates = std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE)).chain(Self::default_config_path());
        for path in candidates {
            if path.exists() {
                info!("Loading configuration from: {}", path.display());
                return Self::load(&path);
            }
        }

        info!("No config file found, using defaults");
        Ok(SyncConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_partial_file_keeps_defaults() {
        let config = TomlConfigAdapter::parse(
            r#"
            [tonie_sync]
            min_silence_duration = 3.0
            ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"
            "#,
        )
        .unwrap();
        assert_eq!(config.min_silence_duration, 3.0);
        assert_eq!(config.ffmpeg_path, PathBuf::from("/opt/ffmpeg/bin/ffmpeg"));
        assert_eq!(config.silence_threshold_db, -50.0);
        assert_eq!(config.audio_bitrate, "128k");
    }

    #[test]
    fn test_parse_empty_document() {
        assert_eq!(TomlConfigAdapter::parse("").unwrap(), SyncConfig::default());
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = TomlConfigAdapter::parse("[tonie_sync\nbroken").unwrap_err();
        assert!(matches!(err, DomainError::Config(_)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        assert!(TomlConfigAdapter::resolve(Some(Path::new("/no/such/config.toml"))).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tonie_sync]\nsize_tolerance = 0.01\n").unwrap();
        let config = TomlConfigAdapter::resolve(Some(&path)).unwrap();
        assert_eq!(config.size_tolerance, 0.01);
    }
}
