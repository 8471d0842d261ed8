//! Configuration loading, validation, and saving
//!
//! This module handles:
//! - Loading the TOML config file with span preservation for error reporting
//! - Validating the play action and volume increment
//! - Falling back to defaults when the file is missing or invalid
//! - Writing edited settings back to disk

mod error;
mod types;

pub use error::ConfigError;
pub use types::{PlayAction, SessionConfig};

use error::{ConfigIssue, ConfigValidationError};
use types::MAX_VOLUME_INCREMENT;

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use types::RawConfig;

/// Load and validate configuration from a file
pub fn load(path: impl AsRef<Path>) -> Result<SessionConfig, ConfigError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(&source_name, e))?;

    load_from_str(&source_name, content)
}

/// Load and validate configuration from a string
///
/// Useful for testing and when config content is already in memory.
pub fn load_from_str(source_name: &str, content: String) -> Result<SessionConfig, ConfigError> {
    ConfigLoader::new(source_name.to_string(), content).parse_and_validate()
}

/// Write configuration to a file, creating parent directories as needed
pub fn save(path: impl AsRef<Path>, config: &SessionConfig) -> Result<(), ConfigError> {
    let path = path.as_ref();
    let source_name = path.display().to_string();
    let content = toml::to_string(config)?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::write(&source_name, e))?;
    }
    std::fs::write(path, content).map_err(|e| ConfigError::write(&source_name, e))?;

    debug!(path = %source_name, ?config, "saved config");
    Ok(())
}

/// Internal config loader that tracks validation issues
struct ConfigLoader {
    source_name: String,
    source_content: String,
    issues: Vec<ConfigIssue>,
}

impl ConfigLoader {
    fn new(source_name: String, source_content: String) -> Self {
        Self {
            source_name,
            source_content,
            issues: Vec::new(),
        }
    }

    /// Parse content and validate each value
    fn parse_and_validate(mut self) -> Result<SessionConfig, ConfigError> {
        let raw: RawConfig = toml::from_str(&self.source_content)
            .map_err(|e| ConfigError::parse(&self.source_name, self.source_content.clone(), e))?;

        let config = self.validate(raw);

        if self.issues.is_empty() {
            Ok(config)
        } else {
            Err(ConfigValidationError::new(
                self.source_name,
                self.source_content,
                self.issues,
                config,
            )
            .into())
        }
    }

    /// Build the session config, keeping defaults for missing or invalid values
    fn validate(&mut self, raw: RawConfig) -> SessionConfig {
        let mut config = SessionConfig::default();

        if let Some(play_action) = raw.play_action {
            let span = play_action.span();
            match PlayAction::from_config_str(play_action.get_ref()) {
                Some(action) => config.play_action = action,
                None => self
                    .issues
                    .push(ConfigIssue::unknown_play_action(span, play_action.get_ref())),
            }
        }

        if let Some(increment) = raw.volume_increment {
            let span = increment.span();
            let value = *increment.get_ref();
            match u8::try_from(value) {
                Ok(step) if step <= MAX_VOLUME_INCREMENT => config.volume_increment = step,
                _ => self
                    .issues
                    .push(ConfigIssue::increment_out_of_range(span, value)),
            }
        }

        config
    }
}

/// Persistent store for the session configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default location: `~/.config/audiokeys/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("audiokeys")
            .join("config.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored configuration.
    ///
    /// Never fails: a missing file yields the defaults, an invalid value is
    /// replaced by its default, and an unreadable or malformed file yields
    /// the defaults. Problems are logged with their diagnostic.
    pub fn read(&self) -> SessionConfig {
        match load(&self.path) {
            Ok(config) => {
                info!(path = %self.path.display(), ?config, "loaded config");
                config
            }
            Err(err) if err.is_not_found() => {
                info!(path = %self.path.display(), "no config file, using defaults");
                SessionConfig::default()
            }
            Err(ConfigError::Validation(err)) => {
                let config = err.fallback();
                let issues = err.issue_count();
                warn!(
                    issues = issues,
                    "invalid values replaced by defaults:\n{:?}",
                    miette::Report::new(err)
                );
                config
            }
            Err(err) => {
                warn!(
                    "using default config:\n{:?}",
                    miette::Report::new(err)
                );
                SessionConfig::default()
            }
        }
    }

    /// Write the configuration back to the store
    pub fn write(&self, config: &SessionConfig) -> Result<(), ConfigError> {
        save(&self.path, config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::assert;

    #[test]
    fn test_full_config_parsing() {
        let toml = r#"
            play_action = "restart"
            volume_increment = 10
        "#;
        let config = load_from_str("test.toml", toml.to_string()).unwrap();
        assert!(config.play_action == PlayAction::Restart);
        assert!(config.volume_increment == 10);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = load_from_str("test.toml", String::new()).unwrap();
        assert!(config == SessionConfig::default());
        assert!(config.play_action == PlayAction::Pause);
        assert!(config.volume_increment == 5);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let toml = r#"
            volume_increment = 3
            theme = "dark"
        "#;
        let config = load_from_str("test.toml", toml.to_string()).unwrap();
        assert!(config.volume_increment == 3);
    }

    #[test]
    fn test_invalid_play_action() {
        let toml = r#"
            play_action = "rewind"
            volume_increment = 20
        "#;
        let result = load_from_str("test.toml", toml.to_string());
        let Err(ConfigError::Validation(err)) = result else {
            panic!("expected validation error");
        };
        assert!(err.issue_count() == 1);
        let msg = format!("{err:?}");
        assert!(msg.contains("rewind"));
        // The valid value survives
        assert!(err.fallback().volume_increment == 20);
        assert!(err.fallback().play_action == PlayAction::Pause);
    }

    #[test]
    fn test_increment_out_of_range() {
        for value in ["101", "-1", "100000"] {
            let toml = format!("volume_increment = {value}");
            let result = load_from_str("test.toml", toml);
            let Err(ConfigError::Validation(err)) = result else {
                panic!("expected validation error for {value}");
            };
            assert!(err.fallback().volume_increment == 5);
        }
    }

    #[test]
    fn test_increment_bounds_accepted() {
        for value in [0u8, 100] {
            let toml = format!("volume_increment = {value}");
            let config = load_from_str("test.toml", toml).unwrap();
            assert!(config.volume_increment == value);
        }
    }

    #[test]
    fn test_multiple_errors_collected() {
        let toml = r#"
            play_action = "loud"
            volume_increment = 500
        "#;
        let Err(ConfigError::Validation(err)) = load_from_str("test.toml", toml.to_string())
        else {
            panic!("expected validation error");
        };
        assert!(err.issue_count() == 2);
    }

    #[test]
    fn test_wrong_type_is_parse_error() {
        let toml = r#"volume_increment = "five""#;
        let result = load_from_str("test.toml", toml.to_string());
        assert!(let Err(ConfigError::Parse { .. }) = result);
    }

    #[test]
    fn test_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("nested").join("config.toml"));
        let config = SessionConfig {
            play_action: PlayAction::Restart,
            volume_increment: 12,
        };

        store.write(&config).unwrap();

        assert!(store.read() == config);
    }

    #[test]
    fn test_store_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.toml"));
        assert!(store.read() == SessionConfig::default());
    }

    #[test]
    fn test_store_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "play_action = [").unwrap();
        assert!(ConfigStore::new(path).read() == SessionConfig::default());
    }

    #[test]
    fn test_store_write_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should be
        let path = dir.path().join("config.toml");
        std::fs::create_dir(&path).unwrap();

        let result = ConfigStore::new(path).write(&SessionConfig::default());
        assert!(let Err(ConfigError::Write { .. }) = result);
    }

    #[test]
    fn test_saved_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        save(&path, &SessionConfig::default()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("play_action = \"pause\""));
        assert!(content.contains("volume_increment = 5"));
    }
}
