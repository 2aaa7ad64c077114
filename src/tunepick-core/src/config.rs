use crate::models::ArtworkSize;
use crate::paths::AppDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_config_version")]
    pub config_version: u32,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub picker: PickerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            logging: LoggingConfig::default(),
            picker: PickerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,
    #[serde(default = "default_max_log_files")]
    pub max_log_files: usize,
    /// Mirror log lines to stderr. Stdout is reserved for the method channel.
    #[serde(default = "default_console_enabled")]
    pub console: bool,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_log_files: default_max_log_files(),
            console: default_console_enabled(),
            file_name: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// What the bridge does when no UI root exists at presentation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum NoUiHostPolicy {
    /// Answer with a `no_ui_host` error.
    #[default]
    Error,
    /// Drop the request without answering.
    Silent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickerConfig {
    /// Method channel name the bridge is registered under.
    #[serde(default = "default_channel")]
    pub channel: String,
    /// Language used for the prompt and error messages (e.g. "en", "vi").
    #[serde(default)]
    pub locale: Option<String>,
    /// Overrides the localized picker prompt.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Overrides the localized `no_permission` message.
    #[serde(default)]
    pub denied_message: Option<String>,
    #[serde(default = "default_allows_multiple")]
    pub allows_multiple: bool,
    /// Side of the square box artwork is rendered into, in logical pixels.
    #[serde(default = "default_artwork_size")]
    pub artwork_size: u32,
    #[serde(default)]
    pub no_ui_host: NoUiHostPolicy,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            channel: default_channel(),
            locale: None,
            prompt: None,
            denied_message: None,
            allows_multiple: default_allows_multiple(),
            artwork_size: default_artwork_size(),
            no_ui_host: NoUiHostPolicy::default(),
        }
    }
}

impl PickerConfig {
    pub fn artwork_size(&self) -> ArtworkSize {
        ArtworkSize::square(self.artwork_size)
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("config validation failed: {0}")]
    Validation(ValidationError),
    #[error("failed to prepare configuration directories: {0}")]
    Directories(#[from] crate::paths::DirsError),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unsupported config_version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("picker.channel must not be empty")]
    EmptyChannel,
    #[error("picker.artwork_size must be greater than zero")]
    ZeroArtworkSize,
}

impl Config {
    pub fn load_or_default(dirs: &AppDirs) -> Result<Self, ConfigError> {
        dirs.ensure_exists()?;
        Self::load_from(&Self::config_path(dirs))
    }

    /// Load a config file, falling back to defaults when it does not exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(ConfigError::Validation)?;
        Ok(config)
    }

    pub fn config_path(dirs: &AppDirs) -> PathBuf {
        dirs.config_dir().join("config.toml")
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config_version != CURRENT_CONFIG_VERSION {
            return Err(ValidationError::UnsupportedVersion {
                found: self.config_version,
                expected: CURRENT_CONFIG_VERSION,
            });
        }
        if self.picker.channel.trim().is_empty() {
            return Err(ValidationError::EmptyChannel);
        }
        if self.picker.artwork_size == 0 {
            return Err(ValidationError::ZeroArtworkSize);
        }
        Ok(())
    }
}

fn default_config_version() -> u32 {
    CURRENT_CONFIG_VERSION
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_max_log_files() -> usize {
    7
}

fn default_console_enabled() -> bool {
    true
}

fn default_channel() -> String {
    "apple_music_picker".to_string()
}

fn default_allows_multiple() -> bool {
    true
}

fn default_artwork_size() -> u32 {
    300
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.logging.max_log_files, 7);
        assert!(config.logging.console);
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.picker.channel, "apple_music_picker");
        assert!(config.picker.allows_multiple);
        assert_eq!(config.picker.artwork_size(), ArtworkSize::square(300));
        assert_eq!(config.picker.no_ui_host, NoUiHostPolicy::Error);
    }

    #[test]
    fn invalid_version_rejected() {
        let mut config = Config::default();
        config.config_version = CURRENT_CONFIG_VERSION + 1;
        let result = config.validate();
        assert!(matches!(
            result,
            Err(ValidationError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn zero_artwork_size_rejected() {
        let mut config = Config::default();
        config.picker.artwork_size = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::ZeroArtworkSize)
        ));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config.picker.channel, "apple_music_picker");
    }

    #[test]
    fn picker_section_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[picker]
locale = "vi"
allows_multiple = false
artwork_size = 512
no_ui_host = "silent"

[logging]
level = "debug"
console = false
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.picker.locale.as_deref(), Some("vi"));
        assert!(!config.picker.allows_multiple);
        assert_eq!(config.picker.artwork_size, 512);
        assert_eq!(config.picker.no_ui_host, NoUiHostPolicy::Silent);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert!(!config.logging.console);
    }

    #[test]
    fn empty_channel_fails_load() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[picker]\nchannel = \"  \"").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Validation(ValidationError::EmptyChannel)
        ));
    }
}
