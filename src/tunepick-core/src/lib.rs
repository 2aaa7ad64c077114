pub mod config;
pub mod logging;
pub mod models;
pub mod paths;

pub use config::{
    Config, ConfigError, LogLevel, LoggingConfig, NoUiHostPolicy, PickerConfig, ValidationError,
};
pub use logging::{init_logging, LoggingError, LoggingGuard};
pub use models::{ArtworkSize, MediaItem};
pub use paths::{AppDirs, DirsError};

pub const APP_NAME: &str = "tunepick";
pub const APP_AUTHOR: &str = "Tunepick";
pub const APP_QUALIFIER: &str = "io";
