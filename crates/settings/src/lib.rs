//! SSV Rewards Settings
//!
//! JSON configuration shared by every command.
//!
//! ## Usage
//!
//! ```no_run
//! use std::path::Path;
//! use ssv_rewards_settings::Settings;
//!
//! // Defaults when the file does not exist
//! let mut settings = Settings::load_from(Path::new("ssv-rewards.json"))?;
//! settings.monthly.minimum_daily_attestations = 180;
//! settings.save()?;
//! # Ok::<(), ssv_rewards_settings::SettingsError>(())
//! ```

mod config;

pub use config::{DistributionSettings, MonthlySettings, OutputSettings, Settings};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS_FILE: &str = "ssv-rewards.json";

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    PathBuf::from(DEFAULT_SETTINGS_FILE)
}
