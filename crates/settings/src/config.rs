//! Configuration types

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use ssv_rewards_core::{FixedPoint, PerformanceProvider, MAX_TOKEN_DECIMALS};
use ssv_rewards_distribution::RemainderPolicy;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Where outputs are written
    #[serde(default)]
    pub output: OutputSettings,

    /// Round distribution settings
    #[serde(default)]
    pub distribution: DistributionSettings,

    /// Monthly rolling workflow settings
    #[serde(default)]
    pub monthly: MonthlySettings,

    /// Path the settings were loaded from (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut settings = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            info!("Loaded settings from {:?}", path);
            settings
        } else {
            Self::default()
        };
        settings.validate()?;
        settings.config_path = Some(path.to_path_buf());
        Ok(settings)
    }

    /// Save settings to the path they were loaded from
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Reject values no workflow can run with
    pub fn validate(&self) -> Result<()> {
        if self.monthly.token_decimals > MAX_TOKEN_DECIMALS {
            return Err(SettingsError::Invalid {
                field: "monthly.token_decimals",
                reason: format!(
                    "at most {MAX_TOKEN_DECIMALS}, got {}",
                    self.monthly.token_decimals
                ),
            });
        }
        if self.distribution.merged_label.trim().is_empty() {
            return Err(SettingsError::Invalid {
                field: "distribution.merged_label",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory every command writes into
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./rewards")
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self { dir: default_output_dir() }
    }
}

/// Round distribution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSettings {
    /// Who absorbs the rounding remainder
    #[serde(default)]
    pub remainder_policy: RemainderPolicy,

    /// Label of the merged ledger when several rounds run together
    #[serde(default = "default_merged_label")]
    pub merged_label: String,
}

fn default_merged_label() -> String {
    "final".to_string()
}

impl Default for DistributionSettings {
    fn default() -> Self {
        Self {
            remainder_policy: RemainderPolicy::default(),
            merged_label: default_merged_label(),
        }
    }
}

/// Monthly rolling workflow settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlySettings {
    /// Validator performance data provider
    #[serde(default)]
    pub performance_provider: PerformanceProvider,

    /// Minimum attestations in a day for a validator to accrue it
    #[serde(default = "default_minimum_daily_attestations")]
    pub minimum_daily_attestations: u32,

    /// Root of the exported reward query results
    #[serde(default = "default_source_dir")]
    pub source_dir: PathBuf,

    /// Decimals of the reward token
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
}

fn default_minimum_daily_attestations() -> u32 {
    202
}

fn default_source_dir() -> PathBuf {
    PathBuf::from("./data/monthly")
}

fn default_token_decimals() -> u32 {
    MAX_TOKEN_DECIMALS
}

impl MonthlySettings {
    /// Fixed-point scale for converting query rewards to base units
    pub fn fixed_point(&self) -> Result<FixedPoint> {
        FixedPoint::new(self.token_decimals).map_err(|e| SettingsError::Invalid {
            field: "monthly.token_decimals",
            reason: e.to_string(),
        })
    }
}

impl Default for MonthlySettings {
    fn default() -> Self {
        Self {
            performance_provider: PerformanceProvider::default(),
            minimum_daily_attestations: default_minimum_daily_attestations(),
            source_dir: default_source_dir(),
            token_decimals: default_token_decimals(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("ssv-rewards-settings-{name}")).join("settings.json")
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.output.dir, PathBuf::from("./rewards"));
        assert_eq!(settings.distribution.remainder_policy, RemainderPolicy::LastParticipant);
        assert_eq!(settings.distribution.merged_label, "final");
        assert_eq!(settings.monthly.performance_provider, PerformanceProvider::Beaconcha);
        assert_eq!(settings.monthly.minimum_daily_attestations, 202);
        assert_eq!(settings.monthly.token_decimals, 18);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let json = r#"{"monthly": {"performance_provider": "e2m"}, "distribution": {"remainder_policy": "largest_remainder"}}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(settings.monthly.performance_provider, PerformanceProvider::E2m);
        assert_eq!(settings.monthly.minimum_daily_attestations, 202);
        assert_eq!(settings.distribution.remainder_policy, RemainderPolicy::LargestRemainder);
        assert_eq!(settings.distribution.merged_label, "final");
        assert_eq!(settings.output.dir, PathBuf::from("./rewards"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = temp_path("missing");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.monthly.minimum_daily_attestations, 202);
        assert_eq!(settings.config_path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path("roundtrip");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());

        let mut settings = Settings::default();
        settings.output.dir = PathBuf::from("/tmp/out");
        settings.monthly.minimum_daily_attestations = 180;
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded.output.dir, PathBuf::from("/tmp/out"));
        assert_eq!(loaded.monthly.minimum_daily_attestations, 180);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_invalid_decimals_rejected() {
        let path = temp_path("bad-decimals");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, r#"{"monthly": {"token_decimals": 30}}"#).unwrap();

        let err = Settings::load_from(&path).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "monthly.token_decimals", .. }));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_malformed_file_rejected() {
        let path = temp_path("malformed");
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{ not json").unwrap();

        assert!(matches!(Settings::load_from(&path), Err(SettingsError::ParseError(_))));

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_fixed_point_from_settings() {
        let mut monthly = MonthlySettings::default();
        monthly.token_decimals = 6;
        assert_eq!(monthly.fixed_point().unwrap().decimals(), 6);
    }
}
