//! App builder for fluent initialization

use std::path::PathBuf;
use std::sync::Arc;

use ssv_rewards_logging::{try_init as try_init_logging, LogLevel};
use ssv_rewards_settings::Settings;

use crate::{App, Result};

/// Builder for the reward application
pub struct AppBuilder {
    name: Option<String>,
    version: Option<String>,
    verbose: bool,
    log_level: Option<LogLevel>,
    config_path: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    skip_logging: bool,
    skip_settings: bool,
    skip_banner: bool,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            version: None,
            verbose: false,
            log_level: None,
            config_path: None,
            output_dir: None,
            skip_logging: false,
            skip_settings: false,
            skip_banner: false,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Enable verbose logging (debug level)
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set explicit log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log_level = Some(level);
        self
    }

    /// Load settings from this file instead of the default one
    pub fn config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Override `output.dir` from the settings file
    pub fn output_dir(mut self, dir: PathBuf) -> Self {
        self.output_dir = Some(dir);
        self
    }

    /// Skip logging initialization (useful for tests)
    pub fn skip_logging(mut self) -> Self {
        self.skip_logging = true;
        self
    }

    /// Use default settings without touching the filesystem
    pub fn skip_settings(mut self) -> Self {
        self.skip_settings = true;
        self
    }

    pub fn skip_banner(mut self) -> Self {
        self.skip_banner = true;
        self
    }

    /// Build the application
    pub fn build(self) -> Result<App> {
        let name = self.name.unwrap_or_else(|| "ssv-rewards".to_string());
        let version = self.version.unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

        if !self.skip_logging {
            let level = self
                .log_level
                .unwrap_or_else(|| LogLevel::from_verbose(self.verbose));
            // Already initialized is fine
            let _ = try_init_logging(level);
        }

        let mut settings = if self.skip_settings {
            Settings::default()
        } else if let Some(path) = &self.config_path {
            Settings::load_from(path)?
        } else {
            Settings::load_or_default()?
        };
        if let Some(dir) = self.output_dir {
            settings.output.dir = dir;
        }

        let app = App {
            name,
            version,
            settings: Arc::new(settings),
        };

        if !self.skip_banner && !self.skip_logging {
            app.log_startup();
        }

        Ok(app)
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let app = AppBuilder::new()
            .skip_logging()
            .skip_settings()
            .skip_banner()
            .build()
            .unwrap();

        assert_eq!(app.name(), "ssv-rewards");
        assert!(!app.version().is_empty());
        assert_eq!(app.settings().output.dir, PathBuf::from("./rewards"));
    }

    #[test]
    fn test_builder_custom_name() {
        let app = AppBuilder::new()
            .name("my-app")
            .version("1.0.0")
            .skip_logging()
            .skip_settings()
            .skip_banner()
            .build()
            .unwrap();

        assert_eq!(app.name(), "my-app");
        assert_eq!(app.version(), "1.0.0");
    }

    #[test]
    fn test_builder_output_dir_overrides_settings() {
        let app = AppBuilder::new()
            .output_dir(PathBuf::from("/tmp/elsewhere"))
            .skip_logging()
            .skip_settings()
            .skip_banner()
            .build()
            .unwrap();

        assert_eq!(app.settings().output.dir, PathBuf::from("/tmp/elsewhere"));
    }

    #[test]
    fn test_builder_loads_config_path() {
        let dir = std::env::temp_dir().join("ssv-rewards-app-builder-config");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.json");
        std::fs::write(&path, r#"{"distribution": {"merged_label": "total"}}"#).unwrap();

        let app = AppBuilder::new()
            .config_path(path)
            .skip_logging()
            .skip_banner()
            .build()
            .unwrap();
        assert_eq!(app.settings().distribution.merged_label, "total");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
