//! Logging setup shared by the CLI and tests

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{fmt as fmt_layer, prelude::*, EnvFilter};

const OWN_TARGETS: &[&str] = &[
    "ssv_rewards",
    "ssv_rewards_core",
    "ssv_rewards_distribution",
    "ssv_rewards_aggregator",
    "ssv_rewards_export",
    "ssv_rewards_settings",
    "ssv_rewards_app",
];

/// Default verbosity when `RUST_LOG` is not set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }

    /// `Debug` when verbose, `Info` otherwise
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Self::Debug
        } else {
            Self::Info
        }
    }

    /// Our crates at this level, dependencies no louder than warn
    fn directive(&self) -> String {
        OWN_TARGETS.iter().fold("warn".to_string(), |mut directive, target| {
            directive.push_str(&format!(",{target}={}", self.as_str()));
            directive
        })
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            other => Err(format!("unknown log level: {other}")),
        }
    }
}

/// Build the filter: `RUST_LOG` when set and valid, else `level`
pub fn env_filter(level: LogLevel) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()))
}

/// Install the global subscriber.
///
/// Returns `false` when a subscriber was already installed; the existing
/// one is kept.
pub fn try_init(level: LogLevel) -> bool {
    tracing_subscriber::registry()
        .with(fmt_layer::layer().with_target(false))
        .with(env_filter(level))
        .try_init()
        .is_ok()
}
