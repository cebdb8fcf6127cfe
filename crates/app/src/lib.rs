//! SSV Rewards App Framework
//!
//! Standard initialization and the three reward workflows.
//!
//! ## Workflows
//!
//! ```text
//! calc     points JSON per round ──► distribute ──► verify ──► merge ──► verify ──► JSON ledgers
//! sum      points JSON tables ─────────────────────────────► merge ──► verify ──► JSON table
//! monthly  RewardSource per month ──► records ──► running totals ──► verify ──► CSV + JSON
//! ```
//!
//! ## Usage
//!
//! ```no_run
//! use ssv_rewards_app::App;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::builder()
//!         .name("ssv-rewards")
//!         .verbose(true)
//!         .build()?;
//!
//!     let settings = app.settings();
//!     println!("writing to {:?}", settings.output.dir);
//!
//!     Ok(())
//! }
//! ```

mod builder;
mod calc;
mod monthly;
mod sum;

pub use builder::AppBuilder;
pub use calc::{run_calc, CalcJob, CalcReport, RoundOutput, RoundSpec};
pub use monthly::{run_monthly, MonthlyJob, MonthlyReport};
pub use sum::{run_sum, SumJob, DEFAULT_SUM_LABEL};

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use ssv_rewards_core::{Month, RewardError};
use ssv_rewards_export::ExportError;
use ssv_rewards_settings::Settings;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Settings error: {0}")]
    Settings(#[from] ssv_rewards_settings::SettingsError),

    #[error("Round {label} failed: {source}")]
    Round {
        label: String,
        #[source]
        source: RewardError,
    },

    #[error("Month {month} failed: {source}")]
    Month {
        month: Month,
        #[source]
        source: RewardError,
    },

    #[error("Export for month {month} failed: {source}")]
    MonthExport {
        month: Month,
        #[source]
        source: ExportError,
    },

    #[error(transparent)]
    Reward(#[from] RewardError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Invalid job: {0}")]
    InvalidJob(String),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Initialized SSV Rewards application
pub struct App {
    name: String,
    version: String,
    settings: Arc<Settings>,
}

impl App {
    /// Create a new app builder
    pub fn builder() -> AppBuilder {
        AppBuilder::new()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Get application settings
    pub fn settings(&self) -> Arc<Settings> {
        self.settings.clone()
    }

    /// Log startup banner
    pub fn log_startup(&self) {
        info!("╔════════════════════════════════════════╗");
        info!("║        SSV Rewards {:^10}          ║", self.version);
        info!("╠════════════════════════════════════════╣");
        info!("║  App: {:<32} ║", self.name);
        info!("║  Output: {:<29} ║", self.settings.output.dir.display().to_string());
        let policy = format!("{:?}", self.settings.distribution.remainder_policy);
        info!("║  Policy: {:<29} ║", policy);
        info!("╚════════════════════════════════════════╝");
    }
}
