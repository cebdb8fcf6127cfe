//! Reward query boundary
//!
//! The monthly workflow asks a [`RewardSource`] for the owner-level and
//! validator-level reward rows of one month and for that month's tier.
//! [`FileRewardSource`] reads rows exported from the rewards database as
//! JSON; [`MemoryRewardSource`] holds them in memory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use ssv_rewards_core::{Month, PerformanceProvider, RewardError};

/// Parameters of one monthly reward query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthQuery {
    pub provider: PerformanceProvider,
    /// Minimum attestations in a day for a validator to count as active
    pub minimum_daily_attestations: u32,
    pub month: Month,
}

/// Owner-level row of the monthly reward query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OwnerRewardRow {
    pub owner_address: String,
    pub number_of_validators: u32,
    pub total_accrued_days: u64,
    /// Reward in whole tokens, as the query computes it
    pub total_ssv_reward: f64,
}

/// Validator-level row of the monthly reward query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorRewardRow {
    pub owner_address: String,
    pub public_key: String,
    pub accrued_days: u64,
    /// Reward in whole tokens, as the query computes it
    pub ssv_reward: f64,
}

/// Tier of a month: daily reward per validator and day count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierRow {
    pub daily_reward: f64,
    pub days_in_month: u32,
}

/// Errors from a reward source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No reward data for {0}")]
    Missing(String),
}

impl From<SourceError> for RewardError {
    fn from(err: SourceError) -> Self {
        RewardError::Query(err.to_string())
    }
}

/// Pluggable reward data source.
///
/// Implementations run the parameterized reward queries for one month.
/// Rows come back exactly as the query produced them; validation and
/// conversion to exact amounts happen in the caller.
pub trait RewardSource: Send + Sync {
    /// Per-owner rewards for the queried month
    fn owner_rewards(&self, query: &MonthQuery) -> Result<Vec<OwnerRewardRow>, SourceError>;

    /// Per-validator rewards for the queried month
    fn validator_rewards(&self, query: &MonthQuery) -> Result<Vec<ValidatorRewardRow>, SourceError>;

    /// Daily tier reward and day count of a month
    fn tier(&self, provider: PerformanceProvider, month: Month) -> Result<TierRow, SourceError>;
}

/// Reads query results exported as JSON files.
///
/// Layout under `root`:
///
/// ```text
/// <provider>/<YYYY-MM>/tier.json
/// <provider>/<YYYY-MM>/min-<attestations>/owners.json
/// <provider>/<YYYY-MM>/min-<attestations>/validators.json
/// ```
pub struct FileRewardSource {
    root: PathBuf,
}

impl FileRewardSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn month_dir(&self, provider: PerformanceProvider, month: Month) -> PathBuf {
        self.root.join(provider.as_str()).join(month.to_string())
    }

    fn query_dir(&self, query: &MonthQuery) -> PathBuf {
        self.month_dir(query.provider, query.month)
            .join(format!("min-{}", query.minimum_daily_attestations))
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, SourceError> {
        let content = std::fs::read_to_string(path).map_err(|source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value = serde_json::from_str(&content).map_err(|source| SourceError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Read reward rows from {}", path.display());
        Ok(value)
    }
}

impl RewardSource for FileRewardSource {
    fn owner_rewards(&self, query: &MonthQuery) -> Result<Vec<OwnerRewardRow>, SourceError> {
        Self::read_json(&self.query_dir(query).join("owners.json"))
    }

    fn validator_rewards(
        &self,
        query: &MonthQuery,
    ) -> Result<Vec<ValidatorRewardRow>, SourceError> {
        Self::read_json(&self.query_dir(query).join("validators.json"))
    }

    fn tier(&self, provider: PerformanceProvider, month: Month) -> Result<TierRow, SourceError> {
        Self::read_json(&self.month_dir(provider, month).join("tier.json"))
    }
}

#[derive(Debug, Clone)]
struct MonthRows {
    owners: Vec<OwnerRewardRow>,
    validators: Vec<ValidatorRewardRow>,
    tier: TierRow,
}

/// In-memory source keyed by month.
///
/// Answers every provider and attestation threshold with the same rows.
#[derive(Debug, Clone, Default)]
pub struct MemoryRewardSource {
    months: HashMap<Month, MonthRows>,
}

impl MemoryRewardSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the rows returned for `month`
    pub fn with_month(
        mut self,
        month: Month,
        owners: Vec<OwnerRewardRow>,
        validators: Vec<ValidatorRewardRow>,
        tier: TierRow,
    ) -> Self {
        self.months.insert(month, MonthRows { owners, validators, tier });
        self
    }

    fn rows(&self, month: Month) -> Result<&MonthRows, SourceError> {
        self.months
            .get(&month)
            .ok_or_else(|| SourceError::Missing(month.to_string()))
    }
}

impl RewardSource for MemoryRewardSource {
    fn owner_rewards(&self, query: &MonthQuery) -> Result<Vec<OwnerRewardRow>, SourceError> {
        Ok(self.rows(query.month)?.owners.clone())
    }

    fn validator_rewards(
        &self,
        query: &MonthQuery,
    ) -> Result<Vec<ValidatorRewardRow>, SourceError> {
        Ok(self.rows(query.month)?.validators.clone())
    }

    fn tier(&self, _provider: PerformanceProvider, month: Month) -> Result<TierRow, SourceError> {
        Ok(self.rows(month)?.tier)
    }
}
