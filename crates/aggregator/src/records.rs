//! Monthly records: query rows converted to exact amounts

use std::collections::HashSet;

use serde::Serialize;

use ssv_rewards_core::{Amount, FixedPoint, Month, ParticipantId, Result, RewardError};

use crate::{OwnerRewardRow, ValidatorRewardRow};

/// One owner's rewards for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerRecord {
    pub owner: ParticipantId,
    pub validators: u32,
    pub accrued_days: u64,
    /// Reward in token base units
    pub reward: Amount,
}

impl OwnerRecord {
    pub fn from_row(row: &OwnerRewardRow, scale: &FixedPoint) -> Result<Self> {
        let owner = ParticipantId::parse(&row.owner_address)?;
        let reward = scale
            .to_base_units(row.total_ssv_reward)
            .map_err(|e| annotate(e, &owner))?;
        Ok(Self {
            owner,
            validators: row.number_of_validators,
            accrued_days: row.total_accrued_days,
            reward,
        })
    }
}

/// One validator's rewards for one month
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorRecord {
    pub owner: ParticipantId,
    pub public_key: ParticipantId,
    pub accrued_days: u64,
    /// Reward in token base units
    pub reward: Amount,
}

impl ValidatorRecord {
    pub fn from_row(row: &ValidatorRewardRow, scale: &FixedPoint) -> Result<Self> {
        let public_key = ParticipantId::parse(&row.public_key)?;
        let reward = scale
            .to_base_units(row.ssv_reward)
            .map_err(|e| annotate(e, &public_key))?;
        Ok(Self {
            owner: ParticipantId::parse(&row.owner_address)?,
            public_key,
            accrued_days: row.accrued_days,
            reward,
        })
    }
}

/// The validated records of a single month.
///
/// Immutable once built: each identity appears at most once per
/// granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthRecords {
    month: Month,
    owners: Vec<OwnerRecord>,
    validators: Vec<ValidatorRecord>,
}

impl MonthRecords {
    pub fn new(
        month: Month,
        owners: Vec<OwnerRecord>,
        validators: Vec<ValidatorRecord>,
    ) -> Result<Self> {
        let mut seen = HashSet::with_capacity(owners.len());
        for record in &owners {
            if !seen.insert(&record.owner) {
                return Err(RewardError::DuplicateParticipant(format!(
                    "owner {} twice in {month}",
                    record.owner
                )));
            }
        }
        let mut seen = HashSet::with_capacity(validators.len());
        for record in &validators {
            if !seen.insert(&record.public_key) {
                return Err(RewardError::DuplicateParticipant(format!(
                    "validator {} twice in {month}",
                    record.public_key
                )));
            }
        }
        Ok(Self { month, owners, validators })
    }

    /// Convert raw query rows of `month`
    pub fn from_rows(
        month: Month,
        owners: &[OwnerRewardRow],
        validators: &[ValidatorRewardRow],
        scale: &FixedPoint,
    ) -> Result<Self> {
        let owners = owners
            .iter()
            .map(|row| OwnerRecord::from_row(row, scale))
            .collect::<Result<Vec<_>>>()?;
        let validators = validators
            .iter()
            .map(|row| ValidatorRecord::from_row(row, scale))
            .collect::<Result<Vec<_>>>()?;
        Self::new(month, owners, validators)
    }

    pub fn month(&self) -> Month {
        self.month
    }

    pub fn owners(&self) -> &[OwnerRecord] {
        &self.owners
    }

    pub fn validators(&self) -> &[ValidatorRecord] {
        &self.validators
    }

    /// Sum of owner rewards for the month
    pub fn owner_total(&self) -> Result<Amount> {
        Amount::checked_sum(self.owners.iter().map(|r| &r.reward)).ok_or_else(|| {
            RewardError::InvalidAmount(format!("owner rewards for {} exceed 256 bits", self.month))
        })
    }

    /// Sum of validator rewards for the month
    pub fn validator_total(&self) -> Result<Amount> {
        Amount::checked_sum(self.validators.iter().map(|r| &r.reward)).ok_or_else(|| {
            RewardError::InvalidAmount(format!(
                "validator rewards for {} exceed 256 bits",
                self.month
            ))
        })
    }
}

fn annotate(err: RewardError, who: &ParticipantId) -> RewardError {
    match err {
        RewardError::Parse(msg) => RewardError::Parse(format!("{who}: {msg}")),
        RewardError::InvalidAmount(msg) => RewardError::InvalidAmount(format!("{who}: {msg}")),
        other => other,
    }
}
