//! Monthly rolling aggregation
//!
//! Months are applied one at a time, strictly in order and without gaps.
//! Each applied month extends two running-total tables (by owner and by
//! validator public key). After every month the owner table is checked
//! against the cumulative sum of every owner record applied so far.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use ssv_rewards_core::{Amount, Ledger, Month, ParticipantId, Result, RewardError};
use ssv_rewards_distribution::ensure_conserved;

use crate::{MonthRecords, OwnerRecord, TierRow, ValidatorRecord};

// =========================================================================
// Running totals
// =========================================================================

/// Running total of one owner across all applied months
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerTotal {
    pub owner: ParticipantId,
    pub total_accrued_days: u64,
    pub total_reward: Amount,
}

/// Running total of one validator across all applied months
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatorTotal {
    /// Owner the validator was first seen under
    pub owner: ParticipantId,
    pub public_key: ParticipantId,
    pub accrued_days: u64,
    pub reward: Amount,
}

/// Reporting row for one applied month
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RewardTier {
    pub month: Month,
    pub days: u32,
    /// Validators that earned in the month
    pub validators: usize,
    pub daily_reward: f64,
    /// Sum of owner rewards for the month
    pub total_reward: Amount,
}

// =========================================================================
// Aggregator
// =========================================================================

/// Rolling monthly reward aggregator.
///
/// Starts empty. [`apply_month`](Self::apply_month) either applies a whole
/// month or leaves the state untouched.
#[derive(Debug, Default)]
pub struct MonthlyAggregator {
    last_month: Option<Month>,
    owner_totals: BTreeMap<ParticipantId, OwnerTotal>,
    validator_totals: BTreeMap<ParticipantId, ValidatorTotal>,
    months: Vec<MonthRecords>,
    tiers: Vec<RewardTier>,
    owner_grand_total: Amount,
    validator_grand_total: Amount,
}

impl MonthlyAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at `first` instead of whatever month arrives first
    pub fn starting_at(first: Month) -> Self {
        Self {
            last_month: first.previous(),
            ..Self::default()
        }
    }

    /// Month expected by the next [`apply_month`](Self::apply_month), if any
    pub fn expected_month(&self) -> Option<Month> {
        self.last_month.map(|m| m.next())
    }

    pub fn last_month(&self) -> Option<Month> {
        self.last_month
    }

    /// Apply one month of records.
    ///
    /// Fails with `MonthOutOfOrder` unless `records` is for the month right
    /// after the last applied one. Nothing is changed on failure.
    pub fn apply_month(&mut self, records: MonthRecords, tier: TierRow) -> Result<&RewardTier> {
        let month = records.month();
        if let Some(expected) = self.expected_month() {
            if month != expected {
                warn!("Month {} applied out of order, expected {}", month, expected);
                return Err(RewardError::MonthOutOfOrder { expected, got: month });
            }
        }

        let month_owner_total = records.owner_total()?;
        let month_validator_total = records.validator_total()?;
        let owner_grand_total = self
            .owner_grand_total
            .checked_add(month_owner_total)
            .ok_or_else(|| overflow("cumulative owner rewards", month))?;
        let validator_grand_total = self
            .validator_grand_total
            .checked_add(month_validator_total)
            .ok_or_else(|| overflow("cumulative validator rewards", month))?;

        // Stage into copies so a failure leaves the committed totals intact
        let mut owner_totals = self.owner_totals.clone();
        for record in records.owners() {
            accumulate_owner(&mut owner_totals, record, month)?;
        }
        let mut validator_totals = self.validator_totals.clone();
        for record in records.validators() {
            accumulate_validator(&mut validator_totals, record, month)?;
        }

        let context = format!("cumulative owners through {month}");
        ensure_conserved(&owner_ledger(&owner_totals)?, owner_grand_total, &context)?;
        let context = format!("cumulative validators through {month}");
        ensure_conserved(&validator_ledger(&validator_totals)?, validator_grand_total, &context)?;

        if month_owner_total != month_validator_total {
            warn!(
                "Owner and validator rewards differ in {}: {} vs {}",
                month, month_owner_total, month_validator_total
            );
        }

        let tier = RewardTier {
            month,
            days: tier.days_in_month,
            validators: records.validators().len(),
            daily_reward: tier.daily_reward,
            total_reward: month_owner_total,
        };
        debug!(
            "Applied {}: {} owners, {} validators",
            month,
            records.owners().len(),
            records.validators().len()
        );

        self.owner_totals = owner_totals;
        self.validator_totals = validator_totals;
        self.owner_grand_total = owner_grand_total;
        self.validator_grand_total = validator_grand_total;
        self.last_month = Some(month);
        self.months.push(records);
        self.tiers.push(tier);

        info!(
            "Month {} aggregated: {} owners, {} validators in running totals",
            month,
            self.owner_totals.len(),
            self.validator_totals.len()
        );
        let applied = self.tiers.len() - 1;
        Ok(&self.tiers[applied])
    }

    pub fn owner_totals(&self) -> impl Iterator<Item = &OwnerTotal> + '_ {
        self.owner_totals.values()
    }

    pub fn validator_totals(&self) -> impl Iterator<Item = &ValidatorTotal> + '_ {
        self.validator_totals.values()
    }

    /// Owner running totals as a ledger
    pub fn owner_ledger(&self) -> Result<Ledger> {
        owner_ledger(&self.owner_totals)
    }

    /// Validator running totals as a ledger keyed by public key
    pub fn validator_ledger(&self) -> Result<Ledger> {
        validator_ledger(&self.validator_totals)
    }

    /// Every applied month, oldest first
    pub fn months(&self) -> &[MonthRecords] {
        &self.months
    }

    pub fn tiers(&self) -> &[RewardTier] {
        &self.tiers
    }

    /// Sum of every owner record applied so far
    pub fn owner_grand_total(&self) -> Amount {
        self.owner_grand_total
    }

    pub fn validator_grand_total(&self) -> Amount {
        self.validator_grand_total
    }
}

fn accumulate_owner(
    totals: &mut BTreeMap<ParticipantId, OwnerTotal>,
    record: &OwnerRecord,
    month: Month,
) -> Result<()> {
    let entry = totals.entry(record.owner.clone()).or_insert_with(|| OwnerTotal {
        owner: record.owner.clone(),
        total_accrued_days: 0,
        total_reward: Amount::zero(),
    });
    entry.total_accrued_days = entry
        .total_accrued_days
        .checked_add(record.accrued_days)
        .ok_or_else(|| overflow("accrued days", month))?;
    entry.total_reward = entry
        .total_reward
        .checked_add(record.reward)
        .ok_or_else(|| overflow("owner reward", month))?;
    Ok(())
}

fn accumulate_validator(
    totals: &mut BTreeMap<ParticipantId, ValidatorTotal>,
    record: &ValidatorRecord,
    month: Month,
) -> Result<()> {
    let entry = totals.entry(record.public_key.clone()).or_insert_with(|| ValidatorTotal {
        owner: record.owner.clone(),
        public_key: record.public_key.clone(),
        accrued_days: 0,
        reward: Amount::zero(),
    });
    if entry.owner != record.owner {
        debug!(
            "Validator {} moved from {} to {} in {}",
            record.public_key, entry.owner, record.owner, month
        );
    }
    entry.accrued_days = entry
        .accrued_days
        .checked_add(record.accrued_days)
        .ok_or_else(|| overflow("accrued days", month))?;
    entry.reward = entry
        .reward
        .checked_add(record.reward)
        .ok_or_else(|| overflow("validator reward", month))?;
    Ok(())
}

fn owner_ledger(totals: &BTreeMap<ParticipantId, OwnerTotal>) -> Result<Ledger> {
    Ledger::from_entries(totals.values().map(|t| (t.owner.clone(), t.total_reward)))
}

fn validator_ledger(totals: &BTreeMap<ParticipantId, ValidatorTotal>) -> Result<Ledger> {
    Ledger::from_entries(totals.values().map(|t| (t.public_key.clone(), t.reward)))
}

fn overflow(what: &str, month: Month) -> RewardError {
    RewardError::InvalidAmount(format!("{what} overflow in {month}"))
}
