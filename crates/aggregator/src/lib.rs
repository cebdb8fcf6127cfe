//! SSV Rewards Aggregator
//!
//! Monthly side of the reward pipeline. A [`RewardSource`] answers the
//! owner-level and validator-level reward queries of one month; rows are
//! converted into exact [`MonthRecords`] and folded into a
//! [`MonthlyAggregator`], which keeps conservation-checked running totals
//! by owner and by validator public key.

mod records;
mod rolling;
mod source;

pub use records::{MonthRecords, OwnerRecord, ValidatorRecord};
pub use rolling::{MonthlyAggregator, OwnerTotal, RewardTier, ValidatorTotal};
pub use source::{
    FileRewardSource, MemoryRewardSource, MonthQuery, OwnerRewardRow, RewardSource, SourceError,
    TierRow, ValidatorRewardRow,
};
