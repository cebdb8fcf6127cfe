//! CSV tables of monthly records and running totals
//!
//! Rewards are rendered in whole tokens through the run's [`FixedPoint`].

use ssv_rewards_aggregator::{
    MonthRecords, OwnerRecord, OwnerTotal, ValidatorRecord, ValidatorTotal,
};
use ssv_rewards_core::FixedPoint;

use crate::{CsvTable, Result};

const OWNER_HEADER: [&str; 4] = [
    "OwnerAddress",
    "NumberOfValidators",
    "TotalAccruedDays",
    "TotalSSVReward",
];
const VALIDATOR_HEADER: [&str; 4] = ["OwnerAddress", "PublicKey", "AccruedDays", "SSVReward"];

fn owner_fields(record: &OwnerRecord, scale: &FixedPoint) -> Vec<String> {
    vec![
        record.owner.to_string(),
        record.validators.to_string(),
        record.accrued_days.to_string(),
        scale.format(record.reward),
    ]
}

fn validator_fields(record: &ValidatorRecord, scale: &FixedPoint) -> Vec<String> {
    vec![
        record.owner.to_string(),
        record.public_key.to_string(),
        record.accrued_days.to_string(),
        scale.format(record.reward),
    ]
}

fn with_month(month: String, mut fields: Vec<String>) -> Vec<String> {
    fields.insert(0, month);
    fields
}

/// `by-owner.csv` of one month
pub fn owner_table(records: &[OwnerRecord], scale: &FixedPoint) -> Result<CsvTable> {
    let mut table = CsvTable::new(OWNER_HEADER);
    for record in records {
        table.push_row(owner_fields(record, scale))?;
    }
    Ok(table)
}

/// `by-validator.csv` of one month
pub fn validator_table(records: &[ValidatorRecord], scale: &FixedPoint) -> Result<CsvTable> {
    let mut table = CsvTable::new(VALIDATOR_HEADER);
    for record in records {
        table.push_row(validator_fields(record, scale))?;
    }
    Ok(table)
}

/// Owner records of every month, concatenated with a leading month column
pub fn monthly_owner_table(months: &[MonthRecords], scale: &FixedPoint) -> Result<CsvTable> {
    let mut table = CsvTable::new(std::iter::once("Month").chain(OWNER_HEADER));
    for month in months {
        for record in month.owners() {
            table.push_row(with_month(month.month().to_string(), owner_fields(record, scale)))?;
        }
    }
    Ok(table)
}

/// Validator records of every month, concatenated with a leading month column
pub fn monthly_validator_table(months: &[MonthRecords], scale: &FixedPoint) -> Result<CsvTable> {
    let mut table = CsvTable::new(std::iter::once("Month").chain(VALIDATOR_HEADER));
    for month in months {
        for record in month.validators() {
            table.push_row(with_month(month.month().to_string(), validator_fields(record, scale)))?;
        }
    }
    Ok(table)
}

/// `total-by-owner.csv`
pub fn owner_totals_table<'a, I>(totals: I, scale: &FixedPoint) -> Result<CsvTable>
where
    I: IntoIterator<Item = &'a OwnerTotal>,
{
    let mut table = CsvTable::new(["OwnerAddress", "TotalAccruedDays", "TotalSSVReward"]);
    for total in totals {
        table.push_row(vec![
            total.owner.to_string(),
            total.total_accrued_days.to_string(),
            scale.format(total.total_reward),
        ])?;
    }
    Ok(table)
}

/// `total-by-validator.csv`
pub fn validator_totals_table<'a, I>(totals: I, scale: &FixedPoint) -> Result<CsvTable>
where
    I: IntoIterator<Item = &'a ValidatorTotal>,
{
    let mut table = CsvTable::new(VALIDATOR_HEADER);
    for total in totals {
        table.push_row(vec![
            total.owner.to_string(),
            total.public_key.to_string(),
            total.accrued_days.to_string(),
            scale.format(total.reward),
        ])?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssv_rewards_aggregator::{MonthlyAggregator, TierRow};
    use ssv_rewards_core::{Amount, Month, ParticipantId};

    fn id(s: &str) -> ParticipantId {
        ParticipantId::parse(s).unwrap()
    }

    fn tokens(n: u64) -> Amount {
        FixedPoint::default().to_base_units(n as f64).unwrap()
    }

    fn month_records(m: &str, reward: u64) -> MonthRecords {
        MonthRecords::new(
            m.parse::<Month>().unwrap(),
            vec![OwnerRecord {
                owner: id("0xaa"),
                validators: 1,
                accrued_days: 30,
                reward: tokens(reward),
            }],
            vec![ValidatorRecord {
                owner: id("0xaa"),
                public_key: id("0x01"),
                accrued_days: 30,
                reward: tokens(reward),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_owner_table_renders_tokens() {
        let records = month_records("2023-10", 2);
        let table = owner_table(records.owners(), &FixedPoint::default()).unwrap();
        assert_eq!(
            table.render(),
            "OwnerAddress,NumberOfValidators,TotalAccruedDays,TotalSSVReward\n0xaa,1,30,2\n"
        );
    }

    #[test]
    fn test_monthly_tables_prefix_month() {
        let months = vec![month_records("2023-10", 1), month_records("2023-11", 3)];
        let owners = monthly_owner_table(&months, &FixedPoint::default()).unwrap();
        assert_eq!(owners.header()[0], "Month");
        assert_eq!(owners.rows()[1][0], "2023-11");
        assert_eq!(owners.rows()[1][4], "3");

        let validators = monthly_validator_table(&months, &FixedPoint::default()).unwrap();
        assert_eq!(validators.len(), 2);
        assert_eq!(validators.rows()[0][2], "0x01");
    }

    #[test]
    fn test_totals_tables() {
        let mut agg = MonthlyAggregator::new();
        let tier = TierRow { daily_reward: 0.1, days_in_month: 31 };
        agg.apply_month(month_records("2023-10", 1), tier).unwrap();
        agg.apply_month(month_records("2023-11", 3), tier).unwrap();

        let scale = FixedPoint::default();
        let owners = owner_totals_table(agg.owner_totals(), &scale).unwrap();
        assert_eq!(owners.render(), "OwnerAddress,TotalAccruedDays,TotalSSVReward\n0xaa,60,4\n");
        let validators = validator_totals_table(agg.validator_totals(), &scale).unwrap();
        assert_eq!(validators.rows()[0], vec!["0xaa", "0x01", "60", "4"]);
    }
}
