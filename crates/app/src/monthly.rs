//! `monthly`: rolling monthly reward aggregation
//!
//! Each month is queried, converted, folded into the running totals and
//! exported before the next one starts. A failing month aborts the run;
//! months already exported stay on disk.

use std::path::{Path, PathBuf};

use tracing::info;

use ssv_rewards_aggregator::{MonthQuery, MonthRecords, MonthlyAggregator, RewardSource, RewardTier};
use ssv_rewards_core::{Amount, FixedPoint, Month, MonthRange, PerformanceProvider, RewardError};
use ssv_rewards_export::{
    monthly_owner_table, monthly_validator_table, owner_table, owner_totals_table, render_summary,
    validator_table, validator_totals_table, write_ledger, ExportError,
};
use ssv_rewards_settings::Settings;

use crate::{AppError, Result};

/// Everything `run_monthly` needs
#[derive(Debug, Clone)]
pub struct MonthlyJob {
    pub range: MonthRange,
    pub provider: PerformanceProvider,
    pub minimum_daily_attestations: u32,
    pub scale: FixedPoint,
    pub output_dir: PathBuf,
}

impl MonthlyJob {
    /// Job over `range` with the monthly and output settings
    pub fn new(range: MonthRange, settings: &Settings) -> Result<Self> {
        Ok(Self {
            range,
            provider: settings.monthly.performance_provider,
            minimum_daily_attestations: settings.monthly.minimum_daily_attestations,
            scale: settings.monthly.fixed_point()?,
            output_dir: settings.output.dir.clone(),
        })
    }

    fn query(&self, month: Month) -> MonthQuery {
        MonthQuery {
            provider: self.provider,
            minimum_daily_attestations: self.minimum_daily_attestations,
            month,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonthlyReport {
    pub tiers: Vec<RewardTier>,
    /// Sum of every owner reward in the range, base units
    pub total_reward: Amount,
    pub owners: usize,
    pub validators: usize,
    /// Rendered summary table
    pub summary: String,
}

/// Run the monthly workflow over `job.range`.
pub fn run_monthly(job: &MonthlyJob, source: &dyn RewardSource) -> Result<MonthlyReport> {
    info!(
        "Calculating rewards for {} months ({} to {}), provider {}, min attestations {}",
        job.range.len(),
        job.range.from(),
        job.range.to(),
        job.provider,
        job.minimum_daily_attestations,
    );

    let mut aggregator = MonthlyAggregator::starting_at(job.range.from());
    for month in job.range.iter() {
        let records = fetch_month(job, source, month)
            .map_err(|source| AppError::Month { month, source })?;
        let tier = source
            .tier(job.provider, month)
            .map_err(|e| AppError::Month { month, source: e.into() })?;
        aggregator
            .apply_month(records, tier)
            .map_err(|source| AppError::Month { month, source })?;

        export_month(job, &aggregator, month)?;
    }

    export_range(job, &aggregator)?;

    Ok(MonthlyReport {
        tiers: aggregator.tiers().to_vec(),
        total_reward: aggregator.owner_grand_total(),
        owners: aggregator.owner_totals().count(),
        validators: aggregator.validator_totals().count(),
        summary: render_summary(aggregator.tiers(), &job.scale),
    })
}

fn fetch_month(
    job: &MonthlyJob,
    source: &dyn RewardSource,
    month: Month,
) -> std::result::Result<MonthRecords, RewardError> {
    let query = job.query(month);
    let owners = source.owner_rewards(&query)?;
    let validators = source.validator_rewards(&query)?;
    info!("Fetched {}: {} owners, {} validators", month, owners.len(), validators.len());
    MonthRecords::from_rows(month, &owners, &validators, &job.scale)
}

fn export_month(job: &MonthlyJob, aggregator: &MonthlyAggregator, month: Month) -> Result<()> {
    let wrap = |source: ExportError| AppError::MonthExport { month, source };
    let dir = job.output_dir.join(month.to_string());
    let records = aggregator
        .months()
        .last()
        .ok_or_else(|| AppError::InvalidJob(format!("no records applied for {month}")))?;

    owner_table(records.owners(), &job.scale)
        .and_then(|t| t.write_to(&dir.join("by-owner.csv")))
        .map_err(wrap)?;
    validator_table(records.validators(), &job.scale)
        .and_then(|t| t.write_to(&dir.join("by-validator.csv")))
        .map_err(wrap)?;

    let cumulative = aggregator
        .owner_ledger()
        .map_err(|source| AppError::Month { month, source })?;
    write_ledger(&dir.join("cumulative-rewards.json"), &cumulative).map_err(wrap)?;

    info!("Exported {} to {:?}", month, dir);
    Ok(())
}

fn export_range(job: &MonthlyJob, aggregator: &MonthlyAggregator) -> Result<()> {
    let dir: &Path = &job.output_dir;
    monthly_owner_table(aggregator.months(), &job.scale)?.write_to(&dir.join("by-owner.csv"))?;
    monthly_validator_table(aggregator.months(), &job.scale)?
        .write_to(&dir.join("by-validator.csv"))?;
    owner_totals_table(aggregator.owner_totals(), &job.scale)?
        .write_to(&dir.join("total-by-owner.csv"))?;
    validator_totals_table(aggregator.validator_totals(), &job.scale)?
        .write_to(&dir.join("total-by-validator.csv"))?;
    info!("Exported running totals to {:?}", dir);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssv_rewards_aggregator::{MemoryRewardSource, OwnerRewardRow, TierRow, ValidatorRewardRow};
    use ssv_rewards_core::Ledger;

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ssv-rewards-app-monthly-{name}"));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn job(from: &str, to: &str, dir: &Path) -> MonthlyJob {
        let mut settings = Settings::default();
        settings.output.dir = dir.to_path_buf();
        MonthlyJob::new(MonthRange::new(month(from), month(to)).unwrap(), &settings).unwrap()
    }

    fn rows(owner: &str, key: &str, reward: f64) -> (Vec<OwnerRewardRow>, Vec<ValidatorRewardRow>) {
        (
            vec![OwnerRewardRow {
                owner_address: owner.to_string(),
                number_of_validators: 1,
                total_accrued_days: 30,
                total_ssv_reward: reward,
            }],
            vec![ValidatorRewardRow {
                owner_address: owner.to_string(),
                public_key: key.to_string(),
                accrued_days: 30,
                ssv_reward: reward,
            }],
        )
    }

    fn source() -> MemoryRewardSource {
        let (o1, v1) = rows("0xaa", "0x01", 1.5);
        let (o2, v2) = rows("0xaa", "0x01", 2.0);
        MemoryRewardSource::new()
            .with_month(month("2023-10"), o1, v1, TierRow { daily_reward: 0.05, days_in_month: 31 })
            .with_month(month("2023-11"), o2, v2, TierRow { daily_reward: 0.05, days_in_month: 30 })
    }

    #[test]
    fn test_monthly_writes_every_output() {
        let dir = temp_dir("outputs");
        let report = run_monthly(&job("2023-10", "2023-11", &dir), &source()).unwrap();

        assert_eq!(report.tiers.len(), 2);
        assert_eq!(report.total_reward.to_string(), "3500000000000000000");
        assert_eq!(report.owners, 1);
        assert!(report.summary.contains("2023-11 (30 days)"));

        for m in ["2023-10", "2023-11"] {
            for file in ["by-owner.csv", "by-validator.csv", "cumulative-rewards.json"] {
                assert!(dir.join(m).join(file).exists(), "{m}/{file}");
            }
        }
        for file in [
            "by-owner.csv",
            "by-validator.csv",
            "total-by-owner.csv",
            "total-by-validator.csv",
        ] {
            assert!(dir.join(file).exists(), "{file}");
        }

        let cumulative =
            Ledger::load_json(&dir.join("2023-10").join("cumulative-rewards.json")).unwrap();
        assert_eq!(cumulative.total().unwrap().to_string(), "1500000000000000000");
        let cumulative =
            Ledger::load_json(&dir.join("2023-11").join("cumulative-rewards.json")).unwrap();
        assert_eq!(cumulative.total().unwrap(), report.total_reward);

        let totals = std::fs::read_to_string(dir.join("total-by-owner.csv")).unwrap();
        assert_eq!(totals, "OwnerAddress,TotalAccruedDays,TotalSSVReward\n0xaa,60,3.5\n");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_month_aborts_after_earlier_exports() {
        let dir = temp_dir("missing");
        let err = run_monthly(&job("2023-10", "2023-12", &dir), &source()).unwrap_err();
        assert!(matches!(
            err,
            AppError::Month { month: m, source: RewardError::Query(_) } if m == month("2023-12")
        ));
        // Earlier months stay exported, range outputs are never written
        assert!(dir.join("2023-11").join("by-owner.csv").exists());
        assert!(!dir.join("total-by-owner.csv").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_bad_reward_value_names_month() {
        let dir = temp_dir("bad-value");
        let (owners, validators) = rows("0xaa", "0x01", f64::NAN);
        let source = MemoryRewardSource::new().with_month(
            month("2024-01"),
            owners,
            validators,
            TierRow { daily_reward: 0.05, days_in_month: 31 },
        );
        let err = run_monthly(&job("2024-01", "2024-01", &dir), &source).unwrap_err();
        assert!(err.to_string().starts_with("Month 2024-01 failed: Parse error"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
