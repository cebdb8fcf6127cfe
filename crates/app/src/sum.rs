//! `sum`: merge points tables into one

use std::path::PathBuf;

use tracing::info;

use ssv_rewards_core::{Amount, Ledger};
use ssv_rewards_distribution::merge_verified;
use ssv_rewards_export::LedgerWriter;

use crate::{AppError, Result, RoundOutput};

/// Default label of the summed table
pub const DEFAULT_SUM_LABEL: &str = "total-final";

#[derive(Debug, Clone)]
pub struct SumJob {
    pub points: Vec<PathBuf>,
    pub label: String,
}

impl SumJob {
    pub fn new(points: Vec<PathBuf>) -> Self {
        Self {
            points,
            label: DEFAULT_SUM_LABEL.to_string(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Merge every points table, check the result against the sum of the
/// input totals and write it under the job label.
pub fn run_sum(job: &SumJob, writer: &LedgerWriter) -> Result<RoundOutput> {
    if job.points.len() < 2 {
        return Err(AppError::InvalidJob(format!(
            "sum needs at least two points tables, got {}",
            job.points.len()
        )));
    }

    let mut tables = Vec::with_capacity(job.points.len());
    for path in &job.points {
        let table = Ledger::load_json(path)?;
        let total = table.total()?;
        info!("Loaded {} entries ({} points) from {:?}", table.len(), total, path);
        tables.push((table, total));
    }

    let inputs: Vec<(&Ledger, Amount)> =
        tables.iter().map(|(table, total)| (table, *total)).collect();
    let (merged, total) = merge_verified(&inputs, &job.label)?;

    let path = writer.write(&job.label, &merged)?;
    Ok(RoundOutput {
        label: job.label.clone(),
        total,
        participants: merged.len(),
        path,
        fingerprint: merged.fingerprint(),
    })
}
