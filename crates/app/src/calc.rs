//! `calc`: distribute round pools by points and merge the rounds

use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::{info, warn};

use ssv_rewards_core::{Amount, Ledger, RewardError};
use ssv_rewards_distribution::{distribute, ensure_conserved, merge_verified, RemainderPolicy};
use ssv_rewards_export::LedgerWriter;
use ssv_rewards_settings::Settings;

use crate::{AppError, Result};

/// One round: label, reward pool in base units and points file.
///
/// Parsed from `LABEL:AMOUNT:PATH`; only the first two colons separate
/// fields, so the path may contain more.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundSpec {
    pub label: String,
    pub total: Amount,
    pub points_path: PathBuf,
}

impl FromStr for RoundSpec {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parts = s.splitn(3, ':');
        let (Some(label), Some(amount), Some(path)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::InvalidJob(format!("round {s:?} is not LABEL:AMOUNT:PATH")));
        };
        let label = label.trim();
        if label.is_empty() || path.trim().is_empty() {
            return Err(AppError::InvalidJob(format!("round {s:?} has an empty label or path")));
        }
        let total = amount.parse::<Amount>().map_err(|source| AppError::Round {
            label: label.to_string(),
            source,
        })?;
        Ok(Self {
            label: label.to_string(),
            total,
            points_path: PathBuf::from(path.trim()),
        })
    }
}

/// Everything `run_calc` needs
#[derive(Debug, Clone)]
pub struct CalcJob {
    pub rounds: Vec<RoundSpec>,
    pub policy: RemainderPolicy,
    /// Label of the merged ledger, used with two or more rounds
    pub merged_label: String,
}

impl CalcJob {
    pub fn new(rounds: Vec<RoundSpec>, settings: &Settings) -> Self {
        Self {
            rounds,
            policy: settings.distribution.remainder_policy,
            merged_label: settings.distribution.merged_label.clone(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.rounds.is_empty() {
            return Err(AppError::InvalidJob("at least one round is required".to_string()));
        }
        let mut labels = HashSet::new();
        for round in &self.rounds {
            if !labels.insert(round.label.as_str()) {
                return Err(AppError::InvalidJob(format!("round label {} used twice", round.label)));
            }
        }
        if self.rounds.len() > 1 && labels.contains(self.merged_label.as_str()) {
            return Err(AppError::InvalidJob(format!(
                "merged label {} clashes with a round label",
                self.merged_label
            )));
        }
        Ok(())
    }
}

/// A ledger written by `run_calc`
#[derive(Debug, Clone)]
pub struct RoundOutput {
    pub label: String,
    pub total: Amount,
    pub participants: usize,
    pub path: PathBuf,
    pub fingerprint: String,
}

#[derive(Debug, Clone)]
pub struct CalcReport {
    pub rounds: Vec<RoundOutput>,
    /// Present with two or more rounds
    pub merged: Option<RoundOutput>,
}

/// Distribute every round, merge them, and write the ledgers.
///
/// Nothing is written unless every round and the merge pass their
/// conservation checks.
pub fn run_calc(job: &CalcJob, writer: &LedgerWriter) -> Result<CalcReport> {
    job.validate()?;

    let mut ledgers = Vec::with_capacity(job.rounds.len());
    for round in &job.rounds {
        let ledger = distribute_round(round, job.policy).map_err(|source| AppError::Round {
            label: round.label.clone(),
            source,
        })?;
        ledgers.push(ledger);
    }

    let merged = if job.rounds.len() > 1 {
        let inputs: Vec<(&Ledger, Amount)> = ledgers
            .iter()
            .zip(&job.rounds)
            .map(|(ledger, round)| (ledger, round.total))
            .collect();
        let context = format!("merged {}", job.merged_label);
        let merged = merge_verified(&inputs, &context).map_err(|source| AppError::Round {
            label: job.merged_label.clone(),
            source,
        })?;
        Some(merged)
    } else {
        None
    };

    let mut outputs = Vec::with_capacity(ledgers.len());
    for (ledger, round) in ledgers.iter().zip(&job.rounds) {
        outputs.push(write_output(writer, &round.label, round.total, ledger)?);
    }
    let merged = match merged {
        Some((ledger, total)) => Some(write_output(writer, &job.merged_label, total, &ledger)?),
        None => None,
    };

    Ok(CalcReport { rounds: outputs, merged })
}

fn distribute_round(
    round: &RoundSpec,
    policy: RemainderPolicy,
) -> std::result::Result<Ledger, RewardError> {
    info!(
        "Processing round {} ({} base units) from {:?}",
        round.label, round.total, round.points_path
    );
    let weights = Ledger::load_json(&round.points_path)?;

    let zero_weight = weights.iter().filter(|(_, w)| w.is_zero()).count();
    if zero_weight > 0 {
        warn!(
            "Round {}: {} of {} participants have zero points",
            round.label,
            zero_weight,
            weights.len()
        );
    }

    let ledger = distribute(&weights, round.total, policy)?;
    ensure_conserved(&ledger, round.total, &format!("round {}", round.label))?;
    info!("Round {} distributed across {} participants", round.label, ledger.len());
    Ok(ledger)
}

fn write_output(
    writer: &LedgerWriter,
    label: &str,
    total: Amount,
    ledger: &Ledger,
) -> Result<RoundOutput> {
    let path = writer.write(label, ledger)?;
    Ok(RoundOutput {
        label: label.to_string(),
        total,
        participants: ledger.len(),
        path,
        fingerprint: ledger.fingerprint(),
    })
}
