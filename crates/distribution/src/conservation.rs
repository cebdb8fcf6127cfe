//! Conservation checks: a ledger must sum to its intended total exactly

use tracing::{debug, warn};

use ssv_rewards_core::{Amount, Ledger, Result, RewardError};

/// `true` when the amounts in `result` sum exactly to `total`.
///
/// A sum that overflows 256 bits can never equal a valid total and
/// reports `false`.
pub fn verify(result: &Ledger, total: Amount) -> bool {
    Amount::checked_sum(result.amounts()) == Some(total)
}

/// Like [`verify`], but returns a `ConservationViolation` naming `context`
/// (the round, month or merge being checked) on mismatch.
pub fn ensure_conserved(result: &Ledger, total: Amount, context: &str) -> Result<()> {
    match Amount::checked_sum(result.amounts()) {
        Some(sum) if sum == total => {
            debug!(
                "Conservation check passed ({}): {} across {} participants",
                context,
                total,
                result.len()
            );
            Ok(())
        }
        sum => {
            let actual = sum.map_or_else(|| "overflow".to_string(), |s| s.to_string());
            warn!("Conservation check failed ({}): sum={} total={}", context, actual, total);
            Err(RewardError::ConservationViolation {
                context: context.to_string(),
                expected: total.to_string(),
                actual,
            })
        }
    }
}
