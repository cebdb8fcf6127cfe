//! Ledger merging

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use tracing::debug;

use ssv_rewards_core::{Amount, Ledger, ParticipantId, Result, RewardError};

use crate::ensure_conserved;

/// Per-participant sum of two ledgers.
///
/// Participants present in only one input keep their amount; none are
/// dropped. Inputs are left untouched.
pub fn merge(a: &Ledger, b: &Ledger) -> Result<Ledger> {
    let mut merged: BTreeMap<ParticipantId, Amount> =
        a.iter().map(|(id, amount)| (id.clone(), amount)).collect();

    for (id, amount) in b.iter() {
        match merged.entry(id.clone()) {
            Entry::Occupied(mut existing) => {
                let sum = existing.get().checked_add(amount).ok_or_else(|| {
                    RewardError::InvalidAmount(format!("merged amount for {id} exceeds 256 bits"))
                })?;
                *existing.get_mut() = sum;
            }
            Entry::Vacant(slot) => {
                slot.insert(amount);
            }
        }
    }

    Ledger::from_entries(merged)
}

/// Merge any number of ledgers, left to right
pub fn merge_all<'a, I>(ledgers: I) -> Result<Ledger>
where
    I: IntoIterator<Item = &'a Ledger>,
{
    ledgers
        .into_iter()
        .try_fold(Ledger::new(), |acc, ledger| merge(&acc, ledger))
}

/// Merge ledgers that are each known to sum to their paired total, then
/// re-verify the merged ledger against the combined total.
///
/// Returns the merged ledger and the combined total.
pub fn merge_verified(inputs: &[(&Ledger, Amount)], context: &str) -> Result<(Ledger, Amount)> {
    let combined = inputs
        .iter()
        .try_fold(Amount::zero(), |acc, (_, total)| acc.checked_add(*total))
        .ok_or_else(|| {
            RewardError::InvalidAmount(format!("combined total for {context} exceeds 256 bits"))
        })?;

    let merged = merge_all(inputs.iter().map(|(ledger, _)| *ledger))?;
    ensure_conserved(&merged, combined, context)?;

    debug!(
        "Merged {} ledgers into {} participants ({}), total {}",
        inputs.len(),
        merged.len(),
        context,
        combined,
    );
    Ok((merged, combined))
}
