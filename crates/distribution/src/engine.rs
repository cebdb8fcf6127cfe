//! Proportional distribution of an integer pool

use serde::{Deserialize, Serialize};
use tracing::debug;

use ssv_rewards_core::{Amount, Ledger, ParticipantId, Result, RewardError, WeightTable};

/// Who receives the integer rounding remainder of a distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Every participant but the last (in ascending identity order) gets
    /// the floor of their share; the last one gets whatever is left.
    #[default]
    LastParticipant,
    /// Floors for everyone, then one extra unit each to the participants
    /// with the largest division remainders (ties: ascending identity).
    LargestRemainder,
}

/// Split `total` across `weights` in proportion to each weight.
///
/// The result always sums to `total` exactly. Fails with `InvalidAmount`
/// when the weights sum to zero but `total` is positive.
pub fn distribute(weights: &WeightTable, total: Amount, policy: RemainderPolicy) -> Result<Ledger> {
    let sum_weights = weights.total()?;

    if sum_weights.is_zero() {
        if !total.is_zero() {
            return Err(RewardError::InvalidAmount(format!(
                "cannot distribute {total} across {} participants with zero total weight",
                weights.len()
            )));
        }
        return Ledger::from_entries(weights.iter().map(|(id, _)| (id.clone(), Amount::zero())));
    }

    let zero_weight = weights.iter().filter(|(_, w)| w.is_zero()).count();
    debug!(
        "Distributing {} over {} participants (total weight {}, {} with zero weight, {:?})",
        total,
        weights.len(),
        sum_weights,
        zero_weight,
        policy,
    );

    match policy {
        RemainderPolicy::LastParticipant => remainder_to_last(weights, total, sum_weights),
        RemainderPolicy::LargestRemainder => largest_remainder(weights, total, sum_weights),
    }
}

fn share_of(total: Amount, weight: Amount, sum_weights: Amount) -> Result<(Amount, Amount)> {
    total.mul_div_rem(weight, sum_weights).ok_or_else(|| {
        RewardError::InvalidAmount(format!("share of {total} for weight {weight} overflows"))
    })
}

fn overflow(what: &str) -> RewardError {
    RewardError::InvalidAmount(format!("{what} exceeds 256 bits"))
}

fn remainder_to_last(weights: &WeightTable, total: Amount, sum_weights: Amount) -> Result<Ledger> {
    let last_index = weights.len() - 1;
    let mut assigned = Amount::zero();
    let mut entries = Vec::with_capacity(weights.len());

    for (index, (id, weight)) in weights.iter().enumerate() {
        let amount = if index == last_index {
            total.checked_sub(assigned).ok_or_else(|| {
                RewardError::InvalidAmount(format!("assigned {assigned} exceeds total {total}"))
            })?
        } else {
            let (share, _) = share_of(total, weight, sum_weights)?;
            assigned = assigned.checked_add(share).ok_or_else(|| overflow("assigned amount"))?;
            share
        };
        entries.push((id.clone(), amount));
    }

    Ledger::from_entries(entries)
}

fn largest_remainder(weights: &WeightTable, total: Amount, sum_weights: Amount) -> Result<Ledger> {
    let mut shares: Vec<(ParticipantId, Amount, Amount)> = Vec::with_capacity(weights.len());
    let mut assigned = Amount::zero();

    for (id, weight) in weights.iter() {
        let (share, remainder) = share_of(total, weight, sum_weights)?;
        assigned = assigned.checked_add(share).ok_or_else(|| overflow("assigned amount"))?;
        shares.push((id.clone(), share, remainder));
    }

    let mut leftover = total.checked_sub(assigned).ok_or_else(|| {
        RewardError::InvalidAmount(format!("assigned {assigned} exceeds total {total}"))
    })?;

    // Stable sort keeps ascending identity order among equal remainders
    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| shares[b].2.cmp(&shares[a].2));

    let one = Amount::from(1u64);
    for index in order {
        if leftover.is_zero() {
            break;
        }
        let entry = &mut shares[index];
        entry.1 = entry.1.checked_add(one).ok_or_else(|| overflow("share"))?;
        leftover = leftover.checked_sub(one).ok_or_else(|| overflow("leftover"))?;
    }

    if !leftover.is_zero() {
        return Err(RewardError::InvalidAmount(format!(
            "{leftover} units left undistributed"
        )));
    }

    Ledger::from_entries(shares.into_iter().map(|(id, share, _)| (id, share)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify;

    fn table(json: &str) -> WeightTable {
        Ledger::from_json_str(json).unwrap()
    }

    fn amt(v: u64) -> Amount {
        Amount::from(v)
    }

    fn id(s: &str) -> ParticipantId {
        ParticipantId::parse(s).unwrap()
    }

    #[test]
    fn test_equal_weights_remainder_to_last() {
        let weights = table(r#"{"A": "1", "B": "1", "C": "1"}"#);
        let result = distribute(&weights, amt(10), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.get(&id("A")), Some(amt(3)));
        assert_eq!(result.get(&id("B")), Some(amt(3)));
        assert_eq!(result.get(&id("C")), Some(amt(4)));
        assert!(verify(&result, amt(10)));
    }

    #[test]
    fn test_zero_weight_participant_gets_nothing() {
        let weights = table(r#"{"A": "0", "B": "5"}"#);
        let result = distribute(&weights, amt(100), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.get(&id("A")), Some(amt(0)));
        assert_eq!(result.get(&id("B")), Some(amt(100)));
    }

    #[test]
    fn test_zero_weight_last_in_order_absorbs_remainder() {
        // The remainder rule is positional: Z sorts last, so it absorbs the rounding
        let weights = table(r#"{"A": "1", "B": "2", "Z": "0"}"#);
        let result = distribute(&weights, amt(10), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.get(&id("A")), Some(amt(3)));
        assert_eq!(result.get(&id("B")), Some(amt(6)));
        assert_eq!(result.get(&id("Z")), Some(amt(1)));
        assert!(verify(&result, amt(10)));
    }

    #[test]
    fn test_single_participant_takes_everything() {
        let weights = table(r#"{"solo": "3"}"#);
        let result =
            distribute(&weights, amt(1_000_003), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.get(&id("solo")), Some(amt(1_000_003)));
    }

    #[test]
    fn test_single_zero_weight_zero_total() {
        let weights = table(r#"{"solo": "0"}"#);
        let result = distribute(&weights, amt(0), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.get(&id("solo")), Some(amt(0)));
    }

    #[test]
    fn test_all_zero_weights_zero_total() {
        let weights = table(r#"{"A": "0", "B": "0", "C": "0"}"#);
        let result = distribute(&weights, amt(0), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|(_, a)| a.is_zero()));
    }

    #[test]
    fn test_all_zero_weights_positive_total_rejected() {
        let weights = table(r#"{"A": "0", "B": "0"}"#);
        let err = distribute(&weights, amt(1), RemainderPolicy::LastParticipant).unwrap_err();
        assert!(matches!(err, RewardError::InvalidAmount(_)));
    }

    #[test]
    fn test_empty_table() {
        let weights = Ledger::new();
        assert!(distribute(&weights, amt(0), RemainderPolicy::LastParticipant)
            .unwrap()
            .is_empty());
        assert!(matches!(
            distribute(&weights, amt(5), RemainderPolicy::LastParticipant),
            Err(RewardError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_does_not_mutate_input() {
        let weights = table(r#"{"A": "2", "B": "3"}"#);
        let before = weights.clone();
        distribute(&weights, amt(7), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(weights, before);
    }

    #[test]
    fn test_deterministic_across_calls() {
        let weights = table(r#"{"0x03": "7", "0x01": "11", "0x02": "13"}"#);
        let first = distribute(&weights, amt(1_000), RemainderPolicy::LastParticipant).unwrap();
        let second = distribute(&weights, amt(1_000), RemainderPolicy::LastParticipant).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_large_amounts_are_exact() {
        let weights = table(
            r#"{"a": "340282366920938463463374607431768211455", "b": "340282366920938463463374607431768211455", "c": "1"}"#,
        );
        let total: Amount = "100000000000000000000000000000000000000000".parse().unwrap();
        let result = distribute(&weights, total, RemainderPolicy::LastParticipant).unwrap();
        assert!(verify(&result, total));
        assert_eq!(result.get(&id("a")), result.get(&id("b")));
    }

    #[test]
    fn test_conservation_over_many_shapes() {
        for n in 1u64..=12 {
            let entries = (0..n).map(|i| (id(&format!("p{i:02}")), amt(i * i + (i % 3))));
            let weights = Ledger::from_entries(entries).unwrap();
            if weights.total().unwrap().is_zero() {
                continue;
            }
            for total in [0u64, 1, 7, 99, 1_000_000_007] {
                for policy in
                    [RemainderPolicy::LastParticipant, RemainderPolicy::LargestRemainder]
                {
                    let result = distribute(&weights, amt(total), policy).unwrap();
                    assert!(verify(&result, amt(total)), "n={n} total={total} {policy:?}");
                    assert_eq!(result.len(), weights.len());
                }
            }
        }
    }

    #[test]
    fn test_largest_remainder_spreads_units() {
        let weights = table(r#"{"A": "1", "B": "1", "C": "1"}"#);
        let result = distribute(&weights, amt(11), RemainderPolicy::LargestRemainder).unwrap();
        // 11/3 = 3 rem 2 each, two leftover units go to A and B (ties by identity)
        assert_eq!(result.get(&id("A")), Some(amt(4)));
        assert_eq!(result.get(&id("B")), Some(amt(4)));
        assert_eq!(result.get(&id("C")), Some(amt(3)));
    }

    #[test]
    fn test_largest_remainder_prefers_bigger_fraction() {
        // Exact shares: A=1.2, B=3.8 → B gets the leftover unit
        let weights = table(r#"{"A": "6", "B": "19"}"#);
        let result = distribute(&weights, amt(5), RemainderPolicy::LargestRemainder).unwrap();
        assert_eq!(result.get(&id("A")), Some(amt(1)));
        assert_eq!(result.get(&id("B")), Some(amt(4)));
    }

    #[test]
    fn test_remainder_policy_serde() {
        let json = serde_json::to_string(&RemainderPolicy::LargestRemainder).unwrap();
        assert_eq!(json, "\"largest_remainder\"");
        assert_eq!(RemainderPolicy::default(), RemainderPolicy::LastParticipant);
    }
}
