//! Console summary of the applied months

use ssv_rewards_aggregator::RewardTier;
use ssv_rewards_core::FixedPoint;

const HEADERS: [&str; 4] = ["Month", "Eligible Validators", "Tier Reward", "Total Rewards"];

/// Render the per-month summary as a box-drawn table.
///
/// ```text
/// ┌───────────────────┬─────────────────────┬──────────────┬───────────────┐
/// │ Month             │ Eligible Validators │ Tier Reward  │ Total Rewards │
/// ├───────────────────┼─────────────────────┼──────────────┼───────────────┤
/// │ 2023-10 (31 days) │ 2                   │ 0.05 SSV/day │ 3.1 SSV       │
/// └───────────────────┴─────────────────────┴──────────────┴───────────────┘
/// ```
pub fn render_summary(tiers: &[RewardTier], scale: &FixedPoint) -> String {
    let rows: Vec<[String; 4]> = tiers
        .iter()
        .map(|tier| {
            [
                format!("{} ({} days)", tier.month, tier.days),
                tier.validators.to_string(),
                format!("{} SSV/day", tier.daily_reward),
                format!("{} SSV", scale.format(tier.total_reward)),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    out.push_str(&border('┌', '┬', '┐', &widths));
    out.push_str(&line(&HEADERS.map(String::from), &widths));
    out.push_str(&border('├', '┼', '┤', &widths));
    for row in &rows {
        out.push_str(&line(row, &widths));
    }
    out.push_str(&border('└', '┴', '┘', &widths));
    out
}

fn border(left: char, mid: char, right: char, widths: &[usize; 4]) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line(cells: &[String; 4], widths: &[usize; 4]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!(" {cell:<width$} "))
        .collect();
    format!("│{}│\n", padded.join("│"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssv_rewards_core::Amount;

    #[test]
    fn test_render_summary() {
        let tiers = vec![RewardTier {
            month: "2023-10".parse().unwrap(),
            days: 31,
            validators: 2,
            daily_reward: 0.05,
            total_reward: Amount::from(3_100_000_000_000_000_000u128),
        }];
        let rendered = render_summary(&tiers, &FixedPoint::default());
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[1],
            "│ Month             │ Eligible Validators │ Tier Reward  │ Total Rewards │"
        );
        assert_eq!(
            lines[3],
            "│ 2023-10 (31 days) │ 2                   │ 0.05 SSV/day │ 3.1 SSV       │"
        );
        assert!(lines[0].starts_with('┌') && lines[0].ends_with('┐'));
        assert!(lines[4].starts_with('└'));
    }

    #[test]
    fn test_render_empty() {
        let rendered = render_summary(&[], &FixedPoint::default());
        assert_eq!(rendered.lines().count(), 4);
    }
}
