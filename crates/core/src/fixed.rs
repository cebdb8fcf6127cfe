//! Boundary conversion from floating token amounts to integer base units
//!
//! Query rows carry rewards as `f64` token amounts. They are converted once,
//! on the way in, from the shortest decimal rendering of the float. The
//! whole-token digits are scaled in 256 bits, so large rewards never
//! overflow. Digits below one base unit are rounded half up, but only when
//! the rounding stays within the `f64::DIGITS` significant digits a float
//! carries; anything coarser is rejected as lossy.

use primitive_types::U256;
use rust_decimal::Decimal;

use crate::{Amount, Result, RewardError};

/// Largest supported number of token decimals (10^18 fits in a `u64`)
pub const MAX_TOKEN_DECIMALS: u32 = 18;

/// Fixed-point scale of a token: `decimals` fractional digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    decimals: u32,
}

impl Default for FixedPoint {
    fn default() -> Self {
        Self { decimals: MAX_TOKEN_DECIMALS }
    }
}

impl FixedPoint {
    pub fn new(decimals: u32) -> Result<Self> {
        if decimals > MAX_TOKEN_DECIMALS {
            return Err(RewardError::InvalidAmount(format!(
                "token decimals {decimals} exceed {MAX_TOKEN_DECIMALS}"
            )));
        }
        Ok(Self { decimals })
    }

    pub fn decimals(&self) -> u32 {
        self.decimals
    }

    /// Convert a floating token amount into base units
    pub fn to_base_units(&self, value: f64) -> Result<Amount> {
        if !value.is_finite() {
            return Err(RewardError::Parse(format!("non-finite reward amount {value}")));
        }
        if value < 0.0 {
            return Err(RewardError::InvalidAmount(format!("negative reward amount {value}")));
        }
        if value == 0.0 {
            return Ok(Amount::zero());
        }

        // `Display` for f64 never uses exponent notation
        let rendered = value.to_string();
        let (whole, fraction) = rendered.split_once('.').unwrap_or((rendered.as_str(), ""));
        let width = self.decimals as usize;
        let (kept, dropped) = fraction.split_at(fraction.len().min(width));

        let truncated = U256::from_dec_str(&format!("{whole}{kept:0<width$}")).map_err(|_| {
            RewardError::InvalidAmount(format!("reward amount {value} too large to scale"))
        })?;

        if dropped.is_empty() {
            return Ok(Amount::from(truncated));
        }
        let dropped = Decimal::from_str_exact(&format!("0.{dropped}")).map_err(|e| {
            RewardError::Parse(format!(
                "reward amount {value} has precision far below 1e-{}: {e}",
                self.decimals
            ))
        })?;

        let (rounded, error) = if dropped >= Decimal::new(5, 1) {
            let up = truncated.checked_add(U256::one()).ok_or_else(|| {
                RewardError::InvalidAmount(format!("reward amount {value} too large to scale"))
            })?;
            (up, Decimal::ONE - dropped)
        } else {
            (truncated, dropped)
        };

        if !within_float_precision(rounded, error) {
            return Err(RewardError::Parse(format!(
                "reward amount {value} has precision below 1e-{} and would be truncated",
                self.decimals
            )));
        }
        Ok(Amount::from(rounded))
    }

    /// Render base units back as a decimal token amount
    pub fn format(&self, amount: Amount) -> String {
        amount.format_units(self.decimals)
    }
}

/// Whether moving `error` base units off `rounded` only touches digits
/// past the significant decimal digits of an `f64`
fn within_float_precision(rounded: U256, error: Decimal) -> bool {
    let significant = 10u64.pow(f64::DIGITS);
    if error.is_zero() || rounded >= U256::from(significant) {
        return true;
    }
    Decimal::from(rounded.low_u64()) / Decimal::from(significant) >= error
}
