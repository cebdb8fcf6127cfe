use std::fmt;
use std::str::FromStr;

use primitive_types::{U256, U512};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::{Result, RewardError};

/// Identity of a reward participant.
///
/// Either an EVM address / validator public key (`0x`-prefixed hex) or an
/// opaque label. Hex identities are canonicalised to lowercase so that
/// checksummed and lowercase spellings of one address collide. An
/// odd-length hex body is left-padded with one zero nibble, so `0xabc`
/// and `0x0abc` name the same participant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(RewardError::Parse("empty participant identity".to_string()));
        }

        let hex_body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"));
        match hex_body {
            Some(body) => {
                let body = if body.len() % 2 == 1 {
                    format!("0{body}")
                } else {
                    body.to_string()
                };
                let bytes = hex::decode(&body).map_err(|e| {
                    RewardError::Parse(format!("malformed hex identity {trimmed:?}: {e}"))
                })?;
                if bytes.is_empty() {
                    return Err(RewardError::Parse(format!("empty hex identity {trimmed:?}")));
                }
                Ok(Self(format!("0x{}", hex::encode(bytes))))
            }
            None => Ok(Self(trimmed.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ParticipantId {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ParticipantId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ParticipantId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(de::Error::custom)
    }
}

/// Exact non-negative token amount (or point weight) in base units.
///
/// Backed by a 256-bit unsigned integer. Arithmetic is checked: any sum
/// leaving the 256-bit range is reported instead of wrapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(U256);

/// Point weight of a participant within one round
pub type Weight = Amount;

impl Amount {
    pub fn zero() -> Self {
        Self(U256::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// `floor(self * numerator / denominator)` and the remainder of that
    /// division, computed with a 512-bit intermediate product.
    ///
    /// Returns `None` when `denominator` is zero or the quotient does not
    /// fit in 256 bits.
    pub fn mul_div_rem(self, numerator: Amount, denominator: Amount) -> Option<(Amount, Amount)> {
        if denominator.is_zero() {
            return None;
        }
        let product = self.0.full_mul(numerator.0);
        let (quotient, remainder) = product.div_mod(U512::from(denominator.0));
        let quotient = U256::try_from(quotient).ok()?;
        let remainder = U256::try_from(remainder).ok()?;
        Some((Amount(quotient), Amount(remainder)))
    }

    /// Sum of all amounts, `None` on 256-bit overflow
    pub fn checked_sum<'a, I>(amounts: I) -> Option<Amount>
    where
        I: IntoIterator<Item = &'a Amount>,
    {
        amounts
            .into_iter()
            .try_fold(Amount::zero(), |acc, amount| acc.checked_add(*amount))
    }

    /// Render as a decimal token string with `decimals` fractional digits,
    /// trailing zeros trimmed (`1500000000000000000` at 18 → `1.5`).
    pub fn format_units(&self, decimals: u32) -> String {
        let digits = self.0.to_string();
        let decimals = decimals as usize;
        if decimals == 0 {
            return digits;
        }

        let padded = if digits.len() <= decimals {
            format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits)
        } else {
            digits
        };
        let (int_part, frac_part) = padded.split_at(padded.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{int_part}.{frac_part}")
        }
    }
}

impl From<u64> for Amount {
    fn from(value: u64) -> Self {
        Self(U256::from(value))
    }
}

impl From<u128> for Amount {
    fn from(value: u128) -> Self {
        Self(U256::from(value))
    }
}

impl From<U256> for Amount {
    fn from(value: U256) -> Self {
        Self(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = RewardError;

    /// Parse a plain decimal integer string.
    ///
    /// A leading `-` followed by digits is a well-formed but negative
    /// value and yields `InvalidAmount`; anything else that is not all
    /// ASCII digits yields `Parse`.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(rest) = trimmed.strip_prefix('-') {
            if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
                return Err(RewardError::InvalidAmount(format!("negative value {trimmed}")));
            }
        }
        if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(RewardError::Parse(format!("{s:?} is not a decimal integer")));
        }
        U256::from_dec_str(trimmed)
            .map(Amount)
            .map_err(|_| RewardError::InvalidAmount(format!("{trimmed} exceeds 256 bits")))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Source of validator performance data used by the monthly reward query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PerformanceProvider {
    /// beaconcha.in attestation data
    #[default]
    Beaconcha,
    /// e2m performance data
    E2m,
}

impl PerformanceProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beaconcha => "beaconcha",
            Self::E2m => "e2m",
        }
    }
}

impl fmt::Display for PerformanceProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PerformanceProvider {
    type Err = RewardError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beaconcha" => Ok(Self::Beaconcha),
            "e2m" => Ok(Self::E2m),
            other => Err(RewardError::Parse(format!(
                "unknown performance provider {other:?} (want beaconcha or e2m)"
            ))),
        }
    }
}
