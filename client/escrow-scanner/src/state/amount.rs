use std::fmt;
use std::str::FromStr;

use anchor_lang::solana_program::native_token::LAMPORTS_PER_SOL;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AmountParseError;

/// Number of fractional digits between lamports and SOL
pub const SOL_DECIMALS: usize = 9;

/// Exact SOL amount stored as lamports.
///
/// Rendered as fixed-point text with all nine fractional digits, so
/// 100 lamports display as `0.000000100`. No floating point is involved in
/// either direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SolAmount {
    lamports: u64,
}

impl SolAmount {
    pub const ZERO: SolAmount = SolAmount { lamports: 0 };

    pub const fn from_lamports(lamports: u64) -> Self {
        Self { lamports }
    }

    pub const fn lamports(&self) -> u64 {
        self.lamports
    }

    /// Whole SOL part
    pub const fn whole(&self) -> u64 {
        self.lamports / LAMPORTS_PER_SOL
    }

    /// Lamports below one SOL
    pub const fn fraction(&self) -> u64 {
        self.lamports % LAMPORTS_PER_SOL
    }

    pub fn checked_add(self, other: SolAmount) -> Option<SolAmount> {
        self.lamports.checked_add(other.lamports).map(SolAmount::from_lamports)
    }
}

impl From<u64> for SolAmount {
    fn from(lamports: u64) -> Self {
        Self::from_lamports(lamports)
    }
}

impl fmt::Display for SolAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:0width$}",
            self.whole(),
            self.fraction(),
            width = SOL_DECIMALS
        )
    }
}

impl FromStr for SolAmount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (whole, fraction) = match s.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (s, ""),
        };
        if whole.is_empty() && fraction.is_empty() {
            return Err(AmountParseError::Empty);
        }
        if fraction.len() > SOL_DECIMALS {
            return Err(AmountParseError::TooPrecise { max: SOL_DECIMALS });
        }

        let whole = parse_digits(whole)?;
        // Right-pad so "0.1" reads as 100_000_000 lamports
        let fraction = parse_digits(fraction)?
            .checked_mul(10u64.pow((SOL_DECIMALS - fraction.len()) as u32))
            .ok_or(AmountParseError::Overflow)?;

        whole
            .checked_mul(LAMPORTS_PER_SOL)
            .and_then(|lamports| lamports.checked_add(fraction))
            .map(SolAmount::from_lamports)
            .ok_or(AmountParseError::Overflow)
    }
}

fn parse_digits(digits: &str) -> Result<u64, AmountParseError> {
    digits.bytes().try_fold(0u64, |acc, b| {
        if !b.is_ascii_digit() {
            return Err(AmountParseError::InvalidDigit);
        }
        acc.checked_mul(10)
            .and_then(|acc| acc.checked_add(u64::from(b - b'0')))
            .ok_or(AmountParseError::Overflow)
    })
}

impl Serialize for SolAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SolAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}
