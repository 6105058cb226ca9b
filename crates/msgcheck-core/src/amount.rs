use std::fmt;
use std::ops::{Div, Mul};
use std::str::FromStr;

use num_bigint::{BigInt, Sign};
use num_traits::{CheckedDiv, Signed, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::constants::{FIL_DECIMALS, FIL_TICKER, MAX_AMOUNT_TEXT_LEN};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty amount")]
    Empty,

    #[error("amount text exceeds {max} characters")]
    TooLong { max: usize },

    #[error("invalid amount: {0:?}")]
    Malformed(String),

    #[error("too many decimal places: at most {max} allowed")]
    TooPrecise { max: u32 },

    #[error("unknown fee unit: {0}")]
    UnknownUnit(String),
}

// ── FeeUnit ──────────────────────────────────────────────────────────────────

/// Unit a human-facing amount text is denominated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeeUnit {
    /// Whole FIL, 18 fractional digits.
    #[default]
    Fil,
    /// attoFIL, integers only.
    AttoFil,
}

impl FeeUnit {
    pub fn decimals(self) -> u32 {
        match self {
            FeeUnit::Fil => FIL_DECIMALS,
            FeeUnit::AttoFil => 0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            FeeUnit::Fil => "FIL",
            FeeUnit::AttoFil => "attoFIL",
        }
    }
}

impl fmt::Display for FeeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for FeeUnit {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fil" => Ok(FeeUnit::Fil),
            "attofil" | "afil" => Ok(FeeUnit::AttoFil),
            other => Err(AmountError::UnknownUnit(other.to_string())),
        }
    }
}

// ── TokenAmount ──────────────────────────────────────────────────────────────

/// Signed arbitrary-precision amount in attoFIL.
///
/// Arithmetic is integer only: division truncates toward zero, which the fee
/// editor's bump operators depend on.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TokenAmount(BigInt);

impl TokenAmount {
    pub fn zero() -> Self {
        Self(BigInt::zero())
    }

    pub fn from_atto(atto: impl Into<BigInt>) -> Self {
        Self(atto.into())
    }

    pub fn atto(&self) -> &BigInt {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Strict decimal-integer parse of an attoFIL string: digits with an
    /// optional leading `-`, nothing else.
    pub fn from_atto_str(s: &str) -> Result<Self, AmountError> {
        let digits = s.strip_prefix('-').unwrap_or(s);
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AmountError::Malformed(s.to_string()));
        }
        BigInt::parse_bytes(s.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| AmountError::Malformed(s.to_string()))
    }

    /// Parse human decimal text denominated in `unit`.
    ///
    /// A trailing `fil` / `attofil` / `afil` suffix overrides `unit`.
    /// Fractional digits beyond the unit's precision are rejected unless
    /// they are zeros.
    pub fn parse_decimal(text: &str, unit: FeeUnit) -> Result<Self, AmountError> {
        let trimmed = text.trim();
        if trimmed.len() > MAX_AMOUNT_TEXT_LEN {
            return Err(AmountError::TooLong {
                max: MAX_AMOUNT_TEXT_LEN,
            });
        }

        let lower = trimmed.to_ascii_lowercase();
        let (body, unit) = if let Some(rest) = lower.strip_suffix("attofil") {
            (rest, FeeUnit::AttoFil)
        } else if let Some(rest) = lower.strip_suffix("afil") {
            (rest, FeeUnit::AttoFil)
        } else if let Some(rest) = lower.strip_suffix("fil") {
            (rest, FeeUnit::Fil)
        } else {
            (lower.as_str(), unit)
        };
        let body = body.trim_end();
        if body.is_empty() {
            return Err(AmountError::Empty);
        }

        let (negative, unsigned) = match body.as_bytes()[0] {
            b'-' => (true, &body[1..]),
            b'+' => (false, &body[1..]),
            _ => (false, body),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((i, f)) => (i, f),
            None => (unsigned, ""),
        };
        let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(AmountError::Malformed(text.to_string()));
        }

        let frac_part = frac_part.trim_end_matches('0');
        let decimals = unit.decimals();
        if frac_part.len() > decimals as usize {
            return Err(AmountError::TooPrecise { max: decimals });
        }

        let mut digits = String::with_capacity(int_part.len() + decimals as usize + 1);
        digits.push_str(if int_part.is_empty() { "0" } else { int_part });
        digits.push_str(frac_part);
        for _ in frac_part.len()..decimals as usize {
            digits.push('0');
        }

        let magnitude = BigInt::parse_bytes(digits.as_bytes(), 10)
            .ok_or_else(|| AmountError::Malformed(text.to_string()))?;
        Ok(Self(if negative { -magnitude } else { magnitude }))
    }

    /// Decimal text in `unit` without the ticker, trailing fractional zeros
    /// removed.
    pub fn to_unitless(&self, unit: FeeUnit) -> String {
        if self.0.is_zero() {
            return "0".to_string();
        }
        let decimals = unit.decimals() as usize;
        let mut digits = self.0.abs().to_str_radix(10);
        let sign = if self.0.sign() == Sign::Minus { "-" } else { "" };
        if decimals == 0 {
            return format!("{sign}{digits}");
        }
        if digits.len() <= decimals {
            digits = format!("{}{}", "0".repeat(decimals - digits.len() + 1), digits);
        }
        let (int_part, frac_part) = digits.split_at(digits.len() - decimals);
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            format!("{sign}{int_part}")
        } else {
            format!("{sign}{int_part}.{frac_part}")
        }
    }

    /// `self / rhs`, or `None` when `rhs` is zero.
    pub fn checked_div_int(&self, rhs: i64) -> Option<TokenAmount> {
        self.0.checked_div(&BigInt::from(rhs)).map(Self)
    }

    /// Integer quotient `self / rhs`, or `None` when `rhs` is zero.
    pub fn checked_ratio(&self, rhs: &TokenAmount) -> Option<BigInt> {
        self.0.checked_div(&rhs.0)
    }
}

impl From<i64> for TokenAmount {
    fn from(v: i64) -> Self {
        Self(BigInt::from(v))
    }
}

impl Mul<i64> for &TokenAmount {
    type Output = TokenAmount;

    fn mul(self, rhs: i64) -> TokenAmount {
        TokenAmount(&self.0 * rhs)
    }
}

impl Mul<i64> for TokenAmount {
    type Output = TokenAmount;

    fn mul(self, rhs: i64) -> TokenAmount {
        TokenAmount(self.0 * rhs)
    }
}

/// Truncating division. Panics on a zero divisor like the underlying
/// integer; use [`TokenAmount::checked_div_int`] when the divisor is
/// caller-supplied.
impl Div<i64> for &TokenAmount {
    type Output = TokenAmount;

    fn div(self, rhs: i64) -> TokenAmount {
        TokenAmount(&self.0 / rhs)
    }
}

impl Div<i64> for TokenAmount {
    type Output = TokenAmount;

    fn div(self, rhs: i64) -> TokenAmount {
        TokenAmount(self.0 / rhs)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_unitless(FeeUnit::Fil), FIL_TICKER)
    }
}

// Wire form is the decimal attoFIL string.
impl Serialize for TokenAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_str_radix(10))
    }
}

impl<'de> Deserialize<'de> for TokenAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TokenAmount::from_atto_str(&s).map_err(serde::de::Error::custom)
    }
}
