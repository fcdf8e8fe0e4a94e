//! Conversion between decimal ui amounts and integer base units.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum AmountError {
    #[error("Invalid amount: `{0}`")]
    Invalid(String),

    #[error("Amount `{amount}` has more than {decimals} decimals")]
    TooManyDecimals { amount: String, decimals: u8 },

    #[error("Amount `{0}` overflows u64")]
    Overflow(String),
}

fn split_ui_amount(amount: &str) -> Result<(&str, &str), AmountError> {
    let trimmed = amount.trim();
    let (whole, fraction) = trimmed.split_once('.').unwrap_or((trimmed, ""));
    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::Invalid(amount.to_string()));
    }
    Ok((whole, fraction.trim_end_matches('0')))
}

/// Parses a decimal string such as `"0.001"` into base units of a token with
/// `decimals` decimals. Parsing is exact, no floating point is involved.
pub fn parse_ui_amount(amount: &str, decimals: u8) -> Result<u64, AmountError> {
    let (whole, fraction) = split_ui_amount(amount)?;
    if fraction.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals {
            amount: amount.to_string(),
            decimals,
        });
    }

    let overflow = || AmountError::Overflow(amount.to_string());
    let scale = 10u64.checked_pow(decimals as u32).ok_or_else(overflow)?;
    let whole = if whole.is_empty() {
        0
    } else {
        whole.parse::<u64>().map_err(|_| overflow())?
    };
    let fraction_units = if fraction.is_empty() {
        0
    } else {
        let padding = 10u64
            .checked_pow((decimals as usize - fraction.len()) as u32)
            .ok_or_else(overflow)?;
        fraction
            .parse::<u64>()
            .map_err(|_| overflow())?
            .checked_mul(padding)
            .ok_or_else(overflow)?
    };
    whole
        .checked_mul(scale)
        .and_then(|units| units.checked_add(fraction_units))
        .ok_or_else(overflow)
}

/// A syntactically valid decimal amount whose base units depend on the
/// decimals of the token it is applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UiAmount(String);

impl UiAmount {
    pub fn is_zero(&self) -> bool {
        !self.0.bytes().any(|b| (b'1'..=b'9').contains(&b))
    }

    pub fn to_base_units(&self, decimals: u8) -> Result<u64, AmountError> {
        parse_ui_amount(&self.0, decimals)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for UiAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        split_ui_amount(s)?;
        Ok(Self(s.trim().to_string()))
    }
}

impl fmt::Display for UiAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Formats base units as a decimal string without trailing zeros.
pub fn format_ui_amount(amount: u64, decimals: u8) -> String {
    if decimals == 0 {
        return amount.to_string();
    }
    let digits = format!("{:0>width$}", amount, width = decimals as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - decimals as usize);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}
