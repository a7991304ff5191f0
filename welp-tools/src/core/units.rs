// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Conversions between human decimal strings and 18-decimal smallest units.
//!
//! Every division truncates. Digits past the 18th decimal place are dropped,
//! never rounded, and price scaling floors.

use alloy::primitives::U256;

/// Number of decimals of the presale token and of the native currency.
pub const DECIMALS: usize = 18;

/// `10^18`, one whole token expressed in smallest units.
pub const UNIT: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("amount is empty")]
    Empty,
    #[error("amount must not be negative: {0}")]
    Negative(String),
    #[error("not a decimal number: {0}")]
    Malformed(String),
    #[error("amount must be greater than zero")]
    NotPositive,
    #[error("amount is too large: {0}")]
    Overflow(String),
}

/// Converts a decimal string such as `"12.5"` into smallest units.
///
/// Zero is accepted here; use [`parse_positive_amount`] for user input.
pub fn to_smallest_unit(amount: &str) -> Result<U256, UnitsError> {
    let amount = amount.trim();
    if amount.is_empty() {
        return Err(UnitsError::Empty);
    }
    if amount.starts_with('-') {
        return Err(UnitsError::Negative(amount.to_string()));
    }
    let digits = amount.strip_prefix('+').unwrap_or(amount);

    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (digits, ""),
    };
    let malformed = || UnitsError::Malformed(amount.to_string());
    if whole.is_empty() && fraction.is_empty() {
        return Err(malformed());
    }
    if !whole.bytes().chain(fraction.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    let overflow = || UnitsError::Overflow(amount.to_string());
    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| overflow())?
    };

    let kept = &fraction[..fraction.len().min(DECIMALS)];
    let fraction = if kept.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{kept:0<DECIMALS$}");
        U256::from_str_radix(&padded, 10).map_err(|_| malformed())?
    };

    whole
        .checked_mul(UNIT)
        .and_then(|scaled| scaled.checked_add(fraction))
        .ok_or_else(overflow)
}

/// Parses user input, rejecting anything that is not strictly positive once
/// truncated to smallest units.
pub fn parse_positive_amount(amount: &str) -> Result<U256, UnitsError> {
    let value = to_smallest_unit(amount)?;
    if value.is_zero() {
        return Err(UnitsError::NotPositive);
    }
    Ok(value)
}

/// Exact decimal representation of a smallest-unit value, without trailing
/// zeros.
pub fn from_smallest_unit(value: U256) -> String {
    let whole = value / UNIT;
    let fraction = value % UNIT;
    if fraction.is_zero() {
        return whole.to_string();
    }
    let fraction = format!("{:0>DECIMALS$}", fraction.to_string());
    format!("{whole}.{}", fraction.trim_end_matches('0'))
}

/// `tokens * price / 10^18`, floored.
///
/// Used for both the buy cost (with the buy price) and the sell payout (with
/// the sell price).
pub fn scale_by_price(tokens: U256, price: U256) -> Result<U256, UnitsError> {
    tokens
        .checked_mul(price)
        .map(|product| product / UNIT)
        .ok_or_else(|| UnitsError::Overflow(from_smallest_unit(tokens)))
}

/// Display form with thousands separators and at most `max_fraction_digits`
/// decimals (truncated).
pub fn format_amount(value: U256, max_fraction_digits: usize) -> String {
    let exact = from_smallest_unit(value);
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let fraction = fraction[..fraction.len().min(max_fraction_digits)].trim_end_matches('0');
    if fraction.is_empty() {
        grouped
    } else {
        format!("{grouped}.{fraction}")
    }
}
