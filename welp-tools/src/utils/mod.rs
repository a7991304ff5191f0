// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! General purpose utilities.

use alloy::primitives::U256;
use color::{Color, GREY, MINT, PINK, YELLOW};

use crate::core::units::format_amount;

pub mod color;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

/// Digits shown after the decimal point for native currency amounts.
const NATIVE_DISPLAY_DIGITS: usize = 6;

/// Pretty-prints a native currency amount, e.g. a buy cost.
pub fn format_native(value: Option<U256>) -> String {
    match value {
        Some(value) => format!("{} ETH", format_amount(value, NATIVE_DISPLAY_DIGITS)).lavender(),
        None => "???".red(),
    }
}

/// Pretty-prints a token amount, or a placeholder while it is unknown.
pub fn format_tokens(value: Option<U256>, symbol: &str) -> String {
    match value {
        Some(value) => format!("{} {symbol}", format_amount(value, 2)).lavender(),
        None => "…".grey(),
    }
}

/// Pretty-prints presale progress, colored by how close it is to the cap.
pub fn format_progress(percentage: f64) -> String {
    let color = if percentage < 50.0 {
        MINT
    } else if percentage < 90.0 {
        YELLOW
    } else {
        PINK
    };
    format!("{color}{percentage:.2}%{GREY}")
}
