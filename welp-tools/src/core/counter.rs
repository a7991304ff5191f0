// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Locally maintained estimate of how many tokens the presale has sold.
//!
//! The sale contract exposes no sold-supply figure, so the client starts from
//! a baseline and applies its own confirmed buys and sells. Sales made from
//! other clients are not reflected, and the estimate resets with the process.

use alloy::primitives::U256;

use crate::core::{registry::PRESALE_CAP_TOKENS, units::UNIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoldCounter {
    sold: U256,
}

impl Default for SoldCounter {
    fn default() -> Self {
        Self::new(U256::ZERO)
    }
}

impl SoldCounter {
    /// Starts the counter at `baseline` smallest units.
    pub fn new(baseline: U256) -> Self {
        Self { sold: baseline }
    }

    pub fn sold(&self) -> U256 {
        self.sold
    }

    pub fn record_buy(&mut self, tokens: U256) {
        self.sold = self.sold.saturating_add(tokens);
    }

    /// Subtracts a confirmed sell. Selling back more than the baseline plus
    /// the buys seen here (tokens bought elsewhere) stops the estimate at
    /// zero instead of going negative.
    pub fn record_sell(&mut self, tokens: U256) {
        self.sold = self.sold.saturating_sub(tokens);
    }

    /// Share of `cap` sold, in percent, clamped to `[0, 100]` and kept to two
    /// decimals.
    pub fn percentage_of(&self, cap: U256) -> f64 {
        if cap.is_zero() {
            return 0.0;
        }
        let basis_points = self.sold.saturating_mul(U256::from(10_000)) / cap;
        let basis_points = basis_points.min(U256::from(10_000));
        basis_points.to::<u64>() as f64 / 100.0
    }

    /// Progress against the presale cap.
    pub fn supply_percentage(&self) -> f64 {
        self.percentage_of(presale_cap())
    }
}

/// Presale cap in smallest units.
pub fn presale_cap() -> U256 {
    U256::from(PRESALE_CAP_TOKENS) * UNIT
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(n: u64) -> U256 {
        U256::from(n) * UNIT
    }

    #[test]
    fn tracks_buys_and_sells() {
        let mut counter = SoldCounter::new(tokens(1_000));
        counter.record_buy(tokens(25));
        counter.record_sell(tokens(10));
        assert_eq!(counter.sold(), tokens(1_015));
    }

    #[test]
    fn never_goes_negative() {
        let mut counter = SoldCounter::default();
        counter.record_sell(tokens(5));
        assert_eq!(counter.sold(), U256::ZERO);
    }

    #[test]
    fn sell_beyond_baseline_and_buys_stops_at_zero() {
        let mut counter = SoldCounter::new(tokens(10));
        counter.record_buy(tokens(5));
        // exactly baseline plus buys
        counter.record_sell(tokens(15));
        assert_eq!(counter.sold(), U256::ZERO);

        let mut counter = SoldCounter::new(tokens(10));
        counter.record_buy(tokens(5));
        counter.record_sell(tokens(15) + U256::from(1));
        assert_eq!(counter.sold(), U256::ZERO);
        assert_eq!(counter.supply_percentage(), 0.0);

        // and counts up again from there
        counter.record_buy(tokens(3));
        assert_eq!(counter.sold(), tokens(3));
    }

    #[test]
    fn percentage_is_clamped() {
        let mut counter = SoldCounter::new(tokens(250_000));
        assert_eq!(counter.supply_percentage(), 25.0);
        counter.record_buy(tokens(5_000_000));
        assert_eq!(counter.supply_percentage(), 100.0);
        assert_eq!(SoldCounter::default().supply_percentage(), 0.0);
        assert_eq!(counter.percentage_of(U256::ZERO), 0.0);
    }

    #[test]
    fn percentage_keeps_two_decimals() {
        let counter = SoldCounter::new(tokens(12_345));
        assert_eq!(counter.supply_percentage(), 1.23);
    }
}
