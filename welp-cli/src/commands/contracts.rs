// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use welp_tools::{core::registry::ContractRegistry, ops};

use crate::error::WelpCliResult;

#[derive(Debug, clap::Args)]
pub struct Args {}

pub fn exec(_args: Args) -> WelpCliResult {
    ops::print_contracts(&ContractRegistry::default());
    Ok(())
}
