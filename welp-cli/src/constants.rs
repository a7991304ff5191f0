// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub use welp_tools::core::network::{DEFAULT_ENDPOINT, SEPOLIA_CHAIN_ID};

/// Overrides `--endpoint`.
pub const RPC_URL_ENV: &str = "WELP_RPC_URL";

/// Overrides `--chain-id`.
pub const CHAIN_ID_ENV: &str = "WELP_CHAIN_ID";

/// Exit code for input rejected before anything was sent.
pub const INVALID_INPUT_EXIT_CODE: u8 = 2;
