// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! User-level operations. Each one drives the core and prints its outcome.

pub use contracts::print_contracts;
pub use quote::quote;
pub use status::{status, StatusReport};
pub use trade::{buy, sell};
pub use watch::watch;
pub use watch_asset::watch_asset;

mod contracts;
mod quote;
mod status;
mod trade;
mod watch;
mod watch_asset;
