// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

pub mod client;
pub mod counter;
pub mod flow;
pub mod network;
pub mod orchestrator;
pub mod reader;
pub mod registry;
pub mod units;
