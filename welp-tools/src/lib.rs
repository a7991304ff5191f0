// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Client-side orchestration for the Welp token presale.
//!
//! [`core`] holds the building blocks: contract bindings, unit conversion,
//! the chain client, the balance reader and the flow orchestrator. [`ops`]
//! composes them into user-level operations that print their results.

#[macro_use]
mod macros;

pub mod core;
pub(crate) mod error;
pub mod ops;
pub mod utils;

pub use error::{Error, Result};
