// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::registry::{ContractKind, ContractRegistry, TOKEN_SYMBOL},
    utils::color::Color,
};

/// Lists both contracts and every function the client calls on them.
pub fn print_contracts(registry: &ContractRegistry) {
    greyln!("token ({}): {}", TOKEN_SYMBOL.mint(), registry.token.to_string().lavender());
    greyln!("sale: {}", registry.sale.to_string().lavender());
    for kind in [ContractKind::Token, ContractKind::Sale] {
        greyln!("{kind} functions:");
        for function in ContractRegistry::functions()
            .iter()
            .filter(|function| function.contract == kind)
        {
            greyln!(
                "    {} {}",
                function.signature.lavender(),
                function.mutability.to_string()
            );
        }
    }
}
