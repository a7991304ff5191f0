// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! The single network the presale runs on.

use crate::utils::color::Color;

/// Chain id of the Sepolia test network.
pub const SEPOLIA_CHAIN_ID: u64 = 11_155_111;

/// Public Sepolia endpoint used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://ethereum-sepolia-rpc.publicnode.com";

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub name: &'static str,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            chain_id: SEPOLIA_CHAIN_ID,
            name: "sepolia",
        }
    }
}

impl NetworkConfig {
    /// Fails unless the node we are talking to serves the configured chain.
    pub fn check_chain_id(&self, actual: u64) -> Result<(), NetworkError> {
        if actual == self.chain_id {
            Ok(())
        } else {
            Err(NetworkError::WrongChain {
                expected: self.chain_id,
                name: self.name,
                actual,
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(
        "endpoint serves chain id {}, but the presale only runs on {name} ({})",
        .actual.to_string().red(),
        .expected.to_string().yellow()
    )]
    WrongChain {
        expected: u64,
        name: &'static str,
        actual: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_only_the_configured_chain() {
        let network = NetworkConfig::default();
        assert!(network.check_chain_id(SEPOLIA_CHAIN_ID).is_ok());
        let err = network.check_chain_id(1).unwrap_err();
        assert!(matches!(err, NetworkError::WrongChain { actual: 1, .. }));
    }
}
