// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::client::{ChainClient, WatchAsset},
    utils::color::DebugColor,
};

/// Asks the wallet to track the presale token. Best-effort: a wallet that
/// declines or does not support the request is not an error.
pub async fn watch_asset(client: &impl ChainClient) -> eyre::Result<bool> {
    let asset = WatchAsset::presale_token(client.registry());
    match client.watch_asset(&asset).await {
        Ok(true) => {
            mintln!("{} added to wallet", asset.symbol);
            Ok(true)
        }
        Ok(false) => {
            greyln!("wallet declined to add {}", asset.symbol);
            Ok(false)
        }
        Err(err) => {
            warn!(@yellow, "could not add {} to wallet: {err}", asset.symbol);
            greyln!(
                "add it manually: address {}, decimals {}",
                asset.address.debug_lavender(),
                asset.decimals
            );
            Ok(false)
        }
    }
}
