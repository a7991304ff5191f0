// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::{
    core::{
        client::ChainClient,
        orchestrator::FlowError,
        reader::{BalanceReader, PriceQuote, ReaderConfig},
        registry::TOKEN_SYMBOL,
        units,
    },
    utils::format_native,
};

/// Prints the current prices and, for an amount, what buying or selling it
/// would cost or pay.
pub async fn quote(client: &impl ChainClient, amount: Option<&str>) -> eyre::Result<PriceQuote> {
    let reader = BalanceReader::new(client, ReaderConfig::default());
    let quote = reader
        .refresh_quote()
        .await
        .ok_or(FlowError::QuoteUnavailable)?;

    greyln!("buy price: {} per {TOKEN_SYMBOL}", format_native(Some(quote.buy_price)));
    greyln!("sell price: {} per {TOKEN_SYMBOL}", format_native(Some(quote.sell_price)));

    if let Some(amount) = amount {
        let tokens = units::parse_positive_amount(amount).map_err(FlowError::from)?;
        greyln!(
            "buying {amount} {TOKEN_SYMBOL} costs {}",
            format_native(quote.buy_cost(tokens).ok())
        );
        greyln!(
            "selling {amount} {TOKEN_SYMBOL} pays {}",
            format_native(quote.sell_payout(tokens).ok())
        );
    }
    Ok(quote)
}
