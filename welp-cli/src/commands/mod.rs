// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use crate::error::WelpCliResult;

mod buy;
mod contracts;
mod quote;
mod sell;
mod status;
mod watch;
mod watch_asset;

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Buy tokens from the sale contract
    #[clap(visible_alias = "b")]
    Buy(buy::Args),
    /// List the presale contracts and the functions used on them
    Contracts(contracts::Args),
    /// Show current prices, optionally pricing an amount
    #[clap(visible_alias = "q")]
    Quote(quote::Args),
    /// Approve and sell tokens back to the sale contract
    Sell(sell::Args),
    /// Show balances, supply, prices and presale progress
    Status(status::Args),
    /// Poll the presale and print changes until interrupted
    #[clap(visible_alias = "w")]
    Watch(watch::Args),
    /// Ask the wallet to track the presale token
    WatchAsset(watch_asset::Args),
}

pub async fn exec(cmd: Command) -> WelpCliResult {
    match cmd {
        Command::Buy(args) => buy::exec(args).await,
        Command::Contracts(args) => contracts::exec(args),
        Command::Quote(args) => quote::exec(args).await,
        Command::Sell(args) => sell::exec(args).await,
        Command::Status(args) => status::exec(args).await,
        Command::Watch(args) => watch::exec(args).await,
        Command::WatchAsset(args) => watch_asset::exec(args).await,
    }
}
