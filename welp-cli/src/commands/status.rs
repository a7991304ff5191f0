// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use alloy::primitives::Address;
use welp_tools::ops;

use crate::{
    common_args::{PresaleArgs, ProviderArgs},
    error::WelpCliResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Account to report balances for
    #[arg(long)]
    account: Option<Address>,
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    presale: PresaleArgs,
    #[command(flatten)]
    provider: ProviderArgs,
}

pub async fn exec(args: Args) -> WelpCliResult {
    let sold_baseline = args.presale.sold_baseline()?;
    let client = args.provider.connect(args.account).await?;
    ops::status(&client, &args.provider.network(), sold_baseline, args.json).await?;
    Ok(())
}
