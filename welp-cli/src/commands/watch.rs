// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use alloy::primitives::Address;
use welp_tools::ops;

use crate::{
    common_args::{PollArgs, PresaleArgs, ProviderArgs},
    error::WelpCliResult,
    utils::ctrl_c,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Account to report balances for
    #[arg(long)]
    account: Option<Address>,

    #[command(flatten)]
    poll: PollArgs,
    #[command(flatten)]
    presale: PresaleArgs,
    #[command(flatten)]
    provider: ProviderArgs,
}

pub async fn exec(args: Args) -> WelpCliResult {
    let sold_baseline = args.presale.sold_baseline()?;
    let client = args.provider.connect(args.account).await?;
    let printed = ops::watch(&client, args.poll.config(), sold_baseline, ctrl_c()).await?;
    log::debug!("watch printed {printed} updates");
    Ok(())
}
