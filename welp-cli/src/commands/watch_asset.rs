// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use welp_tools::ops;

use crate::{
    common_args::{AuthArgs, ProviderArgs},
    error::WelpCliResult,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    #[command(flatten)]
    auth: AuthArgs,
    #[command(flatten)]
    provider: ProviderArgs,
}

pub async fn exec(args: Args) -> WelpCliResult {
    let client = args.provider.connect_with_wallet(&args.auth).await?;
    ops::watch_asset(&client).await?;
    Ok(())
}
