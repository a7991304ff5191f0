// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use welp_tools::{
    core::{orchestrator::FlowError, units},
    ops,
};

use crate::{
    common_args::{AuthArgs, FlowArgs, PresaleArgs, ProviderArgs},
    error::WelpCliResult,
    utils::ctrl_c,
};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Amount of WELP to buy, e.g. 10 or 0.5
    #[arg(allow_hyphen_values = true)]
    amount: String,

    #[command(flatten)]
    auth: AuthArgs,
    #[command(flatten)]
    flow: FlowArgs,
    #[command(flatten)]
    presale: PresaleArgs,
    #[command(flatten)]
    provider: ProviderArgs,
}

pub async fn exec(args: Args) -> WelpCliResult {
    // reject bad input before touching the wallet or the network
    units::parse_positive_amount(&args.amount).map_err(FlowError::from)?;
    let config = args.flow.config(&args.presale)?;
    let client = args.provider.connect_with_wallet(&args.auth).await?;
    ops::buy(&client, &args.amount, config, ctrl_c()).await?;
    Ok(())
}
