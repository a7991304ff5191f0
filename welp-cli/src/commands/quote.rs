// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use welp_tools::{
    core::{orchestrator::FlowError, units},
    ops,
};

use crate::{common_args::ProviderArgs, error::WelpCliResult};

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Amount of WELP to price
    #[arg(allow_hyphen_values = true)]
    amount: Option<String>,

    #[command(flatten)]
    provider: ProviderArgs,
}

pub async fn exec(args: Args) -> WelpCliResult {
    if let Some(amount) = &args.amount {
        units::parse_positive_amount(amount).map_err(FlowError::from)?;
    }
    let client = args.provider.connect(None).await?;
    ops::quote(&client, args.amount.as_deref()).await?;
    Ok(())
}
