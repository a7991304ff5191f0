// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Buying and selling from the command line.
//!
//! The flow runs alongside a renderer for its notices. If `interrupt`
//! resolves while a transaction is in flight, local tracking stops and the
//! flow ends as cancelled.

use std::future::Future;

use tokio::sync::broadcast::error::RecvError;

use crate::{
    core::{
        client::ChainClient,
        flow::{FlowKind, Notice, ToastKind},
        orchestrator::{FlowConfig, FlowReceipt, Orchestrator},
        reader::{BalanceReader, ReaderConfig},
        registry::TOKEN_SYMBOL,
    },
    utils::{
        color::{Color, DebugColor},
        format_native, format_progress, format_tokens,
    },
};

pub async fn buy(
    client: &impl ChainClient,
    amount: &str,
    config: FlowConfig,
    interrupt: impl Future<Output = ()>,
) -> eyre::Result<FlowReceipt> {
    trade(client, FlowKind::Buy, amount, config, interrupt).await
}

pub async fn sell(
    client: &impl ChainClient,
    amount: &str,
    config: FlowConfig,
    interrupt: impl Future<Output = ()>,
) -> eyre::Result<FlowReceipt> {
    trade(client, FlowKind::Sell, amount, config, interrupt).await
}

async fn trade<C: ChainClient>(
    client: &C,
    flow: FlowKind,
    amount: &str,
    config: FlowConfig,
    interrupt: impl Future<Output = ()>,
) -> eyre::Result<FlowReceipt> {
    let reader = BalanceReader::new(client, ReaderConfig::default());
    reader.refresh_all().await;
    let orchestrator = Orchestrator::new(client, &reader, config);

    match flow {
        FlowKind::Buy => {
            if let Ok(cost) = orchestrator.buy_cost(amount) {
                greyln!("buying {amount} {TOKEN_SYMBOL} for {}", format_native(Some(cost)));
            }
            orchestrator.set_buy_input(amount);
        }
        FlowKind::Sell => {
            if let Ok(payout) = orchestrator.sell_payout(amount) {
                greyln!("selling {amount} {TOKEN_SYMBOL} for {}", format_native(Some(payout)));
            }
            orchestrator.set_sell_input(amount);
        }
    }

    let mut notices = orchestrator.notices();
    let submitted = async {
        match flow {
            FlowKind::Buy => orchestrator.buy_from_input().await,
            FlowKind::Sell => orchestrator.sell_from_input().await,
        }
    };
    tokio::pin!(submitted, interrupt);

    let mut interrupted = false;
    let result = loop {
        tokio::select! {
            result = &mut submitted => break result,
            notice = notices.recv() => match notice {
                Ok(notice) => render(&notice),
                Err(RecvError::Lagged(skipped)) => debug!(@grey, "skipped {skipped} notices"),
                Err(RecvError::Closed) => {}
            },
            _ = &mut interrupt, if !interrupted => {
                interrupted = true;
                if orchestrator.cancel() {
                    warn!(@yellow, "interrupted, no longer tracking the transaction");
                }
            }
        }
    };
    while let Ok(notice) = notices.try_recv() {
        render(&notice);
    }
    // every notice has been printed
    orchestrator.dismiss_modal();
    orchestrator.acknowledge();
    let receipt = result?;

    reader.settle().await;
    let view = reader.view();
    let sold = orchestrator.state().sold;
    greyln!(
        "{TOKEN_SYMBOL} balance: {}",
        format_tokens(view.balances.token_balance, TOKEN_SYMBOL)
    );
    greyln!("balance: {}", format_native(view.balances.native_balance));
    greyln!("presale progress: {}", format_progress(sold.supply_percentage()));
    Ok(receipt)
}

fn render(notice: &Notice) {
    match notice {
        Notice::Toast(toast) => match toast.kind {
            ToastKind::Info => greyln!("{}", toast.message),
            ToastKind::Success => mintln!("{}", toast.message),
            ToastKind::Error => eprintln!("{}", toast.message.red()),
        },
        Notice::Success(modal) => {
            let verb = match modal.flow {
                FlowKind::Buy => "bought",
                FlowKind::Sell => "sold",
            };
            mintln!("{verb} {} {TOKEN_SYMBOL}", modal.amount);
            if let Some(tx_hash) = modal.tx_hash {
                greyln!("transaction: {}", tx_hash.debug_lavender());
            }
        }
    }
}
