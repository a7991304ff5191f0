// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Buy and sell flows.
//!
//! A buy is a single payable `buyTokens` call. A sell first approves the sale
//! contract for the amount, then calls `sellTokens` with the same amount
//! captured at the start of the flow. The whole flow, submissions and receipt
//! waits of both steps included, runs against one deadline; only local
//! tracking can be cancelled, never the transaction itself.

use std::time::Duration;

use alloy::primitives::{TxHash, U256};
use tokio::{
    sync::{broadcast, watch},
    time::{self, Instant},
};
use typed_builder::TypedBuilder;

use crate::{
    core::{
        client::{ChainClient, SubmitError, TxReceipt},
        counter::SoldCounter,
        flow::{
            FlowId, FlowKind, Notice, PresaleState, SuccessModal, Toast, ToastKind, TxKind,
            TxStatus,
        },
        reader::BalanceReader,
        registry::{PresaleCall, Submission, TOKEN_SYMBOL},
        units::{self, UnitsError},
    },
    utils::color::DebugColor,
};

const NOTICE_CAPACITY: usize = 32;

#[derive(Debug, Clone, TypedBuilder)]
pub struct FlowConfig {
    /// How long a flow may run, from its start, before tracking gives up.
    #[builder(default = Duration::from_secs(60))]
    pub confirmation_timeout: Duration,
    #[builder(default = 1)]
    pub confirmations: u64,
    /// Delay of the second refresh after a confirmed flow.
    #[builder(default = Duration::from_secs(3))]
    pub follow_up_refresh: Duration,
    #[builder(default = Duration::from_secs(5))]
    pub toast_ttl: Duration,
    /// Tokens already sold before this client started, in smallest units.
    #[builder(default)]
    pub sold_baseline: U256,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),
    #[error("no wallet connected")]
    NotConnected,
    #[error("another transaction is still in progress")]
    FlowInProgress,
    #[error("price quote unavailable")]
    QuoteUnavailable,
    #[error("{step} request cancelled in wallet")]
    UserCancelled { step: TxKind },
    #[error("{step} submission failed: {reason}")]
    WalletSubmissionFailed { step: TxKind, reason: String },
    #[error("{step} not confirmed within {timeout:?}")]
    ConfirmationTimeout {
        step: TxKind,
        /// `None` when the deadline passed before the wallet returned a hash.
        tx_hash: Option<TxHash>,
        timeout: Duration,
    },
    #[error("{step} tx failed on-chain: {reason}")]
    OnChainRevert { step: TxKind, reason: String },
    #[error("stopped tracking {step} tx")]
    TrackingCancelled { step: TxKind },
}

impl FlowError {
    /// The text shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidAmount(_) => "Please enter a valid amount".to_string(),
            Self::NotConnected => "Please connect your wallet first".to_string(),
            Self::FlowInProgress => {
                "Another transaction is still in progress, please wait for it to finish"
                    .to_string()
            }
            Self::QuoteUnavailable => {
                "The sale price is not available yet, please try again shortly".to_string()
            }
            Self::UserCancelled { step } => {
                format!("The {step} request was cancelled in your wallet")
            }
            Self::WalletSubmissionFailed { step, reason } => {
                format!("The {step} transaction could not be submitted: {reason}")
            }
            Self::ConfirmationTimeout { step, .. } => format!(
                "The {step} transaction is taking longer than expected. \
                 Your wallet/network action may still complete."
            ),
            Self::OnChainRevert { step, reason } => {
                format!("The {step} transaction failed: {reason}")
            }
            Self::TrackingCancelled { step } => format!(
                "Stopped tracking the {step} transaction. \
                 Your wallet/network action may still complete."
            ),
        }
    }

    /// Errors worth a diagnostic log entry rather than just a notice.
    pub fn is_unexpected(&self) -> bool {
        matches!(
            self,
            Self::WalletSubmissionFailed { .. } | Self::OnChainRevert { .. }
        )
    }

    /// The step of a sell (or the buy) at which the flow stopped, if it got
    /// that far.
    pub fn step(&self) -> Option<TxKind> {
        match self {
            Self::UserCancelled { step }
            | Self::WalletSubmissionFailed { step, .. }
            | Self::ConfirmationTimeout { step, .. }
            | Self::OnChainRevert { step, .. }
            | Self::TrackingCancelled { step } => Some(*step),
            _ => None,
        }
    }

    fn terminal_status(&self) -> TxStatus {
        match self {
            Self::UserCancelled { .. } | Self::TrackingCancelled { .. } => TxStatus::Cancelled,
            Self::ConfirmationTimeout { .. } => TxStatus::TimedOut,
            _ => TxStatus::Failed,
        }
    }

    fn toast_kind(&self) -> ToastKind {
        match self {
            Self::UserCancelled { .. }
            | Self::TrackingCancelled { .. }
            | Self::ConfirmationTimeout { .. } => ToastKind::Info,
            _ => ToastKind::Error,
        }
    }
}

/// A confirmed buy or sell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReceipt {
    pub flow: FlowKind,
    pub amount: String,
    pub tokens: U256,
    /// Native value paid for a buy, or the expected payout of a sell.
    pub value: Option<U256>,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Drives buy and sell flows and owns the observable [`PresaleState`].
pub struct Orchestrator<'a, C> {
    client: &'a C,
    reader: &'a BalanceReader<'a, C>,
    config: FlowConfig,
    state: watch::Sender<PresaleState>,
    notices: broadcast::Sender<Notice>,
    cancel: watch::Sender<bool>,
}

impl<'a, C: ChainClient> Orchestrator<'a, C> {
    pub fn new(client: &'a C, reader: &'a BalanceReader<'a, C>, config: FlowConfig) -> Self {
        let state = PresaleState::new(SoldCounter::new(config.sold_baseline));
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            client,
            reader,
            config,
            state: watch::Sender::new(state),
            notices,
            cancel: watch::Sender::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<PresaleState> {
        self.state.subscribe()
    }

    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.notices.subscribe()
    }

    pub fn state(&self) -> PresaleState {
        self.state.borrow().clone()
    }

    pub fn set_buy_input(&self, amount: &str) {
        self.state.send_modify(|state| state.buy_input = amount.to_string());
    }

    pub fn set_sell_input(&self, amount: &str) {
        self.state.send_modify(|state| state.sell_input = amount.to_string());
    }

    /// Closes the success modal.
    pub fn dismiss_modal(&self) {
        self.state.send_modify(PresaleState::dismiss_modal);
    }

    /// Forgets a resolved flow once its outcome has been shown.
    pub fn acknowledge(&self) {
        self.state.send_modify(PresaleState::acknowledge);
    }

    /// Native cost of buying `amount`, at the last known price.
    pub fn buy_cost(&self, amount: &str) -> Result<U256, FlowError> {
        let tokens = units::parse_positive_amount(amount)?;
        let quote = self.reader.quote().ok_or(FlowError::QuoteUnavailable)?;
        Ok(quote.buy_cost(tokens)?)
    }

    /// Native payout of selling `amount`, at the last known price.
    pub fn sell_payout(&self, amount: &str) -> Result<U256, FlowError> {
        let tokens = units::parse_positive_amount(amount)?;
        let quote = self.reader.quote().ok_or(FlowError::QuoteUnavailable)?;
        Ok(quote.sell_payout(tokens)?)
    }

    /// Stops tracking the in-flight flow, if there is one. The transaction
    /// itself may still be mined.
    pub fn cancel(&self) -> bool {
        if !self.state.borrow().is_transaction_pending() {
            return false;
        }
        self.cancel.send_replace(true);
        true
    }

    /// Buys whatever is currently in the buy input.
    pub async fn buy_from_input(&self) -> Result<FlowReceipt, FlowError> {
        let amount = self.state.borrow().buy_input.clone();
        self.submit_buy(&amount).await
    }

    /// Sells whatever is currently in the sell input. The amount is read once;
    /// later edits of the input do not affect this flow.
    pub async fn sell_from_input(&self) -> Result<FlowReceipt, FlowError> {
        let amount = self.state.borrow().sell_input.clone();
        self.submit_sell(&amount).await
    }

    pub async fn submit_buy(&self, amount: &str) -> Result<FlowReceipt, FlowError> {
        let result = self.run_buy(amount).await;
        self.report(FlowKind::Buy, &result);
        result
    }

    pub async fn submit_sell(&self, amount: &str) -> Result<FlowReceipt, FlowError> {
        let result = self.run_sell(amount).await;
        self.report(FlowKind::Sell, &result);
        result
    }

    async fn run_buy(&self, amount: &str) -> Result<FlowReceipt, FlowError> {
        let (id, tokens, deadline) = self.begin(FlowKind::Buy, amount)?;
        let result = async {
            let quote = match self.reader.quote() {
                Some(quote) => quote,
                None => self
                    .reader
                    .refresh_quote()
                    .await
                    .ok_or(FlowError::QuoteUnavailable)?,
            };
            let cost = quote.buy_cost(tokens)?;
            debug!(@grey, "buying {amount} {TOKEN_SYMBOL} for {} wei", cost);

            let submission =
                Submission::new(PresaleCall::BuyTokens { num_tokens: tokens }).with_value(cost);
            self.toast(ToastKind::Info, "Transaction submitted...");
            let receipt = self
                .execute(id, TxKind::Buy, &submission, deadline)
                .await?;
            self.complete(id, TxKind::Buy, Some(cost), receipt).await
        }
        .await;
        self.settle_failure(id, &result);
        result
    }

    async fn run_sell(&self, amount: &str) -> Result<FlowReceipt, FlowError> {
        let (id, tokens, deadline) = self.begin(FlowKind::Sell, amount)?;
        let result = async {
            let spender = self.client.registry().sale;
            let approve = Submission::new(PresaleCall::Approve {
                spender,
                amount: tokens,
            });
            self.toast(ToastKind::Info, "Approving tokens...");
            self.execute(id, TxKind::Approve, &approve, deadline)
                .await?;

            if !self.state.send_if_modified(|state| state.advance_to_sell(id)) {
                return Err(FlowError::TrackingCancelled {
                    step: TxKind::Approve,
                });
            }
            info!(@grey, "approval confirmed, selling {amount} {TOKEN_SYMBOL}");

            // `tokens` was captured when the flow began; the sell input may
            // have been edited since.
            let sell = Submission::new(PresaleCall::SellTokens { num_tokens: tokens });
            self.toast(ToastKind::Info, "Selling tokens...");
            let receipt = self.execute(id, TxKind::Sell, &sell, deadline).await?;

            let payout = self
                .reader
                .quote()
                .and_then(|quote| quote.sell_payout(tokens).ok());
            self.complete(id, TxKind::Sell, payout, receipt).await
        }
        .await;
        self.settle_failure(id, &result);
        result
    }

    /// Validates the input and takes the in-flight guard, returning the flow's
    /// deadline. Nothing here touches the wallet.
    fn begin(&self, flow: FlowKind, amount: &str) -> Result<(FlowId, U256, Instant), FlowError> {
        let tokens = units::parse_positive_amount(amount)?;
        if self.client.session().account().is_none() {
            return Err(FlowError::NotConnected);
        }

        let mut id = None;
        self.state.send_if_modified(|state| {
            id = state.begin(flow, amount.trim(), tokens);
            id.is_some()
        });
        let id = id.ok_or(FlowError::FlowInProgress)?;
        self.cancel.send_replace(false);
        debug!(@grey, "{flow} flow {id} started for {} {TOKEN_SYMBOL}", amount.trim());
        Ok((id, tokens, Instant::now() + self.config.confirmation_timeout))
    }

    /// Submits one transaction and waits for its receipt, giving up at
    /// `deadline`.
    async fn execute(
        &self,
        id: FlowId,
        step: TxKind,
        submission: &Submission,
        deadline: Instant,
    ) -> Result<TxReceipt, FlowError> {
        let mut cancelled = self.cancel.subscribe();
        let timeout = self.config.confirmation_timeout;
        self.state
            .send_if_modified(|state| state.transition(id, TxStatus::AwaitingWallet));

        let submitted = tokio::select! {
            submitted = self.client.submit(submission) => submitted,
            _ = time::sleep_until(deadline) => {
                return Err(FlowError::ConfirmationTimeout { step, tx_hash: None, timeout });
            }
            _ = cancelled.wait_for(|cancel| *cancel) => {
                return Err(FlowError::TrackingCancelled { step });
            }
        };
        let tx_hash = submitted.map_err(|err| match err {
            SubmitError::Rejected(_) => FlowError::UserCancelled { step },
            err => FlowError::WalletSubmissionFailed {
                step,
                reason: err.to_string(),
            },
        })?;
        self.state
            .send_if_modified(|state| state.mark_submitted(id, tx_hash));
        info!(@grey, "{step} tx submitted: {}", tx_hash.debug_lavender());

        let waited = tokio::select! {
            waited = self.client.wait_for_receipt(tx_hash, self.config.confirmations) => waited,
            _ = time::sleep_until(deadline) => {
                return Err(FlowError::ConfirmationTimeout {
                    step,
                    tx_hash: Some(tx_hash),
                    timeout,
                });
            }
            _ = cancelled.wait_for(|cancel| *cancel) => {
                return Err(FlowError::TrackingCancelled { step });
            }
        };
        let receipt = waited.map_err(|err| FlowError::OnChainRevert {
            step,
            reason: err.to_string(),
        })?;
        if !receipt.success {
            return Err(FlowError::OnChainRevert {
                step,
                reason: format!("transaction {tx_hash} reverted"),
            });
        }
        debug!(
            @grey,
            "{step} tx confirmed in block {:?}, {} gas used",
            receipt.block_number,
            receipt.gas_used
        );
        Ok(receipt)
    }

    /// Applies a confirmed final transaction: counter, inputs, refreshes and
    /// notices, in that order.
    async fn complete(
        &self,
        id: FlowId,
        step: TxKind,
        value: Option<U256>,
        receipt: TxReceipt,
    ) -> Result<FlowReceipt, FlowError> {
        let mut resolved = None;
        self.state.send_if_modified(|state| {
            resolved = state.confirm(id);
            resolved.is_some()
        });
        // a flow that already resolved (timeout, cancel) ignores late results
        let resolved = resolved.ok_or(FlowError::TrackingCancelled { step })?;

        self.reader.refresh_after_transaction().await;
        self.reader.schedule_refresh(self.config.follow_up_refresh);

        let message = match resolved.flow {
            FlowKind::Buy => format!("Purchase successful! Bought {} {TOKEN_SYMBOL}", resolved.amount),
            FlowKind::Sell => format!("Sale successful! Sold {} {TOKEN_SYMBOL}", resolved.amount),
        };
        self.toast(ToastKind::Success, message);
        self.celebrate(SuccessModal {
            flow: resolved.flow,
            amount: resolved.amount.clone(),
            tx_hash: Some(receipt.transaction_hash),
        });

        Ok(FlowReceipt {
            flow: resolved.flow,
            amount: resolved.amount,
            tokens: resolved.tokens,
            value,
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
        })
    }

    /// Moves a flow that ended in error to its terminal status. A flow that
    /// already resolved is left alone.
    fn settle_failure(&self, id: FlowId, result: &Result<FlowReceipt, FlowError>) {
        if let Err(err) = result {
            let status = err.terminal_status();
            self.state
                .send_if_modified(|state| state.transition(id, status));
        }
    }

    fn report(&self, flow: FlowKind, result: &Result<FlowReceipt, FlowError>) {
        let Err(err) = result else {
            return;
        };
        if err.is_unexpected() {
            error!(@red, "{flow} failed: {err}");
        } else {
            info!(@grey, "{flow} stopped: {err}");
        }
        self.toast(err.toast_kind(), err.user_message());
    }

    fn toast(&self, kind: ToastKind, message: impl Into<String>) {
        let toast = Toast::new(kind, message, self.config.toast_ttl);
        self.state
            .send_modify(|state| state.toast = Some(toast.clone()));
        // no subscribers is fine
        let _ = self.notices.send(Notice::Toast(toast));
    }

    fn celebrate(&self, modal: SuccessModal) {
        self.state
            .send_modify(|state| state.modal = Some(modal.clone()));
        let _ = self.notices.send(Notice::Success(modal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            client::ChainRead,
            reader::ReaderConfig,
            registry::SALE_ADDRESS,
            units::{from_smallest_unit, UNIT},
        },
        utils::testing::MockClient,
    };

    fn tokens(n: u64) -> U256 {
        U256::from(n) * UNIT
    }

    fn config() -> FlowConfig {
        FlowConfig::builder().sold_baseline(tokens(100)).build()
    }

    fn drain(rx: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    fn submitted_waiting(kind: TxKind) -> impl FnMut(&PresaleState) -> bool {
        move |state| {
            state
                .pending
                .as_ref()
                .is_some_and(|p| p.kind == kind && p.status == TxStatus::Submitted)
        }
    }

    #[tokio::test]
    async fn buy_end_to_end() {
        let client = MockClient::connected();
        client.update_chain(|chain| chain.buy_price = UNIT);
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        let mut notices = orchestrator.notices();

        orchestrator.set_buy_input("10");
        let cost = orchestrator.buy_cost("10").unwrap();
        assert_eq!(from_smallest_unit(cost), "10");

        let receipt = orchestrator.buy_from_input().await.unwrap();
        assert_eq!(receipt.amount, "10");
        assert_eq!(receipt.tokens, tokens(10));
        assert_eq!(receipt.value, Some(tokens(10)));

        assert_eq!(
            client.submissions(),
            [Submission::new(PresaleCall::BuyTokens {
                num_tokens: tokens(10)
            })
            .with_value(tokens(10))]
        );

        let state = orchestrator.state();
        assert_eq!(state.sold.sold(), tokens(110));
        assert!(state.buy_input.is_empty());
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::Confirmed);
        assert_eq!(state.modal.as_ref().unwrap().amount, "10");
        assert!(!state.is_transaction_pending());

        let notices = drain(&mut notices);
        assert!(notices.iter().any(|n| matches!(
            n,
            Notice::Toast(Toast { kind: ToastKind::Success, message, .. }) if message.contains("10")
        )));
        assert!(notices
            .iter()
            .any(|n| matches!(n, Notice::Success(modal) if modal.amount == "10")));

        // balances and supply were refreshed, and a second refresh is queued
        let view = reader.view();
        assert_eq!(view.balances.token_balance, Some(client.chain().token_balance));
        assert_eq!(view.balances.total_supply, Some(client.chain().total_supply));
        assert!(reader.has_scheduled_refresh());
    }

    #[tokio::test]
    async fn zero_sell_never_reaches_the_wallet() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        let orchestrator = Orchestrator::new(&client, &reader, config());
        let mut notices = orchestrator.notices();

        let err = orchestrator.submit_sell("0").await.unwrap_err();
        assert!(matches!(err, FlowError::InvalidAmount(UnitsError::NotPositive)));
        assert!(client.submissions().is_empty());
        assert!(orchestrator.state().pending.is_none());

        let notices = drain(&mut notices);
        assert_eq!(notices.len(), 1);
        assert!(matches!(
            &notices[0],
            Notice::Toast(Toast { kind: ToastKind::Error, message, .. })
                if message == "Please enter a valid amount"
        ));

        for bad in ["", "abc", "-1"] {
            assert!(matches!(
                orchestrator.submit_buy(bad).await,
                Err(FlowError::InvalidAmount(_))
            ));
        }
        assert!(client.submissions().is_empty());
    }

    #[tokio::test]
    async fn sell_uses_the_amount_captured_at_start() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.hold_receipts();

        orchestrator.set_sell_input("5");
        let mut state = orchestrator.subscribe();
        let (result, _) = tokio::join!(orchestrator.sell_from_input(), async {
            state
                .wait_for(submitted_waiting(TxKind::Approve))
                .await
                .unwrap();
            orchestrator.set_sell_input("99");
            client.release_receipts();
        });

        let receipt = result.unwrap();
        assert_eq!(receipt.amount, "5");
        assert_eq!(
            client.submissions(),
            [
                Submission::new(PresaleCall::Approve {
                    spender: SALE_ADDRESS,
                    amount: tokens(5)
                }),
                Submission::new(PresaleCall::SellTokens {
                    num_tokens: tokens(5)
                }),
            ]
        );
        let state = orchestrator.state();
        assert_eq!(state.sold.sold(), tokens(95));
        assert!(state.sell_input.is_empty());
        assert_eq!(state.pending.as_ref().unwrap().kind, TxKind::Sell);
    }

    #[tokio::test]
    async fn second_flow_is_rejected_while_one_is_in_flight() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.hold_receipts();

        let mut state = orchestrator.subscribe();
        let (first, _) = tokio::join!(orchestrator.submit_buy("1"), async {
            state.wait_for(submitted_waiting(TxKind::Buy)).await.unwrap();
            assert_eq!(
                orchestrator.submit_sell("1").await.unwrap_err(),
                FlowError::FlowInProgress
            );
            assert_eq!(
                orchestrator.submit_buy("2").await.unwrap_err(),
                FlowError::FlowInProgress
            );
            // the rejected attempts left the running flow untouched
            assert!(orchestrator.state().is_transaction_pending());
            client.release_receipts();
        });

        assert_eq!(first.unwrap().tokens, tokens(1));
        assert_eq!(client.submissions().len(), 1);
        assert_eq!(orchestrator.state().sold.sold(), tokens(101));
    }

    #[tokio::test(start_paused = true)]
    async fn confirmation_timeout_releases_the_guard() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        let mut notices = orchestrator.notices();
        client.hold_receipts();

        orchestrator.set_buy_input("3");
        let started = time::Instant::now();
        let err = orchestrator.buy_from_input().await.unwrap_err();
        assert!(started.elapsed() >= Duration::from_secs(60));
        assert!(matches!(
            err,
            FlowError::ConfirmationTimeout {
                step: TxKind::Buy,
                ..
            }
        ));
        assert!(err.user_message().contains("may still complete"));

        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::TimedOut);
        assert!(!state.is_transaction_pending());
        assert_eq!(state.sold.sold(), tokens(100));

        let timeouts = drain(&mut notices)
            .into_iter()
            .filter(|n| matches!(n, Notice::Toast(t) if t.message.contains("longer than expected")))
            .count();
        assert_eq!(timeouts, 1);

        // the timed-out transaction is mined after all: its receipt goes
        // through the confirmation path and changes nothing
        let pending = state.pending.unwrap();
        let late = TxReceipt {
            transaction_hash: pending.submitted_hash.unwrap(),
            success: true,
            block_number: Some(2_000),
            gas_used: 50_000,
        };
        assert_eq!(
            orchestrator
                .complete(pending.id, TxKind::Buy, None, late)
                .await
                .unwrap_err(),
            FlowError::TrackingCancelled { step: TxKind::Buy }
        );
        orchestrator.settle_failure(
            pending.id,
            &Err(FlowError::OnChainRevert {
                step: TxKind::Buy,
                reason: "late".to_string(),
            }),
        );
        let state = orchestrator.state();
        assert_eq!(state.sold.sold(), tokens(100));
        assert_eq!(state.buy_input, "3");
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::TimedOut);
        assert!(state.modal.is_none());
        assert!(drain(&mut notices).is_empty());

        // and a new flow can start
        client.release_receipts();
        orchestrator.submit_buy("1").await.unwrap();
        assert_eq!(orchestrator.state().sold.sold(), tokens(101));
    }

    #[tokio::test(start_paused = true)]
    async fn sell_shares_one_deadline_across_both_steps() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.set_receipt_delay(Duration::from_secs(45));

        let started = time::Instant::now();
        let err = orchestrator.submit_sell("2").await.unwrap_err();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(90), "{elapsed:?}");
        assert!(matches!(
            err,
            FlowError::ConfirmationTimeout {
                step: TxKind::Sell,
                tx_hash: Some(_),
                ..
            }
        ));

        // the approve went through, the sell was submitted but never confirmed
        assert_eq!(client.submissions().len(), 2);
        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::TimedOut);
        assert!(!state.is_transaction_pending());
        assert_eq!(state.sold.sold(), tokens(100));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_submission_times_out() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.hold_submits();

        let started = time::Instant::now();
        let err = orchestrator.submit_buy("1").await.unwrap_err();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(60), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(61), "{elapsed:?}");
        assert_eq!(
            err,
            FlowError::ConfirmationTimeout {
                step: TxKind::Buy,
                tx_hash: None,
                timeout: Duration::from_secs(60),
            }
        );
        assert!(client.submissions().is_empty());
        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::TimedOut);
        assert!(!state.is_transaction_pending());

        client.release_submits();
        orchestrator.submit_buy("1").await.unwrap();
        assert_eq!(orchestrator.state().sold.sold(), tokens(101));
    }

    #[tokio::test]
    async fn acknowledge_clears_a_finished_flow() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());

        orchestrator.submit_buy("1").await.unwrap();
        assert!(orchestrator.state().modal.is_some());
        orchestrator.dismiss_modal();
        orchestrator.acknowledge();
        let state = orchestrator.state();
        assert!(state.modal.is_none());
        assert!(state.pending.is_none());
        assert_eq!(state.sold.sold(), tokens(101));
    }

    #[tokio::test]
    async fn wallet_rejection_is_a_cancellation() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.fail_next_submit(SubmitError::classify(Some(4001), "User rejected the request."));

        let err = orchestrator.submit_buy("1").await.unwrap_err();
        assert_eq!(err, FlowError::UserCancelled { step: TxKind::Buy });
        assert!(!err.is_unexpected());
        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::Cancelled);
        assert_eq!(state.sold.sold(), tokens(100));
        assert_eq!(client.receipts_waited(), 0);
    }

    #[tokio::test]
    async fn submission_failure_is_reported() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.fail_next_submit(SubmitError::classify(None, "insufficient funds"));

        let err = orchestrator.submit_buy("1").await.unwrap_err();
        assert!(matches!(
            &err,
            FlowError::WalletSubmissionFailed { step: TxKind::Buy, reason } if reason.contains("insufficient funds")
        ));
        assert!(err.is_unexpected());
        assert_eq!(
            orchestrator.state().pending.unwrap().status,
            TxStatus::Failed
        );
    }

    #[tokio::test]
    async fn revert_fails_the_flow() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.revert_next_receipt();

        let err = orchestrator.submit_buy("1").await.unwrap_err();
        assert!(matches!(err, FlowError::OnChainRevert { step: TxKind::Buy, .. }));
        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::Failed);
        assert!(state.pending.as_ref().unwrap().submitted_hash.is_some());
        assert_eq!(state.sold.sold(), tokens(100));
    }

    #[tokio::test]
    async fn sell_failure_names_the_step() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());

        client.fail_next_submit(SubmitError::classify(None, "nonce too low"));
        let err = orchestrator.submit_sell("2").await.unwrap_err();
        assert_eq!(err.step(), Some(TxKind::Approve));
        assert!(client.submissions().is_empty());

        client.revert_receipt_after(1);
        let err = orchestrator.submit_sell("2").await.unwrap_err();
        assert_eq!(err.step(), Some(TxKind::Sell));
        assert_eq!(client.submissions().len(), 2);
        assert_eq!(orchestrator.state().sold.sold(), tokens(100));
    }

    #[tokio::test]
    async fn local_cancel_stops_tracking() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());
        client.hold_receipts();
        assert!(!orchestrator.cancel());

        let mut state = orchestrator.subscribe();
        let (result, _) = tokio::join!(orchestrator.submit_buy("4"), async {
            state.wait_for(submitted_waiting(TxKind::Buy)).await.unwrap();
            assert!(orchestrator.cancel());
        });

        let err = result.unwrap_err();
        assert_eq!(err, FlowError::TrackingCancelled { step: TxKind::Buy });
        assert!(err.user_message().contains("may still complete"));
        let state = orchestrator.state();
        assert_eq!(state.pending.as_ref().unwrap().status, TxStatus::Cancelled);
        assert_eq!(state.sold.sold(), tokens(100));

        // a stale cancel request does not leak into the next flow
        client.release_receipts();
        orchestrator.submit_buy("1").await.unwrap();
    }

    #[tokio::test]
    async fn requires_a_connected_wallet() {
        let client = MockClient::disconnected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        let orchestrator = Orchestrator::new(&client, &reader, config());
        assert_eq!(
            orchestrator.submit_buy("1").await.unwrap_err(),
            FlowError::NotConnected
        );
        assert!(client.submissions().is_empty());
    }

    #[tokio::test]
    async fn missing_quote_fails_without_submitting() {
        let client = MockClient::connected();
        client.set_reads_failing(true);
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        let orchestrator = Orchestrator::new(&client, &reader, config());

        let err = orchestrator.submit_buy("1").await.unwrap_err();
        assert_eq!(err, FlowError::QuoteUnavailable);
        assert!(client.submissions().is_empty());
        assert!(!orchestrator.state().is_transaction_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn counter_is_independent_of_background_reads() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let orchestrator = Orchestrator::new(&client, &reader, config());

        tokio::select! {
            _ = reader.poll() => unreachable!("poll never returns"),
            _ = async {
                orchestrator.submit_buy("30").await.unwrap();
                time::sleep(Duration::from_secs(12)).await;
                orchestrator.submit_sell("12.5").await.unwrap();
                time::sleep(Duration::from_secs(12)).await;
            } => {}
        }

        let expected = tokens(100) + tokens(30) - units::to_smallest_unit("12.5").unwrap();
        assert_eq!(orchestrator.state().sold.sold(), expected);
        assert!(client.read_count() > 0);
        assert_eq!(
            client.read(ChainRead::TotalSupply).await.unwrap(),
            reader.view().balances.total_supply.unwrap()
        );
    }
}
