// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! In-memory [`ChainClient`] for exercising flows without a node.

use std::{
    collections::{HashMap, VecDeque},
    time::Duration,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Mutex, MutexGuard, PoisonError,
    },
};

use alloy::{
    primitives::{Address, TxHash, U256},
    transports::TransportErrorKind,
};
use tokio::{sync::watch, time};

use crate::core::{
    client::{
        ChainClient, ChainRead, ClientError, ReadError, ReceiptError, Session, SubmitError,
        TxReceipt, WatchAsset,
    },
    registry::{ContractRegistry, PresaleCall, Submission},
    units::UNIT,
};

/// Contract and account state behind a [`MockClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockChain {
    pub buy_price: U256,
    pub sell_price: U256,
    pub total_supply: U256,
    pub token_balance: U256,
    pub native_balance: U256,
    pub decimals: u8,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            buy_price: UNIT / U256::from(1000),
            sell_price: UNIT / U256::from(2000),
            total_supply: U256::from(250_000) * UNIT,
            token_balance: U256::from(1_000) * UNIT,
            native_balance: U256::from(5) * UNIT,
            decimals: 18,
        }
    }
}

impl MockChain {
    fn apply(&mut self, submission: &Submission) {
        match submission.call {
            PresaleCall::BuyTokens { num_tokens } => {
                self.token_balance += num_tokens;
                self.total_supply += num_tokens;
                self.native_balance = self.native_balance.saturating_sub(submission.value);
            }
            PresaleCall::SellTokens { num_tokens } => {
                self.token_balance = self.token_balance.saturating_sub(num_tokens);
                self.total_supply = self.total_supply.saturating_sub(num_tokens);
            }
            PresaleCall::Approve { .. } => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiptOutcome {
    Confirm,
    Revert,
}

/// Scriptable chain client. Submissions succeed and receipts confirm unless
/// told otherwise.
#[derive(Debug)]
pub struct MockClient {
    registry: ContractRegistry,
    session: Mutex<Session>,
    chain: Mutex<MockChain>,
    reads_failing: AtomicBool,
    reads: AtomicUsize,
    receipts_waited: AtomicUsize,
    submitted: Mutex<Vec<Submission>>,
    submit_failures: Mutex<VecDeque<SubmitError>>,
    receipt_outcomes: Mutex<VecDeque<ReceiptOutcome>>,
    receipts_open: watch::Sender<bool>,
    receipt_delay: Mutex<Duration>,
    submits_open: watch::Sender<bool>,
    mined: Mutex<HashMap<TxHash, Submission>>,
    next_hash: AtomicU64,
    watch_asset_fails: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockClient {
    pub fn new(session: Session) -> Self {
        Self {
            registry: ContractRegistry::default(),
            session: Mutex::new(session),
            chain: Mutex::default(),
            reads_failing: AtomicBool::new(false),
            reads: AtomicUsize::new(0),
            receipts_waited: AtomicUsize::new(0),
            submitted: Mutex::default(),
            submit_failures: Mutex::default(),
            receipt_outcomes: Mutex::default(),
            receipts_open: watch::Sender::new(true),
            receipt_delay: Mutex::new(Duration::ZERO),
            submits_open: watch::Sender::new(true),
            mined: Mutex::default(),
            next_hash: AtomicU64::new(1),
            watch_asset_fails: AtomicBool::new(false),
        }
    }

    pub fn connected() -> Self {
        Self::new(Session::connected(Address::repeat_byte(0x11)))
    }

    pub fn disconnected() -> Self {
        Self::new(Session::default())
    }

    pub fn chain(&self) -> MockChain {
        lock(&self.chain).clone()
    }

    pub fn update_chain(&self, f: impl FnOnce(&mut MockChain)) {
        f(&mut lock(&self.chain));
    }

    pub fn switch_account(&self, address: Option<Address>) {
        *lock(&self.session) = match address {
            Some(address) => Session::connected(address),
            None => Session::default(),
        };
    }

    pub fn set_reads_failing(&self, failing: bool) {
        self.reads_failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_watch_asset_failing(&self, failing: bool) {
        self.watch_asset_fails.store(failing, Ordering::SeqCst);
    }

    /// Number of read calls made, failed ones included.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn receipts_waited(&self) -> usize {
        self.receipts_waited.load(Ordering::SeqCst)
    }

    /// Successfully submitted transactions, in order.
    pub fn submissions(&self) -> Vec<Submission> {
        lock(&self.submitted).clone()
    }

    pub fn fail_next_submit(&self, err: SubmitError) {
        lock(&self.submit_failures).push_back(err);
    }

    pub fn revert_next_receipt(&self) {
        self.revert_receipt_after(0);
    }

    /// Confirms the next `confirmed` receipts, then reverts one.
    pub fn revert_receipt_after(&self, confirmed: usize) {
        let mut outcomes = lock(&self.receipt_outcomes);
        outcomes.extend(std::iter::repeat(ReceiptOutcome::Confirm).take(confirmed));
        outcomes.push_back(ReceiptOutcome::Revert);
    }

    /// Receipt waits block until [`release_receipts`](Self::release_receipts).
    pub fn hold_receipts(&self) {
        self.receipts_open.send_replace(false);
    }

    pub fn release_receipts(&self) {
        self.receipts_open.send_replace(true);
    }

    /// Every receipt takes `delay` to arrive.
    pub fn set_receipt_delay(&self, delay: Duration) {
        *lock(&self.receipt_delay) = delay;
    }

    /// Submissions block, as a wallet that never answers would, until
    /// [`release_submits`](Self::release_submits).
    pub fn hold_submits(&self) {
        self.submits_open.send_replace(false);
    }

    pub fn release_submits(&self) {
        self.submits_open.send_replace(true);
    }
}

impl ChainClient for MockClient {
    fn session(&self) -> Session {
        lock(&self.session).clone()
    }

    fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    async fn read(&self, query: ChainRead) -> Result<U256, ReadError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.reads_failing.load(Ordering::SeqCst) {
            return Err(ReadError::Other(format!("{query:?} unavailable")));
        }
        let account = self.session().account();
        let chain = lock(&self.chain);
        let own = |address: Address, value: U256| {
            if Some(address) == account {
                value
            } else {
                U256::ZERO
            }
        };
        Ok(match query {
            ChainRead::NativeBalance(address) => own(address, chain.native_balance),
            ChainRead::TokenBalance(address) => own(address, chain.token_balance),
            ChainRead::TotalSupply => chain.total_supply,
            ChainRead::Decimals => U256::from(chain.decimals),
            ChainRead::BuyPrice => chain.buy_price,
            ChainRead::SellPrice => chain.sell_price,
        })
    }

    async fn submit(&self, submission: &Submission) -> Result<TxHash, SubmitError> {
        if self.session().account().is_none() {
            return Err(SubmitError::NotConnected);
        }
        let mut open = self.submits_open.subscribe();
        let _ = open.wait_for(|open| *open).await;
        if let Some(err) = lock(&self.submit_failures).pop_front() {
            return Err(err);
        }
        let n = self.next_hash.fetch_add(1, Ordering::SeqCst);
        let tx_hash = TxHash::left_padding_from(&n.to_be_bytes());
        lock(&self.submitted).push(submission.clone());
        lock(&self.mined).insert(tx_hash, submission.clone());
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        _confirmations: u64,
    ) -> Result<TxReceipt, ReceiptError> {
        self.receipts_waited.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.receipt_delay);
        if !delay.is_zero() {
            time::sleep(delay).await;
        }
        let mut open = self.receipts_open.subscribe();
        let _ = open.wait_for(|open| *open).await;

        let outcome = lock(&self.receipt_outcomes)
            .pop_front()
            .unwrap_or(ReceiptOutcome::Confirm);
        let Some(submission) = lock(&self.mined).remove(&tx_hash) else {
            return Err(ReceiptError::Wait {
                tx_hash,
                reason: "unknown transaction".to_string(),
            });
        };
        let success = outcome == ReceiptOutcome::Confirm;
        if success {
            lock(&self.chain).apply(&submission);
        }
        Ok(TxReceipt {
            transaction_hash: tx_hash,
            success,
            block_number: Some(1_000 + self.receipts_waited() as u64),
            gas_used: 50_000,
        })
    }

    async fn watch_asset(&self, _asset: &WatchAsset) -> Result<bool, ClientError> {
        if self.watch_asset_fails.load(Ordering::SeqCst) {
            return Err(TransportErrorKind::custom_str("wallet_watchAsset is not supported").into());
        }
        Ok(true)
    }
}
