// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Observable presale state and the transaction state machine.
//!
//! [`PresaleState`] is owned by the orchestrator and published through a
//! `tokio::sync::watch` channel. Every mutation goes through a method here so
//! the in-flight guard, terminal idempotence, and counter updates are applied
//! together.

use std::{fmt, time::Duration};

use alloy::primitives::{TxHash, U256};
use tokio::time::Instant;

use crate::core::counter::SoldCounter;

/// Identifies one buy or sell flow. A sell keeps the same id across its
/// approve and sell transactions.
pub type FlowId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    Buy,
    Sell,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
        }
    }
}

/// The on-chain operation a pending transaction stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Buy,
    Sell,
    Approve,
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buy => f.write_str("buy"),
            Self::Sell => f.write_str("sell"),
            Self::Approve => f.write_str("approve"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Idle,
    AwaitingWallet,
    Submitted,
    Confirmed,
    Failed,
    Cancelled,
    TimedOut,
}

impl TxStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Confirmed | Self::Failed | Self::Cancelled | Self::TimedOut
        )
    }

    pub fn can_become(self, next: TxStatus) -> bool {
        use TxStatus::*;
        matches!(
            (self, next),
            (Idle, AwaitingWallet | Failed | Cancelled)
                | (AwaitingWallet, Submitted | Failed | Cancelled)
                | (Submitted, Confirmed | Failed | Cancelled | TimedOut)
        )
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Idle => "idle",
            Self::AwaitingWallet => "awaiting wallet",
            Self::Submitted => "submitted",
            Self::Confirmed => "confirmed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed out",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub id: FlowId,
    pub flow: FlowKind,
    pub kind: TxKind,
    /// Amount as the user entered it when the flow started.
    pub amount: String,
    /// `amount` in smallest units.
    pub tokens: U256,
    pub submitted_hash: Option<TxHash>,
    pub status: TxStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

/// A short-lived notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub shown_at: Instant,
    pub ttl: Duration,
}

impl Toast {
    pub fn new(kind: ToastKind, message: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kind,
            message: message.into(),
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_visible(&self, now: Instant) -> bool {
        now < self.shown_at + self.ttl
    }
}

/// Celebration shown after a confirmed buy or sell, until dismissed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuccessModal {
    pub flow: FlowKind,
    pub amount: String,
    pub tx_hash: Option<TxHash>,
}

/// What the orchestrator broadcasts to renderers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Toast(Toast),
    Success(SuccessModal),
}

#[derive(Debug, Clone)]
pub struct PresaleState {
    pub pending: Option<PendingTransaction>,
    pub sold: SoldCounter,
    pub buy_input: String,
    pub sell_input: String,
    pub toast: Option<Toast>,
    pub modal: Option<SuccessModal>,
    next_id: FlowId,
}

impl PresaleState {
    pub fn new(sold: SoldCounter) -> Self {
        Self {
            pending: None,
            sold,
            buy_input: String::new(),
            sell_input: String::new(),
            toast: None,
            modal: None,
            next_id: 1,
        }
    }

    /// True while a flow holds the in-flight guard.
    pub fn is_transaction_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.status.is_terminal())
    }

    /// Starts a flow, or returns `None` if another one is still in flight.
    pub fn begin(&mut self, flow: FlowKind, amount: &str, tokens: U256) -> Option<FlowId> {
        if self.is_transaction_pending() {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        let kind = match flow {
            FlowKind::Buy => TxKind::Buy,
            FlowKind::Sell => TxKind::Approve,
        };
        self.pending = Some(PendingTransaction {
            id,
            flow,
            kind,
            amount: amount.to_string(),
            tokens,
            submitted_hash: None,
            status: TxStatus::Idle,
        });
        Some(id)
    }

    /// The live pending transaction of flow `id`, if it has not resolved.
    fn live_mut(&mut self, id: FlowId) -> Option<&mut PendingTransaction> {
        self.pending
            .as_mut()
            .filter(|pending| pending.id == id && !pending.status.is_terminal())
    }

    pub fn current(&self, id: FlowId) -> Option<&PendingTransaction> {
        self.pending.as_ref().filter(|pending| pending.id == id)
    }

    /// Moves flow `id` to `next`. Stale ids, terminal states and illegal
    /// edges are ignored and reported as `false`.
    pub fn transition(&mut self, id: FlowId, next: TxStatus) -> bool {
        match self.live_mut(id) {
            Some(pending) if pending.status.can_become(next) => {
                pending.status = next;
                true
            }
            _ => false,
        }
    }

    pub fn mark_submitted(&mut self, id: FlowId, tx_hash: TxHash) -> bool {
        match self.live_mut(id) {
            Some(pending) if pending.status.can_become(TxStatus::Submitted) => {
                pending.status = TxStatus::Submitted;
                pending.submitted_hash = Some(tx_hash);
                true
            }
            _ => false,
        }
    }

    /// Approve confirmed: the same flow continues with the sell transaction,
    /// reusing the amount captured when the flow began.
    pub fn advance_to_sell(&mut self, id: FlowId) -> bool {
        match self.live_mut(id) {
            Some(pending)
                if pending.kind == TxKind::Approve && pending.status == TxStatus::Submitted =>
            {
                pending.kind = TxKind::Sell;
                pending.submitted_hash = None;
                pending.status = TxStatus::AwaitingWallet;
                true
            }
            _ => false,
        }
    }

    /// Confirms the final transaction of a flow and applies its effect on the
    /// sold counter and form inputs. Returns the resolved transaction only
    /// the first time.
    pub fn confirm(&mut self, id: FlowId) -> Option<PendingTransaction> {
        let pending = self.live_mut(id)?;
        if pending.kind == TxKind::Approve || !pending.status.can_become(TxStatus::Confirmed) {
            return None;
        }
        pending.status = TxStatus::Confirmed;
        let resolved = pending.clone();
        match resolved.kind {
            TxKind::Buy => {
                self.sold.record_buy(resolved.tokens);
                self.buy_input.clear();
            }
            TxKind::Sell => {
                self.sold.record_sell(resolved.tokens);
                self.sell_input.clear();
            }
            TxKind::Approve => {}
        }
        Some(resolved)
    }

    /// Drops a resolved pending transaction once it has been shown.
    pub fn acknowledge(&mut self) {
        if !self.is_transaction_pending() {
            self.pending = None;
        }
    }

    pub fn visible_toast(&self, now: Instant) -> Option<&Toast> {
        self.toast.as_ref().filter(|toast| toast.is_visible(now))
    }

    pub fn dismiss_modal(&mut self) {
        self.modal = None;
    }
}
