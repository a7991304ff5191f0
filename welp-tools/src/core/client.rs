// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Wallet and node access.
//!
//! [`ChainClient`] is everything the orchestrator and reader need from the
//! outside world: a session, read calls, transaction submission, and a
//! receipt waiter. [`AlloyClient`] implements it on top of an alloy provider.

use alloy::{
    network::TransactionBuilder,
    primitives::{Address, TxHash, U256},
    providers::{PendingTransactionBuilder, Provider},
    rpc::types::TransactionRequest,
    transports::{RpcError, TransportErrorKind},
};
use serde_json::json;

use crate::{
    core::{
        network::{NetworkConfig, NetworkError},
        registry::{ContractRegistry, Submission, WelpToken, WelpTokenSale, TOKEN_SYMBOL},
        units::DECIMALS,
    },
    utils::color::DebugColor,
};

/// Wallet connection state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub connected: bool,
}

impl Session {
    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
            connected: true,
        }
    }

    /// The account to act for, if a wallet is connected.
    pub fn account(&self) -> Option<Address> {
        self.address.filter(|_| self.connected)
    }
}

/// A read-only query against the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainRead {
    NativeBalance(Address),
    TokenBalance(Address),
    TotalSupply,
    Decimals,
    BuyPrice,
    SellPrice,
}

/// What the client reports once a transaction has been mined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: TxHash,
    pub success: bool,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Token details handed to the wallet so it can display the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchAsset {
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

impl WatchAsset {
    pub fn presale_token(registry: &ContractRegistry) -> Self {
        Self {
            address: registry.token,
            symbol: TOKEN_SYMBOL.to_string(),
            decimals: DECIMALS as u8,
        }
    }

    /// Request body of `wallet_watchAsset` (EIP-747).
    pub fn params(&self) -> serde_json::Value {
        json!({
            "type": "ERC20",
            "options": {
                "address": self.address.to_string(),
                "symbol": self.symbol,
                "decimals": self.decimals,
            }
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("contract error: {0}")]
    Contract(#[from] alloy::contract::Error),
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    #[error("read failed: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("request rejected in wallet: {0}")]
    Rejected(String),
    #[error("no wallet connected")]
    NotConnected,
    #[error("{0}")]
    Failed(String),
}

/// EIP-1193 "user rejected the request".
const USER_REJECTED_CODE: i64 = 4001;

const REJECTION_KEYWORDS: &[&str] = &[
    "user rejected",
    "user denied",
    "rejected the request",
    "denied transaction",
    "request rejected",
    "user cancelled",
    "user canceled",
];

impl SubmitError {
    /// Splits wallet errors into user cancellations and everything else.
    pub fn classify(code: Option<i64>, message: impl Into<String>) -> Self {
        let message = message.into();
        let lowered = message.to_lowercase();
        if code == Some(USER_REJECTED_CODE)
            || REJECTION_KEYWORDS.iter().any(|kw| lowered.contains(kw))
        {
            Self::Rejected(message)
        } else {
            Self::Failed(message)
        }
    }

    pub fn is_user_rejection(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

impl From<RpcError<TransportErrorKind>> for SubmitError {
    fn from(err: RpcError<TransportErrorKind>) -> Self {
        let code = err.as_error_resp().map(|payload| payload.code);
        Self::classify(code, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReceiptError {
    #[error("failed waiting for receipt of {tx_hash}: {reason}")]
    Wait { tx_hash: TxHash, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("rpc error: {0}")]
    Rpc(#[from] RpcError<TransportErrorKind>),
    #[error("{0}")]
    Network(#[from] NetworkError),
}

/// The chain collaborator: session, reads, writes, and receipts.
#[allow(async_fn_in_trait)]
pub trait ChainClient {
    fn session(&self) -> Session;

    fn registry(&self) -> &ContractRegistry;

    async fn read(&self, query: ChainRead) -> Result<U256, ReadError>;

    /// Asks the wallet to sign and broadcast a call, returning its hash.
    async fn submit(&self, submission: &Submission) -> Result<TxHash, SubmitError>;

    /// Resolves once the transaction has the requested number of
    /// confirmations. Does not time out on its own.
    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<TxReceipt, ReceiptError>;

    async fn watch_asset(&self, asset: &WatchAsset) -> Result<bool, ClientError>;
}

/// [`ChainClient`] backed by an alloy provider.
///
/// The provider should carry a wallet filler when transactions are submitted;
/// a bare provider works for reads.
#[derive(Debug)]
pub struct AlloyClient<P> {
    provider: P,
    registry: ContractRegistry,
    session: Session,
    max_fee_per_gas_wei: Option<u128>,
}

impl<P: Provider> AlloyClient<P> {
    /// Verifies the provider serves the presale network, then opens a session
    /// for `signer` if one is given.
    pub async fn connect(
        provider: P,
        registry: ContractRegistry,
        network: &NetworkConfig,
        signer: Option<Address>,
    ) -> Result<Self, ClientError> {
        let chain_id = provider.get_chain_id().await?;
        network.check_chain_id(chain_id)?;
        debug!(@grey, "connected to {} (chain id {chain_id})", network.name);

        let session = signer.map(Session::connected).unwrap_or_default();
        if let Some(address) = session.address {
            info!(@grey, "wallet connected: {}", address.debug_lavender());
        }
        Ok(Self {
            provider,
            registry,
            session,
            max_fee_per_gas_wei: None,
        })
    }

    pub fn with_max_fee_per_gas(mut self, max_fee_per_gas_wei: Option<u128>) -> Self {
        self.max_fee_per_gas_wei = max_fee_per_gas_wei;
        self
    }
}

impl<P: Provider> ChainClient for AlloyClient<P> {
    fn session(&self) -> Session {
        self.session.clone()
    }

    fn registry(&self) -> &ContractRegistry {
        &self.registry
    }

    async fn read(&self, query: ChainRead) -> Result<U256, ReadError> {
        let token = WelpToken::new(self.registry.token, &self.provider);
        let sale = WelpTokenSale::new(self.registry.sale, &self.provider);
        let value = match query {
            ChainRead::NativeBalance(account) => self.provider.get_balance(account).await?,
            ChainRead::TokenBalance(account) => token.balanceOf(account).call().await?,
            ChainRead::TotalSupply => token.totalSupply().call().await?,
            ChainRead::Decimals => U256::from(token.decimals().call().await?),
            ChainRead::BuyPrice => sale.buyPrice().call().await?,
            ChainRead::SellPrice => sale.sellPrice().call().await?,
        };
        Ok(value)
    }

    async fn submit(&self, submission: &Submission) -> Result<TxHash, SubmitError> {
        let from = self.session().account().ok_or(SubmitError::NotConnected)?;
        let to = self.registry.address_of(submission.call.contract());

        let mut tx = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_value(submission.value)
            .with_input(submission.call.calldata());
        if let Some(max_fee) = self.max_fee_per_gas_wei {
            tx.max_fee_per_gas = Some(max_fee);
            tx.max_priority_fee_per_gas = Some(0);
        }

        let pending = self.provider.send_transaction(tx).await?;
        let tx_hash = *pending.tx_hash();
        debug!(@grey, "sent {} tx: {}", submission.call.signature(), tx_hash.debug_lavender());
        Ok(tx_hash)
    }

    async fn wait_for_receipt(
        &self,
        tx_hash: TxHash,
        confirmations: u64,
    ) -> Result<TxReceipt, ReceiptError> {
        let receipt = PendingTransactionBuilder::new(self.provider.root().clone(), tx_hash)
            .with_required_confirmations(confirmations)
            .get_receipt()
            .await
            .map_err(|err| ReceiptError::Wait {
                tx_hash,
                reason: err.to_string(),
            })?;
        Ok(TxReceipt {
            transaction_hash: receipt.transaction_hash,
            success: receipt.status(),
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
        })
    }

    async fn watch_asset(&self, asset: &WatchAsset) -> Result<bool, ClientError> {
        let added = self
            .provider
            .raw_request::<_, bool>("wallet_watchAsset".into(), asset.params())
            .await?;
        Ok(added)
    }
}
