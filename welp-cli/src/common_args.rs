// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::{fs, path::PathBuf, time::Duration};

use alloy::{
    network::EthereumWallet,
    primitives::{Address, FixedBytes, U256},
    providers::{Provider, ProviderBuilder},
    signers::{
        local::{LocalSigner, PrivateKeySigner},
        Signer,
    },
};
use eyre::{eyre, Context};
use welp_tools::core::{
    client::AlloyClient,
    network::NetworkConfig,
    orchestrator::FlowConfig,
    reader::ReaderConfig,
    registry::ContractRegistry,
    units,
};

use crate::{
    constants::{CHAIN_ID_ENV, DEFAULT_ENDPOINT, RPC_URL_ENV, SEPOLIA_CHAIN_ID},
    utils::{convert_gwei_to_wei, decode0x},
};

#[derive(Debug, clap::Args)]
pub struct AuthArgs {
    /// File path to a text file containing a hex-encoded private key
    #[arg(long)]
    private_key_path: Option<PathBuf>,
    /// Private key as a hex string. Warning: this exposes your key to shell history
    #[arg(long)]
    private_key: Option<String>,
    /// Path to an Ethereum wallet keystore file
    #[arg(long)]
    keystore_path: Option<String>,
    /// Keystore password file
    #[arg(long)]
    keystore_password_path: Option<PathBuf>,
    /// Optional max fee per gas in gwei units.
    #[arg(long)]
    max_fee_per_gas_gwei: Option<String>,
}

impl AuthArgs {
    fn build_signer(&self, chain_id: u64) -> eyre::Result<PrivateKeySigner> {
        if let Some(key) = &self.private_key {
            if key.is_empty() {
                return Err(eyre!("empty private key"));
            }
            return signer_from_hex(key, chain_id);
        }

        if let Some(file) = &self.private_key_path {
            let key = fs::read_to_string(file).wrap_err("could not open private key file")?;
            return signer_from_hex(&key, chain_id);
        }

        let keystore = self.keystore_path.as_ref().ok_or(eyre!(
            "no wallet: pass --private-key, --private-key-path or --keystore-path"
        ))?;
        let password = self
            .keystore_password_path
            .as_ref()
            .map(fs::read_to_string)
            .unwrap_or(Ok("".into()))?;

        let signer =
            LocalSigner::decrypt_keystore(keystore, password)?.with_chain_id(Some(chain_id));
        Ok(signer)
    }

    pub fn get_max_fee_per_gas_wei(&self) -> eyre::Result<Option<u128>> {
        self.max_fee_per_gas_gwei
            .as_ref()
            .map(|fee_str| convert_gwei_to_wei(fee_str))
            .transpose()
    }
}

fn signer_from_hex(key: &str, chain_id: u64) -> eyre::Result<PrivateKeySigner> {
    let bytes = decode0x(key)?;
    if bytes.len() != 32 {
        return Err(eyre!("private key must be 32 bytes, got {}", bytes.len()));
    }
    let priv_key_bytes: FixedBytes<32> = FixedBytes::from_slice(&bytes);
    Ok(PrivateKeySigner::from_bytes(&priv_key_bytes)?.with_chain_id(Some(chain_id)))
}

#[derive(Debug, clap::Args)]
pub struct ProviderArgs {
    /// Sepolia RPC endpoint
    #[arg(short, long, env = RPC_URL_ENV, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
    /// Chain id the endpoint must serve
    #[arg(long, env = CHAIN_ID_ENV, default_value_t = SEPOLIA_CHAIN_ID)]
    pub chain_id: u64,
}

impl ProviderArgs {
    pub fn network(&self) -> NetworkConfig {
        let default = NetworkConfig::default();
        if self.chain_id == default.chain_id {
            default
        } else {
            NetworkConfig {
                chain_id: self.chain_id,
                name: "custom network",
            }
        }
    }

    /// Read-only client. With an `account`, balances are reported for it.
    pub async fn connect(
        &self,
        account: Option<Address>,
    ) -> eyre::Result<AlloyClient<impl Provider>> {
        let provider = ProviderBuilder::new().connect(&self.endpoint).await?;
        let client =
            AlloyClient::connect(provider, ContractRegistry::default(), &self.network(), account)
                .await?;
        Ok(client)
    }

    /// Client that signs and submits with the wallet described by `auth`.
    pub async fn connect_with_wallet(
        &self,
        auth: &AuthArgs,
    ) -> eyre::Result<AlloyClient<impl Provider>> {
        let signer = auth.build_signer(self.chain_id)?;
        let address = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::new(signer))
            .connect(&self.endpoint)
            .await?;
        let client = AlloyClient::connect(
            provider,
            ContractRegistry::default(),
            &self.network(),
            Some(address),
        )
        .await?
        .with_max_fee_per_gas(auth.get_max_fee_per_gas_wei()?);
        Ok(client)
    }
}

#[derive(Debug, clap::Args)]
pub struct PresaleArgs {
    /// Tokens already sold before this session, as a decimal amount
    #[arg(long, default_value = "0")]
    sold_baseline: String,
}

impl PresaleArgs {
    pub fn sold_baseline(&self) -> eyre::Result<U256> {
        units::to_smallest_unit(&self.sold_baseline).wrap_err("invalid --sold-baseline")
    }
}

#[derive(Debug, clap::Args)]
pub struct FlowArgs {
    /// Seconds a buy or sell may take, from start to confirmation
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    confirmation_timeout_secs: u64,
    /// Confirmations required before a transaction counts as confirmed
    #[arg(long, default_value = "1", value_parser = clap::value_parser!(u64).range(1..))]
    confirmations: u64,
}

impl FlowArgs {
    pub fn config(&self, presale: &PresaleArgs) -> eyre::Result<FlowConfig> {
        Ok(FlowConfig::builder()
            .confirmation_timeout(Duration::from_secs(self.confirmation_timeout_secs))
            .confirmations(self.confirmations)
            .sold_baseline(presale.sold_baseline()?)
            .build())
    }
}

#[derive(Debug, clap::Args)]
pub struct PollArgs {
    /// Seconds between polling rounds
    #[arg(long, default_value = "5")]
    poll_interval_secs: u64,
}

impl PollArgs {
    pub fn config(&self) -> ReaderConfig {
        ReaderConfig::builder()
            .poll_interval(Duration::from_secs(self.poll_interval_secs.max(1)))
            .build()
    }
}
