// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use alloy::primitives::U256;
use serde::Serialize;

use crate::{
    core::{
        client::ChainClient,
        counter::{presale_cap, SoldCounter},
        network::NetworkConfig,
        reader::{BalanceReader, ChainView, ReaderConfig},
        registry::{ContractRegistry, TOKEN_SYMBOL},
        units::from_smallest_unit,
    },
    utils::{color::DebugColor, format_native, format_progress, format_tokens},
};

/// Machine readable snapshot of the presale. Amounts are exact decimal
/// strings in whole-token (or whole-native) units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub network: String,
    pub chain_id: u64,
    pub token_address: String,
    pub sale_address: String,
    pub account: Option<String>,
    pub native_balance: Option<String>,
    pub token_balance: Option<String>,
    pub total_supply: Option<String>,
    pub buy_price: Option<String>,
    pub sell_price: Option<String>,
    pub tokens_sold: String,
    pub presale_cap: String,
    pub supply_percentage: f64,
}

impl StatusReport {
    pub fn new(
        view: &ChainView,
        sold: &SoldCounter,
        network: &NetworkConfig,
        registry: &ContractRegistry,
    ) -> Self {
        let exact = |value: Option<U256>| value.map(from_smallest_unit);
        Self {
            network: network.name.to_string(),
            chain_id: network.chain_id,
            token_address: registry.token.to_string(),
            sale_address: registry.sale.to_string(),
            account: view.account.map(|account| account.to_string()),
            native_balance: exact(view.balances.native_balance),
            token_balance: exact(view.balances.token_balance),
            total_supply: exact(view.balances.total_supply),
            buy_price: exact(view.quote.map(|quote| quote.buy_price)),
            sell_price: exact(view.quote.map(|quote| quote.sell_price)),
            tokens_sold: from_smallest_unit(sold.sold()),
            presale_cap: from_smallest_unit(presale_cap()),
            supply_percentage: sold.supply_percentage(),
        }
    }

    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Human readable form of a reader view, shared with `watch`.
pub(crate) fn print_view(view: &ChainView, sold: &SoldCounter) {
    match view.account {
        Some(account) => greyln!("account: {}", account.debug_lavender()),
        None => greyln!("account: not connected"),
    }
    if view.account.is_some() {
        greyln!("balance: {}", format_native(view.balances.native_balance));
        greyln!(
            "{TOKEN_SYMBOL} balance: {}",
            format_tokens(view.balances.token_balance, TOKEN_SYMBOL)
        );
    }
    greyln!(
        "total supply: {}",
        format_tokens(view.balances.total_supply, TOKEN_SYMBOL)
    );
    greyln!(
        "buy price: {} per {TOKEN_SYMBOL}",
        format_native(view.quote.map(|quote| quote.buy_price))
    );
    greyln!(
        "sell price: {} per {TOKEN_SYMBOL}",
        format_native(view.quote.map(|quote| quote.sell_price))
    );
    greyln!(
        "presale progress: {} of {} sold ({})",
        format_tokens(Some(sold.sold()), TOKEN_SYMBOL),
        format_tokens(Some(presale_cap()), TOKEN_SYMBOL),
        format_progress(sold.supply_percentage())
    );
}

/// Loads everything once and reports it.
pub async fn status(
    client: &impl ChainClient,
    network: &NetworkConfig,
    sold_baseline: U256,
    json: bool,
) -> eyre::Result<StatusReport> {
    let reader = BalanceReader::new(client, ReaderConfig::default());
    reader.refresh_all().await;
    let view = reader.view();
    let sold = SoldCounter::new(sold_baseline);

    let report = StatusReport::new(&view, &sold, network, client.registry());
    if json {
        println!("{}", report.to_json()?);
    } else {
        print_view(&view, &sold);
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{client::ChainClient, units::UNIT},
        utils::testing::MockClient,
    };

    #[tokio::test]
    async fn report_uses_exact_amounts() {
        let client = MockClient::connected();
        client.update_chain(|chain| chain.token_balance = UNIT + UNIT / U256::from(4));
        let baseline = U256::from(250_000) * UNIT;
        let report = status(&client, &NetworkConfig::default(), baseline, true)
            .await
            .unwrap();

        assert_eq!(report.chain_id, 11_155_111);
        assert_eq!(report.token_balance.as_deref(), Some("1.25"));
        assert_eq!(report.tokens_sold, "250000");
        assert_eq!(report.presale_cap, "1000000");
        assert_eq!(report.supply_percentage, 25.0);
        assert_eq!(
            report.account,
            client.session().account().map(|a| a.to_string())
        );

        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["token_balance"], "1.25");
        assert_eq!(json["network"], "sepolia");
    }

    #[tokio::test]
    async fn report_without_wallet_or_data() {
        let client = MockClient::disconnected();
        client.set_reads_failing(true);
        let report = status(&client, &NetworkConfig::default(), U256::ZERO, false)
            .await
            .unwrap();
        assert_eq!(report.account, None);
        assert_eq!(report.total_supply, None);
        assert_eq!(report.buy_price, None);
        assert_eq!(report.supply_percentage, 0.0);
    }
}
