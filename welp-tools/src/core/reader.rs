// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Best-effort view of balances, supply, and prices.
//!
//! Reads are never retried. A failed read leaves the previous value in place,
//! so callers always see the last known data, possibly stale.

use std::time::Duration;

use alloy::primitives::{Address, U256};
use tokio::{
    sync::watch,
    time::{self, Instant, MissedTickBehavior},
};
use typed_builder::TypedBuilder;

use crate::{
    core::{
        client::{ChainClient, ChainRead},
        units::{self, UnitsError, DECIMALS},
    },
    utils::color::DebugColor,
};

/// Buy and sell rates, scaled by `10^18`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceQuote {
    pub buy_price: U256,
    pub sell_price: U256,
}

impl PriceQuote {
    /// Native currency owed for `tokens`, floored.
    pub fn buy_cost(&self, tokens: U256) -> Result<U256, UnitsError> {
        units::scale_by_price(tokens, self.buy_price)
    }

    /// Native currency paid out for `tokens`, floored.
    pub fn sell_payout(&self, tokens: U256) -> Result<U256, UnitsError> {
        units::scale_by_price(tokens, self.sell_price)
    }
}

/// Last known balances. `None` until the first successful read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BalanceSnapshot {
    pub native_balance: Option<U256>,
    pub token_balance: Option<U256>,
    pub total_supply: Option<U256>,
}

/// Everything the reader publishes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainView {
    pub account: Option<Address>,
    pub quote: Option<PriceQuote>,
    pub balances: BalanceSnapshot,
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct ReaderConfig {
    /// How often supply, prices and balances are polled.
    #[builder(default = Duration::from_secs(5))]
    pub poll_interval: Duration,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

pub struct BalanceReader<'a, C> {
    client: &'a C,
    config: ReaderConfig,
    view: watch::Sender<ChainView>,
    scheduled: watch::Sender<Option<Instant>>,
}

impl<'a, C: ChainClient> BalanceReader<'a, C> {
    pub fn new(client: &'a C, config: ReaderConfig) -> Self {
        let view = ChainView {
            account: client.session().account(),
            ..Default::default()
        };
        Self {
            client,
            config,
            view: watch::Sender::new(view),
            scheduled: watch::Sender::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ChainView> {
        self.view.subscribe()
    }

    pub fn view(&self) -> ChainView {
        self.view.borrow().clone()
    }

    pub fn quote(&self) -> Option<PriceQuote> {
        self.view.borrow().quote
    }

    /// Initial load: prices, decimals, balances and supply.
    pub async fn refresh_all(&self) {
        self.sync_account();
        self.refresh_quote().await;
        self.check_decimals().await;
        self.refresh_balances().await;
        self.refresh_supply().await;
    }

    /// Fetches both prices. The quote only changes if both reads succeed.
    pub async fn refresh_quote(&self) -> Option<PriceQuote> {
        let buy_price = self.fetch(ChainRead::BuyPrice).await;
        let sell_price = self.fetch(ChainRead::SellPrice).await;
        if let (Some(buy_price), Some(sell_price)) = (buy_price, sell_price) {
            let quote = PriceQuote {
                buy_price,
                sell_price,
            };
            self.view.send_if_modified(|view| {
                let changed = view.quote != Some(quote);
                view.quote = Some(quote);
                changed
            });
        }
        self.quote()
    }

    pub async fn refresh_balances(&self) {
        let Some(account) = self.view.borrow().account else {
            return;
        };
        let native = self.fetch(ChainRead::NativeBalance(account)).await;
        let token = self.fetch(ChainRead::TokenBalance(account)).await;
        self.view.send_if_modified(|view| {
            // the account may have changed while we were reading
            if view.account != Some(account) {
                return false;
            }
            let before = view.balances.clone();
            if native.is_some() {
                view.balances.native_balance = native;
            }
            if token.is_some() {
                view.balances.token_balance = token;
            }
            before != view.balances
        });
    }

    pub async fn refresh_supply(&self) {
        if let Some(supply) = self.fetch(ChainRead::TotalSupply).await {
            self.view.send_if_modified(|view| {
                let changed = view.balances.total_supply != Some(supply);
                view.balances.total_supply = Some(supply);
                changed
            });
        }
    }

    /// Refresh issued after a confirmed transaction.
    pub async fn refresh_after_transaction(&self) {
        self.refresh_balances().await;
        self.refresh_supply().await;
    }

    /// Queues a supply and balance refresh `delay` from now, to pick up state
    /// the node had not yet propagated.
    pub fn schedule_refresh(&self, delay: Duration) {
        let deadline = Instant::now() + delay;
        debug!(@grey, "follow-up refresh scheduled in {delay:?}");
        self.scheduled.send_replace(Some(deadline));
    }

    pub fn has_scheduled_refresh(&self) -> bool {
        self.scheduled.borrow().is_some()
    }

    /// One polling round. A changed wallet account triggers a full balance
    /// reload.
    pub async fn tick(&self) {
        if self.sync_account() {
            debug!(@grey, "wallet account changed, reloading balances");
        }
        self.refresh_quote().await;
        self.refresh_balances().await;
        self.refresh_supply().await;
    }

    /// Runs the refresh loop forever: the initial load, then one round per
    /// poll interval, plus any scheduled follow-up refreshes.
    pub async fn poll(&self) {
        let mut interval = time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut schedule = self.scheduled.subscribe();

        interval.tick().await;
        self.refresh_all().await;

        loop {
            let deadline = *schedule.borrow_and_update();
            tokio::select! {
                _ = interval.tick() => self.tick().await,
                _ = time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.run_scheduled().await;
                }
                _ = schedule.changed() => {}
            }
        }
    }

    /// Waits for a pending follow-up refresh, if any, and runs it.
    pub async fn settle(&self) {
        let deadline = *self.scheduled.borrow();
        if let Some(deadline) = deadline {
            time::sleep_until(deadline).await;
            self.run_scheduled().await;
        }
    }

    async fn run_scheduled(&self) {
        if self.scheduled.send_replace(None).is_some() {
            self.refresh_after_transaction().await;
        }
    }

    async fn check_decimals(&self) {
        if self.view.borrow().decimals.is_some() {
            return;
        }
        let Some(decimals) = self.fetch(ChainRead::Decimals).await else {
            return;
        };
        let decimals = decimals.saturating_to::<u8>();
        if usize::from(decimals) != DECIMALS {
            warn!(@yellow, "token reports {decimals} decimals, amounts assume {DECIMALS}");
        }
        self.view.send_modify(|view| view.decimals = Some(decimals));
    }

    /// Picks up the session's current account. Returns whether it changed.
    fn sync_account(&self) -> bool {
        let account = self.client.session().account();
        self.view.send_if_modified(|view| {
            if view.account == account {
                return false;
            }
            view.account = account;
            view.balances.native_balance = None;
            view.balances.token_balance = None;
            true
        })
    }

    async fn fetch(&self, query: ChainRead) -> Option<U256> {
        match self.client.read(query).await {
            Ok(value) => Some(value),
            Err(err) => {
                debug!(@grey, "read {} failed, keeping last value: {err}", query.debug_grey());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::units::UNIT, utils::testing::MockClient};

    fn tokens(n: u64) -> U256 {
        U256::from(n) * UNIT
    }

    #[tokio::test]
    async fn initial_load_fills_the_view() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;

        let view = reader.view();
        assert_eq!(view.account, client.session().account());
        assert_eq!(view.decimals, Some(18));
        let quote = view.quote.unwrap();
        assert_eq!(quote.buy_price, client.chain().buy_price);
        assert_eq!(view.balances.token_balance, Some(client.chain().token_balance));
        assert_eq!(view.balances.total_supply, Some(client.chain().total_supply));
    }

    #[tokio::test]
    async fn failed_reads_keep_stale_values() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let before = reader.view();

        client.set_reads_failing(true);
        client.update_chain(|chain| chain.total_supply = tokens(1));
        reader.tick().await;
        assert_eq!(reader.view(), before);

        client.set_reads_failing(false);
        reader.refresh_supply().await;
        assert_eq!(reader.view().balances.total_supply, Some(tokens(1)));
    }

    #[tokio::test]
    async fn disconnected_session_reads_only_public_state() {
        let client = MockClient::disconnected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        let view = reader.view();
        assert_eq!(view.account, None);
        assert_eq!(view.balances.token_balance, None);
        assert!(view.balances.total_supply.is_some());
        assert!(view.quote.is_some());
    }

    #[tokio::test]
    async fn account_change_resets_balances() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;
        assert!(reader.view().balances.token_balance.is_some());

        let other = Address::repeat_byte(0x42);
        client.switch_account(Some(other));
        client.set_reads_failing(true);
        reader.tick().await;
        let view = reader.view();
        assert_eq!(view.account, Some(other));
        assert_eq!(view.balances.token_balance, None);
    }

    #[tokio::test(start_paused = true)]
    async fn scheduled_refresh_runs_once() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        reader.refresh_all().await;

        client.update_chain(|chain| chain.total_supply = tokens(7));
        reader.schedule_refresh(Duration::from_secs(3));
        assert!(reader.has_scheduled_refresh());
        let started = Instant::now();
        reader.settle().await;
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(reader.view().balances.total_supply, Some(tokens(7)));
        assert!(!reader.has_scheduled_refresh());

        let reads = client.read_count();
        reader.settle().await;
        assert_eq!(client.read_count(), reads);
    }

    #[tokio::test(start_paused = true)]
    async fn polling_picks_up_new_supply() {
        let client = MockClient::connected();
        let reader = BalanceReader::new(&client, ReaderConfig::default());
        let mut view = reader.subscribe();

        tokio::select! {
            _ = reader.poll() => unreachable!("poll never returns"),
            _ = async {
                view.wait_for(|v| v.balances.total_supply.is_some()).await.unwrap();
                client.update_chain(|chain| chain.total_supply = tokens(99));
                view.wait_for(|v| v.balances.total_supply == Some(tokens(99))).await.unwrap();
            } => {}
        }
    }

    #[test]
    fn quote_scales_with_truncation() {
        let quote = PriceQuote {
            buy_price: UNIT,
            sell_price: UNIT / U256::from(2),
        };
        assert_eq!(quote.buy_cost(tokens(10)).unwrap(), tokens(10));
        assert_eq!(quote.sell_payout(tokens(10)).unwrap(), tokens(5));
        assert_eq!(quote.sell_payout(U256::from(1)).unwrap(), U256::ZERO);
    }
}
