// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

use std::future::Future;

use alloy::primitives::U256;

use super::status::print_view;
use crate::core::{
    client::ChainClient,
    counter::SoldCounter,
    reader::{BalanceReader, ChainView, ReaderConfig},
};

/// Keeps the reader polling and prints the view whenever it settles on new
/// values, until `interrupt` resolves. Returns the number of views printed.
pub async fn watch(
    client: &impl ChainClient,
    config: ReaderConfig,
    sold_baseline: U256,
    interrupt: impl Future<Output = ()>,
) -> eyre::Result<usize> {
    let poll_interval = config.poll_interval;
    let reader = BalanceReader::new(client, config);
    let sold = SoldCounter::new(sold_baseline);
    let mut interval = tokio::time::interval(poll_interval);
    tokio::pin!(interrupt);

    greyln!("polling every {poll_interval:?}, press ctrl-c to stop");
    let mut last: Option<ChainView> = None;
    let mut printed = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = &mut interrupt => break,
        }
        match last {
            None => reader.refresh_all().await,
            Some(_) => reader.tick().await,
        }
        let view = reader.view();
        if last.as_ref() != Some(&view) {
            if printed > 0 {
                greyln!("---");
            }
            print_view(&view, &sold);
            printed += 1;
            last = Some(view);
        }
    }
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::units::UNIT, utils::testing::MockClient};
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn prints_only_changes() {
        let client = MockClient::connected();
        let interrupt = async {
            tokio::time::sleep(Duration::from_secs(12)).await;
            client.update_chain(|chain| chain.total_supply = UNIT);
            tokio::time::sleep(Duration::from_secs(12)).await;
        };
        let printed = watch(&client, ReaderConfig::default(), U256::ZERO, interrupt)
            .await
            .unwrap();
        assert_eq!(printed, 2);
    }
}
