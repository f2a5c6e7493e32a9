use crate::{scheduler::RequestScheduler, types::ObservedWithdrawal, Error, Result};
use alloy_primitives::{Address, TxHash};
use client::{
    types::{EventFilter, GatewayWithdrawal, L2ToL1Event, TxReceipt},
    BridgeClient,
};
use futures::future::{join_all, try_join_all};
use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};
use token::TokenMetadataCache;
use tracing::{debug, warn};

/// A withdrawal that could not be turned into a record.
#[derive(Debug)]
pub struct CollectionFailure {
    /// L2 transaction that initiated the withdrawal
    pub tx_hash: TxHash,
    pub error: Error,
}

/// Result of one scan: every withdrawal that could be read, plus the ones
/// that could not.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<ObservedWithdrawal>,
    pub failures: Vec<CollectionFailure>,
}

/// Reads withdrawal initiations from L2 and normalizes them.
pub struct EventCollector<B> {
    bridge: Arc<B>,
    metadata: Arc<TokenMetadataCache>,
    scheduler: RequestScheduler,
}

impl<B> Clone for EventCollector<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            metadata: self.metadata.clone(),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<B: BridgeClient> EventCollector<B> {
    pub const fn new(
        bridge: Arc<B>,
        metadata: Arc<TokenMetadataCache>,
        scheduler: RequestScheduler,
    ) -> Self {
        Self {
            bridge,
            metadata,
            scheduler,
        }
    }

    /// Pacing applied to every bulk chain lookup made on behalf of a scan.
    pub const fn scheduler(&self) -> &RequestScheduler {
        &self.scheduler
    }

    /// Native and token withdrawals to `wallet`.
    ///
    /// Fails if any event source cannot be queried. Individual token
    /// withdrawals that cannot be read end up in [`Collection::failures`].
    pub async fn collect(
        &self,
        wallet: Address,
        gateways: &[Address],
        filter: &EventFilter,
    ) -> Result<Collection> {
        let (native, tokens) = futures::try_join!(
            self.native_withdrawals(wallet, filter),
            self.token_withdrawals(wallet, gateways, filter),
        )?;

        let mut records = native;
        records.extend(tokens.records);

        Ok(Collection {
            records,
            failures: tokens.failures,
        })
    }

    /// Outbound messages without payload, i.e. plain native transfers.
    pub async fn native_withdrawals(
        &self,
        wallet: Address,
        filter: &EventFilter,
    ) -> Result<Vec<ObservedWithdrawal>> {
        let events = self.bridge.native_withdrawal_events(wallet, filter).await?;

        let records: Vec<ObservedWithdrawal> = events
            .iter()
            .filter(|event| event.is_native_transfer())
            .map(ObservedWithdrawal::native)
            .collect();

        debug!(
            events = events.len(),
            native = records.len(),
            "Collected native withdrawals"
        );

        Ok(records)
    }

    /// Gateway withdrawals, each paired with the outbound message its L2
    /// transaction emitted.
    pub async fn token_withdrawals(
        &self,
        wallet: Address,
        gateways: &[Address],
        filter: &EventFilter,
    ) -> Result<Collection> {
        let per_gateway = try_join_all(
            gateways
                .iter()
                .map(|gateway| self.bridge.gateway_withdrawal_events(*gateway, wallet, filter)),
        )
        .await?;
        let withdrawals: Vec<GatewayWithdrawal> = per_gateway.into_iter().flatten().collect();

        let metadata = self.token_metadata(&withdrawals).await;

        let results = join_all(withdrawals.iter().map(|withdrawal| {
            let (symbol, decimals) = metadata
                .get(&withdrawal.l1_token)
                .cloned()
                .unwrap_or_default();
            self.observe_token_withdrawal(withdrawal, symbol, decimals)
        }))
        .await;

        let mut collection = Collection::default();
        for (withdrawal, result) in withdrawals.iter().zip(results) {
            match result {
                Ok(record) => collection.records.push(record),
                Err(error) => {
                    warn!(
                        tx_hash = %withdrawal.tx_hash,
                        token = %withdrawal.l1_token,
                        error = %error,
                        "Skipping token withdrawal"
                    );
                    collection.failures.push(CollectionFailure {
                        tx_hash: withdrawal.tx_hash,
                        error,
                    });
                }
            }
        }

        debug!(
            gateways = gateways.len(),
            collected = collection.records.len(),
            failed = collection.failures.len(),
            "Collected token withdrawals"
        );

        Ok(collection)
    }

    /// Symbol and decimals of every distinct token, looked up once each.
    async fn token_metadata(
        &self,
        withdrawals: &[GatewayWithdrawal],
    ) -> HashMap<Address, (String, u8)> {
        let tokens: BTreeSet<Address> = withdrawals.iter().map(|w| w.l1_token).collect();

        join_all(tokens.into_iter().map(|token| async move {
            let (symbol, decimals) = self
                .scheduler
                .run(async {
                    futures::join!(
                        self.metadata.symbol_or_placeholder(&*self.bridge, token),
                        self.metadata.decimals_or_default(&*self.bridge, token),
                    )
                })
                .await;
            (token, (symbol, decimals))
        }))
        .await
        .into_iter()
        .collect()
    }

    async fn observe_token_withdrawal(
        &self,
        withdrawal: &GatewayWithdrawal,
        symbol: String,
        decimals: u8,
    ) -> Result<ObservedWithdrawal> {
        let receipt = self
            .scheduler
            .run(self.bridge.l2_transaction_receipt(withdrawal.tx_hash))
            .await?;
        let message = single_message(&*self.bridge, &receipt)?;

        Ok(ObservedWithdrawal::token(
            &message, withdrawal, symbol, decimals,
        ))
    }
}

/// The one outbound message a withdrawal transaction emitted.
pub fn single_message<B: BridgeClient>(bridge: &B, receipt: &TxReceipt) -> Result<L2ToL1Event> {
    let mut messages = bridge.messages_in_receipt(receipt);

    match messages.len() {
        0 => Err(Error::MessageNotFound(receipt.tx_hash)),
        1 => Ok(messages.remove(0)),
        count => Err(Error::MultipleMessagesUnsupported {
            tx_hash: receipt.tx_hash,
            count,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetKind;
    use alloy_primitives::{address, B256, U256};
    use client::test_utils::{native_message, token_message, MockBridge, MockToken};
    use std::num::NonZeroU32;

    const WALLET: Address = address!("00000000000000000000000000000000000000aa");
    const OTHER: Address = address!("00000000000000000000000000000000000000bb");
    const GATEWAY_A: Address = address!("000000000000000000000000000000000000a001");
    const GATEWAY_B: Address = address!("000000000000000000000000000000000000a002");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    fn collector(bridge: &MockBridge) -> EventCollector<MockBridge> {
        EventCollector::new(
            Arc::new(bridge.clone()),
            Arc::new(TokenMetadataCache::new()),
            RequestScheduler::new(NonZeroU32::new(100).unwrap(), 4),
        )
    }

    fn gateway_withdrawal(id: u64, token: Address, amount: u64) -> GatewayWithdrawal {
        GatewayWithdrawal {
            l1_token: token,
            from: WALLET,
            to: WALLET,
            l2_to_l1_id: U256::from(id),
            exit_num: U256::from(id),
            amount: U256::from(amount),
            tx_hash: B256::from(U256::from(0xd000 + id)),
            block_number: Some(100 + id),
        }
    }

    #[tokio::test]
    async fn test_native_collection_skips_payload_messages() {
        let bridge = MockBridge::new(WALLET);
        bridge.push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        bridge.push_native_withdrawal(token_message(2, 1, 1, WALLET));
        bridge.push_native_withdrawal(native_message(3, 1, 2, OTHER, U256::from(5)));

        let records = collector(&bridge)
            .native_withdrawals(WALLET, &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "1");
        assert_eq!(records[0].asset_type, AssetKind::Native);
    }

    #[tokio::test]
    async fn test_token_collection_pairs_gateway_event_with_message() {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        bridge.push_gateway_withdrawal(
            GATEWAY_A,
            gateway_withdrawal(5, DAI, 1_000),
            vec![token_message(5, 2, 4, WALLET)],
        );

        let collection = collector(&bridge)
            .token_withdrawals(WALLET, &[GATEWAY_A], &EventFilter::default())
            .await
            .unwrap();

        assert!(collection.failures.is_empty());
        let record = &collection.records[0];
        assert_eq!(record.id, "5");
        assert_eq!(record.symbol, "DAI");
        assert_eq!(record.amount, U256::from(1_000));
        assert_eq!(record.message_key(), "2,4");
        assert_eq!(record.token_address, Some(DAI));
    }

    #[tokio::test]
    async fn test_multiple_messages_fail_only_that_record() {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        bridge.push_gateway_withdrawal(
            GATEWAY_A,
            gateway_withdrawal(5, DAI, 1_000),
            vec![token_message(5, 2, 4, WALLET), token_message(6, 2, 5, WALLET)],
        );
        bridge.push_gateway_withdrawal(
            GATEWAY_A,
            gateway_withdrawal(7, DAI, 2_000),
            vec![token_message(7, 2, 6, WALLET)],
        );

        let collection = collector(&bridge)
            .token_withdrawals(WALLET, &[GATEWAY_A], &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(collection.records.len(), 1);
        assert_eq!(collection.records[0].id, "7");
        assert_eq!(collection.failures.len(), 1);
        assert!(matches!(
            collection.failures[0].error,
            Error::MultipleMessagesUnsupported { count: 2, .. }
        ));
    }

    #[tokio::test]
    async fn test_receipt_failure_is_isolated() {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        let broken = gateway_withdrawal(5, DAI, 1_000);
        bridge.fail_receipt(broken.tx_hash);
        bridge.push_gateway_withdrawal(GATEWAY_A, broken, vec![token_message(5, 2, 4, WALLET)]);
        bridge.push_gateway_withdrawal(
            GATEWAY_B,
            gateway_withdrawal(8, DAI, 3_000),
            vec![token_message(8, 2, 7, WALLET)],
        );

        let collection = collector(&bridge)
            .token_withdrawals(WALLET, &[GATEWAY_A, GATEWAY_B], &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(collection.records.len(), 1);
        assert_eq!(collection.records[0].id, "8");
        assert!(matches!(collection.failures[0].error, Error::Client(_)));
    }

    #[tokio::test]
    async fn test_unknown_token_metadata_degrades() {
        let bridge = MockBridge::new(WALLET);
        let mystery = address!("00000000000000000000000000000000000000cc");
        bridge.push_gateway_withdrawal(
            GATEWAY_A,
            gateway_withdrawal(5, mystery, 1_000),
            vec![token_message(5, 2, 4, WALLET)],
        );

        let collection = collector(&bridge)
            .token_withdrawals(WALLET, &[GATEWAY_A], &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(collection.records[0].symbol, "???");
        assert_eq!(collection.records[0].decimals, 18);
    }

    #[tokio::test]
    async fn test_metadata_is_fetched_once_per_token() {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        for id in 0..3 {
            bridge.push_gateway_withdrawal(
                GATEWAY_A,
                gateway_withdrawal(id, DAI, 1_000),
                vec![token_message(id, 3, id, WALLET)],
            );
        }

        let collection = collector(&bridge)
            .token_withdrawals(WALLET, &[GATEWAY_A], &EventFilter::default())
            .await
            .unwrap();

        assert_eq!(collection.records.len(), 3);
        assert_eq!(bridge.symbol_calls(), 1);
        assert_eq!(bridge.decimals_calls(), 1);
    }

    #[tokio::test]
    async fn test_gateway_query_failure_fails_collection() {
        let bridge = MockBridge::new(WALLET);
        bridge.push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        bridge.fail_gateway(GATEWAY_B);

        let result = collector(&bridge)
            .collect(WALLET, &[GATEWAY_A, GATEWAY_B], &EventFilter::default())
            .await;

        assert!(matches!(result, Err(Error::Client(_))));
    }

    #[tokio::test]
    async fn test_collect_merges_both_sources() {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        bridge.push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        bridge.push_gateway_withdrawal(
            GATEWAY_B,
            gateway_withdrawal(2, DAI, 1_000),
            vec![token_message(2, 1, 1, WALLET)],
        );

        let collection = collector(&bridge)
            .collect(WALLET, &[GATEWAY_A, GATEWAY_B], &EventFilter::default())
            .await
            .unwrap();

        let mut ids: Vec<_> = collection.records.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_single_message_requires_a_message() {
        let bridge = MockBridge::new(WALLET);
        let receipt = TxReceipt {
            tx_hash: B256::from(U256::from(1)),
            block_number: Some(1),
            gas_used: 0,
            status: true,
            logs: vec![],
        };

        assert!(matches!(
            single_message(&bridge, &receipt),
            Err(Error::MessageNotFound(hash)) if hash == receipt.tx_hash
        ));
    }
}
