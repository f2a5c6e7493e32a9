use crate::{
    collector::{CollectionFailure, EventCollector},
    state::MessageStateResolver,
    types::WithdrawalRecord,
    Result,
};
use alloy_primitives::Address;
use client::{
    types::{EventFilter, OutgoingMessageState},
    BridgeClient,
};
use futures::future::try_join_all;
use parking_lot::RwLock;
use std::collections::HashMap;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Change notification published by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerEvent {
    Upserted(WithdrawalRecord),
    Removed(String),
    Rebuilt { pending: usize },
}

/// Outcome of [`PendingWithdrawalLedger::rebuild`].
#[derive(Debug, Default)]
pub struct RebuildSummary {
    /// Records now held by the ledger
    pub pending: usize,
    /// Records left out because their message is already executed
    pub executed: usize,
    /// Withdrawals that could not be read
    pub skipped: usize,
    pub failures: Vec<CollectionFailure>,
}

/// Outstanding outbound messages of the session, keyed by withdrawal id.
///
/// Never holds executed messages. Stored states are as of the last
/// resolution; callers re-resolve before acting on them.
pub struct PendingWithdrawalLedger {
    entries: RwLock<HashMap<String, WithdrawalRecord>>,
    rebuild_lock: Mutex<()>,
    events: broadcast::Sender<LedgerEvent>,
}

impl Default for PendingWithdrawalLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl PendingWithdrawalLedger {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            rebuild_lock: Mutex::new(()),
            events,
        }
    }

    /// Replace the contents with a fresh scan of both chains.
    ///
    /// Concurrent rebuilds run one after the other. State lookups go through
    /// the collector's scheduler. If collection or state resolution fails,
    /// the ledger keeps its previous contents.
    pub async fn rebuild<B: BridgeClient>(
        &self,
        collector: &EventCollector<B>,
        resolver: &MessageStateResolver<B>,
        wallet: Address,
        gateways: &[Address],
        filter: &EventFilter,
    ) -> Result<RebuildSummary> {
        let _guard = self.rebuild_lock.lock().await;

        let collection = collector.collect(wallet, gateways, filter).await?;
        let records = try_join_all(
            collection
                .records
                .into_iter()
                .map(|observed| collector.scheduler().run(resolver.resolve_observed(observed))),
        )
        .await?;

        let mut summary = RebuildSummary {
            skipped: collection.failures.len(),
            failures: collection.failures,
            ..Default::default()
        };

        let mut fresh = HashMap::with_capacity(records.len());
        for record in records {
            if record.outgoing_message_state == OutgoingMessageState::Executed {
                summary.executed += 1;
                continue;
            }
            fresh.insert(record.id.clone(), record);
        }
        summary.pending = fresh.len();

        *self.entries.write() = fresh;
        let _ = self.events.send(LedgerEvent::Rebuilt {
            pending: summary.pending,
        });

        info!(
            pending = summary.pending,
            executed = summary.executed,
            skipped = summary.skipped,
            "Rebuilt pending withdrawals"
        );

        Ok(summary)
    }

    /// Insert or replace a record. Executed records are refused.
    pub fn upsert(&self, record: WithdrawalRecord) -> bool {
        if record.outgoing_message_state == OutgoingMessageState::Executed {
            debug!(id = %record.id, "Refusing executed withdrawal");
            return false;
        }

        self.entries.write().insert(record.id.clone(), record.clone());
        let _ = self.events.send(LedgerEvent::Upserted(record));
        true
    }

    pub fn remove(&self, id: &str) -> Option<WithdrawalRecord> {
        let removed = self.entries.write().remove(id);
        if removed.is_some() {
            let _ = self.events.send(LedgerEvent::Removed(id.to_string()));
        }
        removed
    }

    pub fn get(&self, id: &str) -> Option<WithdrawalRecord> {
        self.entries.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// All records, ordered by batch then index.
    pub fn snapshot(&self) -> Vec<WithdrawalRecord> {
        let mut records: Vec<_> = self.entries.read().values().cloned().collect();
        records.sort_by(|a, b| {
            (a.batch_number, a.index_in_batch).cmp(&(b.batch_number, b.index_in_batch))
        });
        records
    }

    pub fn by_state(&self, state: OutgoingMessageState) -> Vec<WithdrawalRecord> {
        self.snapshot()
            .into_iter()
            .filter(|record| record.outgoing_message_state == state)
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cache::ExecutionCache, scheduler::RequestScheduler, types::ObservedWithdrawal, Error,
    };
    use alloy_primitives::{address, B256, U256};
    use client::{
        test_utils::{native_message, token_message, MockBridge, MockToken},
        types::GatewayWithdrawal,
    };
    use std::{num::NonZeroU32, sync::Arc, time::Duration};
    use storage::{MemoryStore, Store};
    use token::TokenMetadataCache;

    const WALLET: Address = address!("00000000000000000000000000000000000000aa");
    const GATEWAY_A: Address = address!("000000000000000000000000000000000000a001");
    const GATEWAY_B: Address = address!("000000000000000000000000000000000000a002");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    struct Fixture {
        bridge: MockBridge,
        collector: EventCollector<MockBridge>,
        resolver: MessageStateResolver<MockBridge>,
        ledger: PendingWithdrawalLedger,
    }

    fn fixture() -> Fixture {
        let bridge = MockBridge::new(WALLET);
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        let shared = Arc::new(bridge.clone());
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let cache = Arc::new(ExecutionCache::open(store).unwrap());

        Fixture {
            collector: EventCollector::new(
                shared.clone(),
                Arc::new(TokenMetadataCache::new()),
                RequestScheduler::unlimited(),
            ),
            resolver: MessageStateResolver::new(shared, cache),
            ledger: PendingWithdrawalLedger::new(),
            bridge,
        }
    }

    fn push_token_withdrawal(bridge: &MockBridge, gateway: Address, id: u64, batch: u64, index: u64) {
        bridge.push_gateway_withdrawal(
            gateway,
            GatewayWithdrawal {
                l1_token: DAI,
                from: WALLET,
                to: WALLET,
                l2_to_l1_id: U256::from(id),
                exit_num: U256::from(id),
                amount: U256::from(1_000),
                tx_hash: B256::from(U256::from(0xe000 + id)),
                block_number: Some(id),
            },
            vec![token_message(id, batch, index, WALLET)],
        );
    }

    fn record(id: u64, batch: u64, index: u64, state: OutgoingMessageState) -> WithdrawalRecord {
        ObservedWithdrawal::native(&native_message(id, batch, index, WALLET, U256::from(1)))
            .with_state(state)
    }

    async fn rebuild(f: &Fixture) -> Result<RebuildSummary> {
        f.ledger
            .rebuild(
                &f.collector,
                &f.resolver,
                WALLET,
                &[GATEWAY_A, GATEWAY_B],
                &EventFilter::default(),
            )
            .await
    }

    #[test]
    fn test_upsert_then_get() {
        let ledger = PendingWithdrawalLedger::new();

        assert!(ledger.upsert(record(1, 1, 0, OutgoingMessageState::Unconfirmed)));
        assert_eq!(
            ledger.get("1").unwrap().outgoing_message_state,
            OutgoingMessageState::Unconfirmed
        );

        assert!(ledger.upsert(record(1, 1, 0, OutgoingMessageState::Confirmed)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(
            ledger.get("1").unwrap().outgoing_message_state,
            OutgoingMessageState::Confirmed
        );
    }

    #[test]
    fn test_executed_records_are_refused() {
        let ledger = PendingWithdrawalLedger::new();

        assert!(!ledger.upsert(record(1, 1, 0, OutgoingMessageState::Executed)));
        assert!(!ledger.contains("1"));
    }

    #[test]
    fn test_snapshot_and_state_views_are_ordered() {
        let ledger = PendingWithdrawalLedger::new();
        ledger.upsert(record(3, 2, 0, OutgoingMessageState::Confirmed));
        ledger.upsert(record(1, 1, 5, OutgoingMessageState::Unconfirmed));
        ledger.upsert(record(2, 1, 9, OutgoingMessageState::Confirmed));

        let ids: Vec<_> = ledger.snapshot().into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);

        let confirmed: Vec<_> = ledger
            .by_state(OutgoingMessageState::Confirmed)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(confirmed, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_changes_are_broadcast() {
        let ledger = PendingWithdrawalLedger::new();
        let mut events = ledger.subscribe();
        let pending = record(1, 1, 0, OutgoingMessageState::Confirmed);

        ledger.upsert(pending.clone());
        ledger.remove("1");
        ledger.remove("1");

        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Upserted(pending));
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Removed("1".to_string()));
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_rebuild_merges_sources_without_duplicates() {
        let f = fixture();
        f.bridge
            .push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        f.bridge
            .push_native_withdrawal(native_message(2, 1, 1, WALLET, U256::from(6)));
        push_token_withdrawal(&f.bridge, GATEWAY_A, 3, 1, 2);
        push_token_withdrawal(&f.bridge, GATEWAY_B, 4, 1, 3);
        // token messages also show up in the ArbSys log, with payload
        f.bridge.push_native_withdrawal(token_message(3, 1, 2, WALLET));
        f.bridge.set_message_state(U256::from(1), U256::from(2), OutgoingMessageState::Confirmed);

        let summary = rebuild(&f).await.unwrap();

        assert_eq!(summary.pending, 4);
        assert_eq!(f.ledger.len(), 4);
        assert_eq!(
            f.ledger.get("3").unwrap().outgoing_message_state,
            OutgoingMessageState::Confirmed
        );
    }

    #[tokio::test]
    async fn test_rebuild_excludes_executed_messages() {
        let f = fixture();
        f.bridge
            .push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        f.bridge
            .push_native_withdrawal(native_message(2, 1, 1, WALLET, U256::from(5)));
        f.bridge.set_message_state(U256::from(1), U256::ZERO, OutgoingMessageState::Executed);
        f.resolver.cache().mark(U256::from(1), U256::from(1)).unwrap();

        let summary = rebuild(&f).await.unwrap();

        assert_eq!(summary.pending, 0);
        assert_eq!(summary.executed, 2);
        assert!(f.ledger.is_empty());
    }

    #[tokio::test]
    async fn test_rebuild_replaces_previous_contents() {
        let f = fixture();
        f.ledger.upsert(record(99, 9, 9, OutgoingMessageState::Confirmed));
        f.bridge
            .push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));

        rebuild(&f).await.unwrap();

        assert!(!f.ledger.contains("99"));
        assert!(f.ledger.contains("1"));
    }

    #[tokio::test]
    async fn test_failed_rebuild_leaves_ledger_untouched() {
        let f = fixture();
        f.ledger.upsert(record(99, 9, 9, OutgoingMessageState::Confirmed));
        f.bridge
            .push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        f.bridge.fail_state_queries(true);

        let result = rebuild(&f).await;

        assert!(matches!(result, Err(Error::Client(_))));
        assert_eq!(f.ledger.len(), 1);
        assert!(f.ledger.contains("99"));
    }

    #[tokio::test]
    async fn test_rebuild_reports_skipped_withdrawals() {
        let f = fixture();
        push_token_withdrawal(&f.bridge, GATEWAY_A, 3, 1, 2);
        f.bridge.fail_receipt(B256::from(U256::from(0xe000 + 3u64)));
        push_token_withdrawal(&f.bridge, GATEWAY_B, 4, 1, 3);

        let summary = rebuild(&f).await.unwrap();

        assert_eq!(summary.pending, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failures[0].tx_hash, B256::from(U256::from(0xe003u64)));
    }

    #[tokio::test]
    async fn test_concurrent_rebuilds_are_serialized() {
        let f = fixture();
        f.bridge
            .push_native_withdrawal(native_message(1, 1, 0, WALLET, U256::from(5)));
        let mut events = f.ledger.subscribe();

        let (first, second) = tokio::join!(rebuild(&f), rebuild(&f));

        assert_eq!(first.unwrap().pending, 1);
        assert_eq!(second.unwrap().pending, 1);
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Rebuilt { pending: 1 });
        assert_eq!(events.recv().await.unwrap(), LedgerEvent::Rebuilt { pending: 1 });
        assert_eq!(f.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_rebuild_state_queries_respect_scheduler() {
        let mut f = fixture();
        f.collector = EventCollector::new(
            Arc::new(f.bridge.clone()),
            Arc::new(TokenMetadataCache::new()),
            RequestScheduler::new(NonZeroU32::new(1_000).unwrap(), 2),
        );
        for id in 0..6 {
            f.bridge
                .push_native_withdrawal(native_message(id, 1, id, WALLET, U256::from(5)));
        }
        f.bridge.set_state_query_latency(Duration::from_millis(10));

        let summary = rebuild(&f).await.unwrap();

        assert_eq!(summary.pending, 6);
        assert_eq!(f.bridge.state_queries(), 6);
        assert!(f.bridge.peak_state_queries_in_flight() <= 2);
    }
}
