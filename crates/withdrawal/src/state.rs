use crate::{
    cache::ExecutionCache,
    types::{ObservedWithdrawal, WithdrawalRecord},
    Result,
};
use alloy_primitives::U256;
use client::{types::OutgoingMessageState, BridgeClient};
use std::sync::Arc;
use tracing::debug;

/// Determines the current state of an outbound message.
///
/// Executed messages found in the [`ExecutionCache`] are answered locally;
/// everything else is read from chain on every call and never cached.
pub struct MessageStateResolver<B> {
    bridge: Arc<B>,
    cache: Arc<ExecutionCache>,
}

impl<B> Clone for MessageStateResolver<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            cache: self.cache.clone(),
        }
    }
}

impl<B: BridgeClient> MessageStateResolver<B> {
    pub const fn new(bridge: Arc<B>, cache: Arc<ExecutionCache>) -> Self {
        Self { bridge, cache }
    }

    pub async fn resolve(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<OutgoingMessageState> {
        if self.cache.has(batch_number, index_in_batch) {
            return Ok(OutgoingMessageState::Executed);
        }

        let state = self
            .bridge
            .outbound_message_state(batch_number, index_in_batch)
            .await?;

        debug!(
            batch = %batch_number,
            index = %index_in_batch,
            state = %state,
            "Resolved outbound message state"
        );

        Ok(state)
    }

    pub async fn resolve_observed(&self, observed: ObservedWithdrawal) -> Result<WithdrawalRecord> {
        let state = self
            .resolve(observed.batch_number, observed.index_in_batch)
            .await?;
        Ok(observed.with_state(state))
    }

    pub const fn cache(&self) -> &Arc<ExecutionCache> {
        &self.cache
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, Address};
    use client::test_utils::MockBridge;
    use storage::{MemoryStore, Store};

    const WALLET: Address = address!("00000000000000000000000000000000000000aa");

    fn setup() -> (MockBridge, MessageStateResolver<MockBridge>) {
        let bridge = MockBridge::new(WALLET);
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let cache = Arc::new(ExecutionCache::open(store).unwrap());
        let resolver = MessageStateResolver::new(Arc::new(bridge.clone()), cache);
        (bridge, resolver)
    }

    #[tokio::test]
    async fn test_cached_message_needs_no_chain_query() {
        let (bridge, resolver) = setup();
        resolver.cache().mark(U256::from(7), U256::from(3)).unwrap();

        let state = resolver.resolve(U256::from(7), U256::from(3)).await.unwrap();

        assert_eq!(state, OutgoingMessageState::Executed);
        assert_eq!(bridge.state_queries(), 0);
    }

    #[tokio::test]
    async fn test_uncached_states_are_read_every_time() {
        let (bridge, resolver) = setup();
        bridge.set_message_state(U256::from(7), U256::from(3), OutgoingMessageState::Confirmed);

        for _ in 0..2 {
            let state = resolver.resolve(U256::from(7), U256::from(3)).await.unwrap();
            assert_eq!(state, OutgoingMessageState::Confirmed);
        }

        assert_eq!(bridge.state_queries(), 2);
    }

    #[tokio::test]
    async fn test_chain_executed_state_is_not_cached() {
        let (bridge, resolver) = setup();
        bridge.set_message_state(U256::from(7), U256::from(3), OutgoingMessageState::Executed);

        let state = resolver.resolve(U256::from(7), U256::from(3)).await.unwrap();

        assert_eq!(state, OutgoingMessageState::Executed);
        assert!(!resolver.cache().has(U256::from(7), U256::from(3)));
    }

    #[tokio::test]
    async fn test_query_failure_propagates() {
        let (bridge, resolver) = setup();
        bridge.fail_state_queries(true);

        let result = resolver.resolve(U256::from(1), U256::ZERO).await;

        assert!(matches!(result, Err(crate::Error::Client(_))));
    }
}
