pub mod approve;
pub mod deposit;
pub mod redeem;
pub mod tracker;
pub mod withdraw;

pub use redeem::{RedeemAction, Redeemer};
pub use tracker::{InMemoryTracker, TrackedTransaction, TransactionTracker, TxKind, TxStatus};

use alloy_primitives::{Address, TxHash};
use client::{types::TxReceipt, BridgeClient};
use std::{future::Future, sync::Arc};
use token::TokenMetadataCache;
use tokio::sync::OnceCell;
use withdrawal::{ExecutionCache, MessageStateResolver, PendingWithdrawalLedger};

pub use withdrawal::{Error, Result};

/// Trait for executable onchain actions.
pub trait Action: Send + Sync {
    /// Check to see if the action is ready to be executed.
    ///
    /// Returns true if all preconditions are met.
    fn is_ready(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Check if the action has already been completed.
    ///
    /// Returns true if the action was already executed successfully.
    fn is_completed(&self) -> impl Future<Output = Result<bool>> + Send;

    /// Execute the action.
    ///
    /// A mined but reverted transaction is not an error; it is reported
    /// through [`Receipt::success`].
    fn execute(&mut self) -> impl Future<Output = Result<Receipt>> + Send;

    /// Get a human-readable description of this action.
    fn description(&self) -> String;
}

/// Outcome of an action's transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Transaction hash
    pub tx_hash: TxHash,
    /// Block number where transaction was included
    pub block_number: Option<u64>,
    /// Gas used
    pub gas_used: u64,
    /// false if the transaction reverted
    pub success: bool,
}

impl From<&TxReceipt> for Receipt {
    fn from(receipt: &TxReceipt) -> Self {
        Self {
            tx_hash: receipt.tx_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            success: receipt.status,
        }
    }
}

/// Asset moved by a transfer action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset {
    /// ETH
    Native,
    /// ERC20, by its L1 address
    Token(Address),
}

/// Collaborators shared by every action of a session.
pub struct Context<B> {
    bridge: Arc<B>,
    ledger: Arc<PendingWithdrawalLedger>,
    resolver: MessageStateResolver<B>,
    tracker: Arc<dyn TransactionTracker>,
    metadata: Arc<TokenMetadataCache>,
    l1_network_id: Arc<OnceCell<u64>>,
}

impl<B> Clone for Context<B> {
    fn clone(&self) -> Self {
        Self {
            bridge: self.bridge.clone(),
            ledger: self.ledger.clone(),
            resolver: self.resolver.clone(),
            tracker: self.tracker.clone(),
            metadata: self.metadata.clone(),
            l1_network_id: self.l1_network_id.clone(),
        }
    }
}

impl<B: BridgeClient> Context<B> {
    pub fn new(
        bridge: Arc<B>,
        ledger: Arc<PendingWithdrawalLedger>,
        cache: Arc<ExecutionCache>,
        tracker: Arc<dyn TransactionTracker>,
        metadata: Arc<TokenMetadataCache>,
    ) -> Self {
        Self {
            resolver: MessageStateResolver::new(bridge.clone(), cache),
            bridge,
            ledger,
            tracker,
            metadata,
            l1_network_id: Arc::new(OnceCell::new()),
        }
    }

    /// L1 chain id, read once per session.
    pub async fn l1_network_id(&self) -> Result<u64> {
        let id = self
            .l1_network_id
            .get_or_try_init(|| self.bridge.l1_chain_id())
            .await?;
        Ok(*id)
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    pub const fn shared_bridge(&self) -> &Arc<B> {
        &self.bridge
    }

    pub fn ledger(&self) -> &PendingWithdrawalLedger {
        &self.ledger
    }

    pub const fn resolver(&self) -> &MessageStateResolver<B> {
        &self.resolver
    }

    pub fn cache(&self) -> &ExecutionCache {
        self.resolver.cache()
    }

    pub fn tracker(&self) -> &dyn TransactionTracker {
        self.tracker.as_ref()
    }

    pub const fn metadata(&self) -> &Arc<TokenMetadataCache> {
        &self.metadata
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;
    use alloy_primitives::address;
    use client::test_utils::MockBridge;
    use storage::{MemoryStore, Store};

    pub const WALLET: Address = address!("00000000000000000000000000000000000000aa");
    pub const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");

    /// Context over a fresh mock bridge and in-memory state.
    pub fn context() -> (MockBridge, Context<MockBridge>, Arc<InMemoryTracker>) {
        let bridge = MockBridge::new(WALLET);
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let tracker = Arc::new(InMemoryTracker::new());
        let ctx = Context::new(
            Arc::new(bridge.clone()),
            Arc::new(PendingWithdrawalLedger::new()),
            Arc::new(ExecutionCache::open(store).unwrap()),
            tracker.clone(),
            Arc::new(TokenMetadataCache::new()),
        );
        (bridge, ctx, tracker)
    }
}
