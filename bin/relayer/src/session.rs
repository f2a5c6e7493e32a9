//! One wallet's view of the bridge: collaborators wired together once and
//! shared by every command.

use action::{
    approve::ApproveAction,
    deposit::{Deposit, DepositAction},
    withdraw::{Withdraw, WithdrawAction},
    Action, Asset, Context, InMemoryTracker, Receipt, Redeemer, Result,
};
use alloy_primitives::{Address, U256};
use client::{types::EventFilter, BridgeClient};
use std::sync::Arc;
use storage::Store;
use token::{TokenList, TokenMetadataCache, TokenRegistry};
use tracing::info;
use withdrawal::{
    EventCollector, ExecutionCache, PendingWithdrawalLedger, RebuildSummary, RequestScheduler,
    WithdrawalRecord,
};

pub struct BridgeSession<B> {
    wallet: Address,
    gateways: Vec<Address>,
    filter: EventFilter,
    ledger: Arc<PendingWithdrawalLedger>,
    cache: Arc<ExecutionCache>,
    tracker: Arc<InMemoryTracker>,
    tokens: TokenRegistry,
    collector: EventCollector<B>,
    ctx: Context<B>,
}

impl<B: BridgeClient> BridgeSession<B> {
    /// Wire a session over `bridge`, loading durable state from `store`.
    pub fn open(
        bridge: Arc<B>,
        store: Arc<dyn Store>,
        gateways: Vec<Address>,
        filter: EventFilter,
        scheduler: RequestScheduler,
    ) -> Result<Self> {
        let wallet = bridge.wallet_address();
        let ledger = Arc::new(PendingWithdrawalLedger::new());
        let cache = Arc::new(ExecutionCache::open(store.clone())?);
        let tracker = Arc::new(InMemoryTracker::new());
        let metadata = Arc::new(TokenMetadataCache::new());

        let collector = EventCollector::new(bridge.clone(), metadata.clone(), scheduler);
        let ctx = Context::new(
            bridge,
            ledger.clone(),
            cache.clone(),
            tracker.clone(),
            metadata,
        );

        info!(
            wallet = %wallet,
            gateways = gateways.len(),
            executed = cache.len(),
            "Opened bridge session"
        );

        Ok(Self {
            wallet,
            gateways,
            filter,
            ledger,
            cache,
            tracker,
            tokens: TokenRegistry::new(store),
            collector,
            ctx,
        })
    }

    /// Rebuild the pending ledger from chain.
    pub async fn refresh(&self) -> Result<RebuildSummary> {
        self.ledger
            .rebuild(
                &self.collector,
                self.ctx.resolver(),
                self.wallet,
                &self.gateways,
                &self.filter,
            )
            .await
    }

    /// Pending withdrawals ordered by batch and index.
    pub fn pending(&self) -> Vec<WithdrawalRecord> {
        self.ledger.snapshot()
    }

    pub async fn redeem(&self, id: &str) -> Result<Receipt> {
        Redeemer::new(self.ctx.clone()).execute(id).await
    }

    /// Withdraw to L1. The new withdrawal is added to the ledger once mined.
    pub async fn withdraw(
        &self,
        asset: Asset,
        amount: U256,
    ) -> Result<(Receipt, Option<WithdrawalRecord>)> {
        let mut action = WithdrawAction::new(self.ctx.clone(), Withdraw { asset, amount });
        info!("{}", action.description());

        let receipt = action.execute().await?;
        Ok((receipt, action.record().cloned()))
    }

    /// Deposit into L2. Returns the inbox sequence number when mined.
    pub async fn deposit(&self, asset: Asset, amount: U256) -> Result<(Receipt, Option<U256>)> {
        let mut action = DepositAction::new(self.ctx.clone(), Deposit { asset, amount });
        info!("{}", action.description());

        let receipt = action.execute().await?;
        Ok((receipt, action.inbox_sequence_number()))
    }

    /// Approve the token's gateway unless an allowance already exists.
    pub async fn approve(&self, token: Address) -> Result<Option<Receipt>> {
        let mut action = ApproveAction::new(self.ctx.clone(), token);
        if action.is_completed().await? {
            info!(token = %token, "Token already approved");
            return Ok(None);
        }

        info!("{}", action.description());
        Ok(Some(action.execute().await?))
    }

    pub async fn add_token(&self, l1_address: Address) -> Result<Address> {
        Ok(self.tokens.add_token(self.ctx.bridge(), l1_address).await?)
    }

    pub fn import_token_list(&self, list: &TokenList) -> usize {
        self.tokens.add_token_list(list)
    }

    /// Restore tokens remembered by earlier sessions.
    pub async fn load_cached_tokens(&self) -> Result<Vec<Address>> {
        Ok(self.tokens.load_cached(self.ctx.bridge()).await?)
    }

    /// Forget every executed message.
    pub fn clear_executed(&self) -> Result<()> {
        self.cache.clear()
    }

    /// Forget the remembered token addresses.
    pub fn expire_token_caches(&self) -> Result<()> {
        Ok(self.tokens.expire_cache()?)
    }

    pub const fn wallet(&self) -> Address {
        self.wallet
    }

    pub fn ledger(&self) -> &PendingWithdrawalLedger {
        &self.ledger
    }

    pub fn cache(&self) -> &ExecutionCache {
        &self.cache
    }

    pub fn tracker(&self) -> &InMemoryTracker {
        &self.tracker
    }

    pub const fn tokens(&self) -> &TokenRegistry {
        &self.tokens
    }

    pub const fn context(&self) -> &Context<B> {
        &self.ctx
    }
}
