//! Redeem a confirmed withdrawal on L1.
//!
//! Executes the outbound message through the Outbox, then removes the
//! withdrawal from the pending ledger and remembers the message as executed.

use crate::{
    tracker::{TrackedTransaction, TxKind},
    Action, Context, Error, Receipt, Result,
};
use client::{types::OutgoingMessageState, BridgeClient};
use tracing::{error, info, warn};

/// Session-facing entry point for redemptions.
pub struct Redeemer<B> {
    ctx: Context<B>,
}

impl<B: BridgeClient> Redeemer<B> {
    pub const fn new(ctx: Context<B>) -> Self {
        Self { ctx }
    }

    /// Redeem the pending withdrawal `id`.
    ///
    /// Fails with [`Error::NotFound`] without submitting anything if the
    /// ledger has no such entry.
    pub async fn execute(&self, id: &str) -> Result<Receipt> {
        redeem(&self.ctx, id).await
    }

    /// Ids of pending withdrawals whose message is currently redeemable.
    pub async fn redeemable(&self) -> Result<Vec<String>> {
        let mut ready = Vec::new();
        for record in self.ctx.ledger().snapshot() {
            let state = self
                .ctx
                .resolver()
                .resolve(record.batch_number, record.index_in_batch)
                .await?;
            if state == OutgoingMessageState::Confirmed {
                ready.push(record.id);
            }
        }
        Ok(ready)
    }
}

/// Redemption of one pending withdrawal.
pub struct RedeemAction<B> {
    ctx: Context<B>,
    id: String,
    receipt: Option<Receipt>,
}

impl<B: BridgeClient> RedeemAction<B> {
    pub fn new(ctx: Context<B>, id: impl Into<String>) -> Self {
        Self {
            ctx,
            id: id.into(),
            receipt: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn fresh_state(&self) -> Result<Option<OutgoingMessageState>> {
        let Some(record) = self.ctx.ledger().get(&self.id) else {
            return Ok(None);
        };

        let state = self
            .ctx
            .resolver()
            .resolve(record.batch_number, record.index_in_batch)
            .await?;
        Ok(Some(state))
    }
}

impl<B: BridgeClient> Action for RedeemAction<B> {
    async fn is_ready(&self) -> Result<bool> {
        Ok(self.fresh_state().await? == Some(OutgoingMessageState::Confirmed))
    }

    async fn is_completed(&self) -> Result<bool> {
        if self.receipt.as_ref().is_some_and(|receipt| receipt.success) {
            return Ok(true);
        }
        Ok(self.fresh_state().await? == Some(OutgoingMessageState::Executed))
    }

    async fn execute(&mut self) -> Result<Receipt> {
        let receipt = redeem(&self.ctx, &self.id).await?;
        self.receipt = Some(receipt.clone());
        Ok(receipt)
    }

    fn description(&self) -> String {
        format!("Redeeming withdrawal {} on L1", self.id)
    }
}

async fn redeem<B: BridgeClient>(ctx: &Context<B>, id: &str) -> Result<Receipt> {
    let record = ctx
        .ledger()
        .get(id)
        .ok_or_else(|| Error::NotFound(id.to_string()))?;
    let network_id = ctx.l1_network_id().await?;

    let tx = ctx
        .bridge()
        .execute_outbound_message(record.batch_number, record.index_in_batch)
        .await?;

    info!(
        tx_hash = %tx.hash,
        id = %record.id,
        batch = %record.batch_number,
        index = %record.index_in_batch,
        "Submitted outbox execution"
    );

    ctx.tracker().add(
        TrackedTransaction::pending(
            tx.hash,
            TxKind::Outbox,
            record.symbol.as_str(),
            record.asset_type,
            ctx.bridge().wallet_address(),
            network_id,
        )
        .with_value(record.display_amount()),
    );

    let mined = ctx.bridge().wait_for_receipt(&tx).await?;
    let receipt = Receipt::from(&mined);

    if !receipt.success {
        ctx.tracker().set_failed(receipt.tx_hash, receipt.block_number);
        warn!(
            tx_hash = %receipt.tx_hash,
            id = %record.id,
            "Outbox execution reverted"
        );
        return Ok(receipt);
    }

    ctx.tracker()
        .set_confirmed(receipt.tx_hash, receipt.block_number);
    if ctx.ledger().remove(id).is_none() {
        info!(id = %id, "Withdrawal already left the ledger");
    }
    match ctx.cache().mark(record.batch_number, record.index_in_batch) {
        Ok(true) => {}
        Ok(false) => info!(key = %record.message_key(), "Message already marked executed"),
        // The key is in the in-memory set even when the write fails.
        Err(e) => error!(
            key = %record.message_key(),
            error = %e,
            "Failed to persist executed message"
        ),
    }

    info!(
        tx_hash = %receipt.tx_hash,
        block_number = receipt.block_number,
        gas_used = receipt.gas_used,
        id = %record.id,
        "Withdrawal redeemed on L1"
    );

    Ok(receipt)
}
