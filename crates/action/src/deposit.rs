use crate::{
    tracker::{TrackedTransaction, TxKind},
    Action, Asset, Context, Receipt, Result,
};
use alloy_primitives::U256;
use client::BridgeClient;
use tracing::info;
use withdrawal::{
    types::{format_amount, NATIVE_DECIMALS, NATIVE_SYMBOL},
    AssetKind,
};

/// Deposit input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deposit {
    pub asset: Asset,
    /// Amount in base units
    pub amount: U256,
}

/// Deposit ETH or a token from L1 into the rollup through the Inbox.
pub struct DepositAction<B> {
    ctx: Context<B>,
    action: Deposit,
    receipt: Option<Receipt>,
    inbox_sequence_number: Option<U256>,
}

impl<B: BridgeClient> DepositAction<B> {
    pub const fn new(ctx: Context<B>, action: Deposit) -> Self {
        Self {
            ctx,
            action,
            receipt: None,
            inbox_sequence_number: None,
        }
    }

    /// Inbox sequence number of the retryable created by the deposit.
    pub const fn inbox_sequence_number(&self) -> Option<U256> {
        self.inbox_sequence_number
    }

    async fn asset_metadata(&self) -> (String, u8, AssetKind) {
        match self.action.asset {
            Asset::Native => (NATIVE_SYMBOL.to_string(), NATIVE_DECIMALS, AssetKind::Native),
            Asset::Token(token) => {
                let metadata = self.ctx.metadata();
                let (symbol, decimals) = futures::join!(
                    metadata.symbol_or_placeholder(self.ctx.bridge(), token),
                    metadata.decimals_or_default(self.ctx.bridge(), token),
                );
                (symbol, decimals, AssetKind::Token)
            }
        }
    }
}

impl<B: BridgeClient> Action for DepositAction<B> {
    async fn is_ready(&self) -> Result<bool> {
        if self.action.amount == U256::ZERO {
            return Ok(false);
        }
        Ok(self.receipt.is_none())
    }

    async fn is_completed(&self) -> Result<bool> {
        Ok(self.receipt.as_ref().is_some_and(|receipt| receipt.success))
    }

    async fn execute(&mut self) -> Result<Receipt> {
        let (symbol, decimals, asset_type) = self.asset_metadata().await;
        let network_id = self.ctx.l1_network_id().await?;
        let bridge = self.ctx.bridge();

        let tx = match self.action.asset {
            Asset::Native => bridge.deposit_native(self.action.amount).await?,
            Asset::Token(token) => bridge.deposit_token(token, self.action.amount).await?,
        };

        self.ctx.tracker().add(
            TrackedTransaction::pending(
                tx.hash,
                TxKind::Deposit,
                symbol,
                asset_type,
                bridge.wallet_address(),
                network_id,
            )
            .with_value(format_amount(self.action.amount, decimals)),
        );

        let mined = bridge.wait_for_receipt(&tx).await?;
        self.ctx.tracker().record_receipt(&mined);
        let receipt = Receipt::from(&mined);
        self.receipt = Some(receipt.clone());

        let sequence_number = receipt
            .success
            .then(|| bridge.inbox_sequence_numbers(&mined).first().copied())
            .flatten();
        if let Some(sequence_number) = sequence_number {
            self.ctx
                .tracker()
                .set_inbox_sequence_number(receipt.tx_hash, sequence_number);
            self.inbox_sequence_number = Some(sequence_number);
        }

        info!(
            tx_hash = %receipt.tx_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            success = receipt.success,
            inbox_sequence_number = ?self.inbox_sequence_number,
            "Deposit mined"
        );

        Ok(receipt)
    }

    fn description(&self) -> String {
        match self.action.asset {
            Asset::Native => format!(
                "Depositing {} ETH into L2",
                format_amount(self.action.amount, NATIVE_DECIMALS)
            ),
            Asset::Token(token) => format!(
                "Depositing {} base units of {token} into L2",
                self.action.amount
            ),
        }
    }
}
