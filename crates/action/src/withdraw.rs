use crate::{
    tracker::{TrackedTransaction, TxKind},
    Action, Asset, Context, Receipt, Result,
};
use alloy_primitives::U256;
use client::BridgeClient;
use tracing::info;
use withdrawal::{
    collector::single_message,
    types::{format_amount, NATIVE_DECIMALS, NATIVE_SYMBOL},
    AssetKind, ObservedWithdrawal, WithdrawalRecord,
};

/// Withdraw input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Withdraw {
    pub asset: Asset,
    /// Amount in base units
    pub amount: U256,
}

/// Start a withdrawal on L2 and add it to the pending ledger once mined.
pub struct WithdrawAction<B> {
    ctx: Context<B>,
    action: Withdraw,
    receipt: Option<Receipt>,
    record: Option<WithdrawalRecord>,
}

impl<B: BridgeClient> WithdrawAction<B> {
    pub const fn new(ctx: Context<B>, action: Withdraw) -> Self {
        Self {
            ctx,
            action,
            receipt: None,
            record: None,
        }
    }

    /// The ledger record created by a successful withdrawal.
    pub const fn record(&self) -> Option<&WithdrawalRecord> {
        self.record.as_ref()
    }

    /// Symbol and decimals of the withdrawn asset. Unreadable token metadata
    /// is an error here.
    async fn asset_metadata(&self) -> Result<(String, u8)> {
        match self.action.asset {
            Asset::Native => Ok((NATIVE_SYMBOL.to_string(), NATIVE_DECIMALS)),
            Asset::Token(token) => {
                let metadata = self.ctx.metadata();
                let (symbol, decimals) = futures::try_join!(
                    metadata.symbol(self.ctx.bridge(), token),
                    metadata.decimals(self.ctx.bridge(), token),
                )?;
                Ok((symbol, decimals))
            }
        }
    }
}

impl<B: BridgeClient> Action for WithdrawAction<B> {
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
        let (symbol, decimals) = self.asset_metadata().await?;
        let network_id = self.ctx.l1_network_id().await?;
        let bridge = self.ctx.bridge();

        let (tx, asset_type) = match self.action.asset {
            Asset::Native => (bridge.withdraw_native(self.action.amount).await?, AssetKind::Native),
            Asset::Token(token) => (
                bridge.withdraw_token(token, self.action.amount).await?,
                AssetKind::Token,
            ),
        };

        self.ctx.tracker().add(
            TrackedTransaction::pending(
                tx.hash,
                TxKind::Withdraw,
                symbol.as_str(),
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

        if !receipt.success {
            return Ok(receipt);
        }

        let message = single_message(bridge, &mined)?;
        let observed = match self.action.asset {
            Asset::Native => ObservedWithdrawal::native(&message),
            Asset::Token(token) => ObservedWithdrawal::token_transfer(
                &message,
                token,
                self.action.amount,
                symbol,
                decimals,
            ),
        };
        let record = self.ctx.resolver().resolve_observed(observed).await?;
        self.ctx.ledger().upsert(record.clone());

        info!(
            tx_hash = %receipt.tx_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            id = %record.id,
            batch = %record.batch_number,
            index = %record.index_in_batch,
            "Withdrawal initiated"
        );

        self.record = Some(record);
        Ok(receipt)
    }

    fn description(&self) -> String {
        match self.action.asset {
            Asset::Native => format!(
                "Withdrawing {} ETH to L1",
                format_amount(self.action.amount, NATIVE_DECIMALS)
            ),
            Asset::Token(token) => format!(
                "Withdrawing {} base units of {token} to L1",
                self.action.amount
            ),
        }
    }
}
