use crate::{
    tracker::{TrackedTransaction, TxKind},
    Action, Context, Receipt, Result,
};
use alloy_primitives::{Address, U256};
use client::BridgeClient;
use tracing::info;
use withdrawal::AssetKind;

/// Let the token's L1 gateway move the wallet's tokens.
pub struct ApproveAction<B> {
    ctx: Context<B>,
    token: Address,
}

impl<B: BridgeClient> ApproveAction<B> {
    pub const fn new(ctx: Context<B>, token: Address) -> Self {
        Self { ctx, token }
    }
}

impl<B: BridgeClient> Action for ApproveAction<B> {
    async fn is_ready(&self) -> Result<bool> {
        Ok(!self.is_completed().await?)
    }

    async fn is_completed(&self) -> Result<bool> {
        let allowance = self.ctx.bridge().token_allowance(self.token).await?;
        Ok(allowance > U256::ZERO)
    }

    async fn execute(&mut self) -> Result<Receipt> {
        let bridge = self.ctx.bridge();
        let symbol = self
            .ctx
            .metadata()
            .symbol_or_placeholder(bridge, self.token)
            .await;
        let network_id = self.ctx.l1_network_id().await?;

        let tx = bridge.approve_token(self.token).await?;
        self.ctx.tracker().add(TrackedTransaction::pending(
            tx.hash,
            TxKind::Approve,
            symbol,
            AssetKind::Token,
            bridge.wallet_address(),
            network_id,
        ));

        let mined = bridge.wait_for_receipt(&tx).await?;
        self.ctx.tracker().record_receipt(&mined);
        let receipt = Receipt::from(&mined);

        info!(
            tx_hash = %receipt.tx_hash,
            token = %self.token,
            success = receipt.success,
            "Token approval mined"
        );

        Ok(receipt)
    }

    fn description(&self) -> String {
        format!("Approving the L1 gateway for {}", self.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_utils::{context, DAI},
        tracker::{TransactionTracker, TxStatus},
    };
    use client::test_utils::{MockToken, Submission};

    #[tokio::test]
    async fn test_approve_tracks_symbol() {
        let (bridge, ctx, tracker) = context();
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        let mut action = ApproveAction::new(ctx, DAI);

        assert!(action.is_ready().await.unwrap());
        let receipt = action.execute().await.unwrap();

        assert_eq!(bridge.submissions(), vec![Submission::Approve { token: DAI }]);
        let tracked = tracker.get(receipt.tx_hash).unwrap();
        assert_eq!(tracked.kind, TxKind::Approve);
        assert_eq!(tracked.asset_name, "DAI");
        assert_eq!(tracked.status, TxStatus::Confirmed);
        assert_eq!(tracked.value, None);
    }

    #[tokio::test]
    async fn test_unknown_token_uses_placeholder() {
        let (_bridge, ctx, tracker) = context();
        let mut action = ApproveAction::new(ctx, DAI);

        let receipt = action.execute().await.unwrap();

        assert_eq!(tracker.get(receipt.tx_hash).unwrap().asset_name, "???");
    }

    #[tokio::test]
    async fn test_existing_allowance_is_completed() {
        let (bridge, ctx, _tracker) = context();
        bridge.add_token(
            DAI,
            MockToken {
                allowance: U256::MAX,
                ..MockToken::new("Dai Stablecoin", "DAI", 18)
            },
        );
        let action = ApproveAction::new(ctx, DAI);

        assert!(action.is_completed().await.unwrap());
        assert!(!action.is_ready().await.unwrap());
    }
}
