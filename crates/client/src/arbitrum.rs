//! [`BridgeClient`] over a pair of alloy providers.

use crate::{
    bridge::BridgeClient,
    types::{
        Chain, EventFilter, GatewayWithdrawal, L2ToL1Event, OutgoingMessageState, SubmittedTx,
        TxReceipt,
    },
    ClientError,
};
use alloy_contract::Error as ContractError;
use alloy_primitives::{Address, Bytes, TxHash, B256, U256};
use alloy_provider::{PendingTransactionBuilder, Provider};
use alloy_rpc_types_eth::BlockNumberOrTag;
use alloy_sol_types::SolValue;
use binding::{
    arbitrum::{
        IArbRetryableTx, IArbSys, INodeInterface, IOutbox, IOutboxEntry, ARB_RETRYABLE_TX_ADDRESS,
        ARB_SYS_ADDRESS, NODE_INTERFACE_ADDRESS,
    },
    gateway::{IL1GatewayRouter, IL2ArbitrumGateway, IL2GatewayRouter},
    token::IERC20,
};
use config::NetworkConfig;
use std::{fmt::Display, future::IntoFuture, time::Duration};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Tunables for [`ArbitrumBridge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// Deadline for every individual RPC call
    pub request_timeout: Duration,
    /// Deadline for a submitted transaction to be mined
    pub confirmation_timeout: Duration,
    /// Retryable ticket L2 gas limit for token deposits
    pub deposit_max_gas: U256,
    /// Retryable ticket L2 gas price bid for token deposits
    pub deposit_gas_price_bid: U256,
    /// Calldata size used to price the retryable of a token deposit
    pub token_calldata_size: U256,
    /// Split log queries into ranges of this many blocks
    pub log_chunk_size: Option<u64>,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            confirmation_timeout: Duration::from_secs(900),
            deposit_max_gas: U256::from(300_000),
            deposit_gas_price_bid: U256::from(1_000_000_000u64),
            token_calldata_size: U256::from(1_024),
            log_chunk_size: None,
        }
    }
}

pub struct ArbitrumBridge<P1, P2> {
    l1_provider: P1,
    l2_provider: P2,
    wallet: Address,
    network: NetworkConfig,
    settings: BridgeSettings,
}

impl<P1, P2> ArbitrumBridge<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    pub const fn new(
        l1_provider: P1,
        l2_provider: P2,
        wallet: Address,
        network: NetworkConfig,
        settings: BridgeSettings,
    ) -> Self {
        Self {
            l1_provider,
            l2_provider,
            wallet,
            network,
            settings,
        }
    }

    pub const fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub const fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    /// Run one RPC call under the request timeout.
    async fn bounded<T, E, F>(&self, operation: &'static str, call: F) -> Result<T, ClientError>
    where
        F: IntoFuture<Output = Result<T, E>>,
        E: Display,
    {
        let after = self.settings.request_timeout;
        match timeout(after, call).await {
            Ok(result) => result.map_err(ClientError::provider),
            Err(_) => Err(ClientError::Timeout { operation, after }),
        }
    }

    /// Outbox proof for a message, or `None` when the node reverts because
    /// the batch does not exist yet.
    async fn lookup_proof(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<Option<INodeInterface::lookupMessageBatchProofReturn>, ClientError> {
        let index = u64::try_from(index_in_batch).map_err(|_| {
            ClientError::Provider(format!("index in batch {index_in_batch} exceeds u64"))
        })?;

        let node = INodeInterface::new(NODE_INTERFACE_ADDRESS, &self.l2_provider);
        let after = self.settings.request_timeout;

        match timeout(after, node.lookupMessageBatchProof(batch_number, index).call()).await {
            Err(_) => Err(ClientError::Timeout {
                operation: "lookupMessageBatchProof",
                after,
            }),
            Ok(Ok(proof)) => Ok(Some(proof)),
            Ok(Err(e)) if is_revert(&e) => {
                debug!(
                    batch = %batch_number,
                    index = %index_in_batch,
                    error = %e,
                    "No outbox proof yet"
                );
                Ok(None)
            }
            Ok(Err(e)) => Err(ClientError::provider(e)),
        }
    }

    async fn submission_price(&self, calldata_size: U256) -> Result<U256, ClientError> {
        let retryable = IArbRetryableTx::new(ARB_RETRYABLE_TX_ADDRESS, &self.l2_provider);
        let price = self
            .bounded(
                "getSubmissionPrice",
                retryable.getSubmissionPrice(calldata_size).call(),
            )
            .await?;

        Ok(price._0)
    }

    async fn l1_gateway(&self, l1_token: Address) -> Result<Address, ClientError> {
        let router = IL1GatewayRouter::new(self.network.ethereum.gateway_router, &self.l1_provider);
        self.bounded("getGateway", router.getGateway(l1_token).call())
            .await
    }

    /// Block ranges to query for `filter`.
    ///
    /// Without chunking a single open-ended range is used. With chunking the
    /// upper bound is pinned to a concrete block first so every chunk sees the
    /// same snapshot.
    async fn block_ranges(
        &self,
        filter: &EventFilter,
    ) -> Result<Vec<(u64, BlockNumberOrTag)>, ClientError> {
        let from = filter.from_block.unwrap_or(0);

        let Some(chunk) = self.settings.log_chunk_size.filter(|size| *size > 0) else {
            let to = filter
                .to_block
                .map_or(BlockNumberOrTag::Latest, BlockNumberOrTag::Number);
            return Ok(vec![(from, to)]);
        };

        let to = match filter.to_block {
            Some(to) => to,
            None => {
                self.bounded("eth_blockNumber", self.l2_provider.get_block_number())
                    .await?
            }
        };

        let mut ranges = Vec::new();
        let mut current = from;
        while current <= to {
            let end = current.saturating_add(chunk - 1).min(to);
            ranges.push((current, BlockNumberOrTag::Number(end)));
            if end == u64::MAX {
                break;
            }
            current = end + 1;
        }

        Ok(ranges)
    }
}

impl<P1, P2> BridgeClient for ArbitrumBridge<P1, P2>
where
    P1: Provider + Clone,
    P2: Provider + Clone,
{
    fn wallet_address(&self) -> Address {
        self.wallet
    }

    fn inbox_address(&self) -> Address {
        self.network.ethereum.inbox
    }

    async fn l1_chain_id(&self) -> Result<u64, ClientError> {
        self.bounded("eth_chainId", self.l1_provider.get_chain_id())
            .await
    }

    async fn deposit_native(&self, amount: U256) -> Result<SubmittedTx, ClientError> {
        let max_submission_cost = self.submission_price(U256::ZERO).await?;

        let inbox = binding::arbitrum::IInbox::new(self.network.ethereum.inbox, &self.l1_provider);
        let pending = self
            .bounded(
                "depositEth",
                inbox.depositEth(max_submission_cost).value(amount).send(),
            )
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            amount = %amount,
            max_submission_cost = %max_submission_cost,
            "Submitted ETH deposit"
        );

        Ok(SubmittedTx::l1(*pending.tx_hash()))
    }

    async fn deposit_token(&self, l1_token: Address, amount: U256) -> Result<SubmittedTx, ClientError> {
        let max_submission_cost = self
            .submission_price(self.settings.token_calldata_size)
            .await?;
        let max_gas = self.settings.deposit_max_gas;
        let gas_price_bid = self.settings.deposit_gas_price_bid;
        let data = Bytes::from((max_submission_cost, Bytes::new()).abi_encode_params());
        let value = max_submission_cost + max_gas * gas_price_bid;

        let router = IL1GatewayRouter::new(self.network.ethereum.gateway_router, &self.l1_provider);
        let pending = self
            .bounded(
                "outboundTransfer",
                router
                    .outboundTransfer(l1_token, self.wallet, amount, max_gas, gas_price_bid, data)
                    .value(value)
                    .send(),
            )
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            token = %l1_token,
            amount = %amount,
            "Submitted token deposit"
        );

        Ok(SubmittedTx::l1(*pending.tx_hash()))
    }

    async fn approve_token(&self, l1_token: Address) -> Result<SubmittedTx, ClientError> {
        let gateway = self.l1_gateway(l1_token).await?;

        let token = IERC20::new(l1_token, &self.l1_provider);
        let pending = self
            .bounded("approve", token.approve(gateway, U256::MAX).send())
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            token = %l1_token,
            gateway = %gateway,
            "Submitted gateway approval"
        );

        Ok(SubmittedTx::l1(*pending.tx_hash()))
    }

    async fn withdraw_native(&self, amount: U256) -> Result<SubmittedTx, ClientError> {
        let arb_sys = IArbSys::new(ARB_SYS_ADDRESS, &self.l2_provider);
        let pending = self
            .bounded(
                "withdrawEth",
                arb_sys.withdrawEth(self.wallet).value(amount).send(),
            )
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            amount = %amount,
            "Submitted ETH withdrawal"
        );

        Ok(SubmittedTx::l2(*pending.tx_hash()))
    }

    async fn withdraw_token(&self, l1_token: Address, amount: U256) -> Result<SubmittedTx, ClientError> {
        let router = IL2GatewayRouter::new(self.network.arbitrum.gateway_router, &self.l2_provider);
        let pending = self
            .bounded(
                "outboundTransfer",
                router
                    .outboundTransfer(l1_token, self.wallet, amount, Bytes::new())
                    .send(),
            )
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            token = %l1_token,
            amount = %amount,
            "Submitted token withdrawal"
        );

        Ok(SubmittedTx::l2(*pending.tx_hash()))
    }

    async fn execute_outbound_message(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<SubmittedTx, ClientError> {
        let Some(proof) = self.lookup_proof(batch_number, index_in_batch).await? else {
            return Err(ClientError::Provider(format!(
                "no outbox proof for batch {batch_number} index {index_in_batch}"
            )));
        };

        let outbox = IOutbox::new(self.network.ethereum.outbox, &self.l1_provider);
        let pending = self
            .bounded(
                "executeTransaction",
                outbox
                    .executeTransaction(
                        batch_number,
                        proof.proof,
                        proof.path,
                        proof.l2Sender,
                        proof.l1Dest,
                        proof.l2Block,
                        proof.l1Block,
                        proof.timestamp,
                        proof.amount,
                        proof.calldataForL1,
                    )
                    .send(),
            )
            .await?;

        info!(
            tx_hash = %pending.tx_hash(),
            batch = %batch_number,
            index = %index_in_batch,
            "Submitted outbox execution"
        );

        Ok(SubmittedTx::l1(*pending.tx_hash()))
    }

    async fn wait_for_receipt(&self, tx: &SubmittedTx) -> Result<TxReceipt, ClientError> {
        let root = match tx.chain {
            Chain::L1 => self.l1_provider.root().clone(),
            Chain::L2 => self.l2_provider.root().clone(),
        };
        let after = self.settings.confirmation_timeout;

        let receipt = match timeout(after, PendingTransactionBuilder::new(root, tx.hash).get_receipt())
            .await
        {
            Ok(receipt) => receipt.map_err(ClientError::provider)?,
            Err(_) => {
                return Err(ClientError::Timeout {
                    operation: "wait_for_receipt",
                    after,
                })
            }
        };

        debug!(
            tx_hash = %receipt.transaction_hash,
            block_number = receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction mined"
        );

        Ok(TxReceipt::from(&receipt))
    }

    async fn outbound_message_state(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> Result<OutgoingMessageState, ClientError> {
        let Some(proof) = self.lookup_proof(batch_number, index_in_batch).await? else {
            return Ok(OutgoingMessageState::Unconfirmed);
        };

        let outbox = IOutbox::new(self.network.ethereum.outbox, &self.l1_provider);
        let exists = self
            .bounded("outboxEntryExists", outbox.outboxEntryExists(batch_number).call())
            .await?;
        if !exists {
            return Ok(OutgoingMessageState::Unconfirmed);
        }

        let entry = self
            .bounded("outboxEntries", outbox.outboxEntries(batch_number).call())
            .await?;
        let spent = self
            .bounded(
                "spentOutput",
                IOutboxEntry::new(entry, &self.l1_provider)
                    .spentOutput(B256::from(proof.path))
                    .call(),
            )
            .await?;

        Ok(if spent {
            OutgoingMessageState::Executed
        } else {
            OutgoingMessageState::Confirmed
        })
    }

    async fn native_withdrawal_events(
        &self,
        destination: Address,
        filter: &EventFilter,
    ) -> Result<Vec<L2ToL1Event>, ClientError> {
        let arb_sys = IArbSys::new(ARB_SYS_ADDRESS, &self.l2_provider);
        let mut events = Vec::new();

        for (from, to) in self.block_ranges(filter).await? {
            debug!(from, to = %to, destination = %destination, "Querying L2ToL1Transaction");

            let logs = self
                .bounded(
                    "L2ToL1Transaction",
                    arb_sys
                        .L2ToL1Transaction_filter()
                        .topic1(destination.into_word())
                        .from_block(from)
                        .to_block(to)
                        .query(),
                )
                .await?;

            events.extend(
                logs.into_iter()
                    .map(|(event, log)| L2ToL1Event::from_event(&event, log.transaction_hash)),
            );
        }

        Ok(events)
    }

    async fn gateway_withdrawal_events(
        &self,
        gateway: Address,
        destination: Address,
        filter: &EventFilter,
    ) -> Result<Vec<GatewayWithdrawal>, ClientError> {
        let contract = IL2ArbitrumGateway::new(gateway, &self.l2_provider);
        let mut withdrawals = Vec::new();

        for (from, to) in self.block_ranges(filter).await? {
            debug!(from, to = %to, gateway = %gateway, "Querying WithdrawalInitiated");

            let logs = self
                .bounded(
                    "WithdrawalInitiated",
                    contract
                        .WithdrawalInitiated_filter()
                        .topic2(destination.into_word())
                        .from_block(from)
                        .to_block(to)
                        .query(),
                )
                .await?;

            for (event, log) in logs {
                let Some(tx_hash) = log.transaction_hash else {
                    warn!(gateway = %gateway, "WithdrawalInitiated log without transaction hash");
                    continue;
                };

                withdrawals.push(GatewayWithdrawal {
                    l1_token: event.l1Token,
                    from: event._from,
                    to: event._to,
                    l2_to_l1_id: event._l2ToL1Id,
                    exit_num: event._exitNum,
                    amount: event._amount,
                    tx_hash,
                    block_number: log.block_number,
                });
            }
        }

        Ok(withdrawals)
    }

    async fn l2_transaction_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ClientError> {
        let receipt = self
            .bounded(
                "eth_getTransactionReceipt",
                self.l2_provider.get_transaction_receipt(tx_hash),
            )
            .await?
            .ok_or(ClientError::MissingReceipt(tx_hash))?;

        Ok(TxReceipt::from(&receipt))
    }

    async fn token_symbol(&self, l1_token: Address) -> Result<String, ClientError> {
        let token = IERC20::new(l1_token, &self.l1_provider);
        self.bounded("symbol", token.symbol().call()).await
    }

    async fn token_decimals(&self, l1_token: Address) -> Result<u8, ClientError> {
        let token = IERC20::new(l1_token, &self.l1_provider);
        self.bounded("decimals", token.decimals().call()).await
    }

    async fn token_name(&self, l1_token: Address) -> Result<String, ClientError> {
        let token = IERC20::new(l1_token, &self.l1_provider);
        self.bounded("name", token.name().call()).await
    }

    async fn token_allowance(&self, l1_token: Address) -> Result<U256, ClientError> {
        let gateway = self.l1_gateway(l1_token).await?;
        let token = IERC20::new(l1_token, &self.l1_provider);
        self.bounded("allowance", token.allowance(self.wallet, gateway).call())
            .await
    }

    async fn l2_token_address(&self, l1_token: Address) -> Result<Address, ClientError> {
        let router = IL1GatewayRouter::new(self.network.ethereum.gateway_router, &self.l1_provider);
        self.bounded(
            "calculateL2TokenAddress",
            router.calculateL2TokenAddress(l1_token).call(),
        )
        .await
    }
}

/// A JSON-RPC error response (as opposed to a transport failure) means the
/// node executed the call and it reverted.
fn is_revert(err: &ContractError) -> bool {
    match err {
        ContractError::TransportError(e) => e.as_error_resp().is_some(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_provider::ProviderBuilder;

    fn bridge_with(settings: BridgeSettings) -> ArbitrumBridge<impl Provider + Clone, impl Provider + Clone> {
        // Nothing listens here; only code paths that never reach the network are exercised.
        let l1 = ProviderBuilder::new().connect_http("http://127.0.0.1:1".parse().unwrap());
        let l2 = ProviderBuilder::new().connect_http("http://127.0.0.1:1".parse().unwrap());
        ArbitrumBridge::new(l1, l2, Address::ZERO, NetworkConfig::mainnet(), settings)
    }

    #[tokio::test]
    async fn test_unchunked_range_is_open_ended() {
        let bridge = bridge_with(BridgeSettings::default());

        let ranges = bridge.block_ranges(&EventFilter::default()).await.unwrap();
        assert_eq!(ranges, vec![(0, BlockNumberOrTag::Latest)]);

        let ranges = bridge
            .block_ranges(&EventFilter::new(Some(5), Some(9)))
            .await
            .unwrap();
        assert_eq!(ranges, vec![(5, BlockNumberOrTag::Number(9))]);
    }

    #[tokio::test]
    async fn test_chunked_ranges_cover_bounded_filter() {
        let bridge = bridge_with(BridgeSettings {
            log_chunk_size: Some(10),
            ..Default::default()
        });

        let ranges = bridge
            .block_ranges(&EventFilter::new(Some(5), Some(30)))
            .await
            .unwrap();

        assert_eq!(
            ranges,
            vec![
                (5, BlockNumberOrTag::Number(14)),
                (15, BlockNumberOrTag::Number(24)),
                (25, BlockNumberOrTag::Number(30)),
            ]
        );
    }

    #[tokio::test]
    async fn test_oversized_index_is_rejected_before_any_call() {
        let bridge = bridge_with(BridgeSettings::default());

        let result = bridge
            .outbound_message_state(U256::from(1), U256::MAX)
            .await;

        assert!(matches!(result, Err(ClientError::Provider(_))));
    }
}
