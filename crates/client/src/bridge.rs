use crate::{
    types::{
        extract_inbox_sequence_numbers, extract_l2_to_l1_events, EventFilter, GatewayWithdrawal,
        L2ToL1Event, OutgoingMessageState, SubmittedTx, TxReceipt,
    },
    ClientError,
};
use alloy_primitives::{Address, TxHash, U256};
use std::future::Future;

/// Chain operations the bridge needs from both sides.
///
/// Submission methods return as soon as the transaction is accepted by the
/// node; callers confirm with [`BridgeClient::wait_for_receipt`]. Token
/// addresses are always the L1 token address.
pub trait BridgeClient: Send + Sync {
    /// Account that signs and receives.
    fn wallet_address(&self) -> Address;

    /// Chain id of the base chain (L1).
    fn l1_chain_id(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    /// Deposit native currency into the rollup.
    fn deposit_native(
        &self,
        amount: U256,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Deposit an ERC20 through the L1 gateway router.
    fn deposit_token(
        &self,
        l1_token: Address,
        amount: U256,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Approve the token's L1 gateway to move the wallet's tokens.
    fn approve_token(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Start a native withdrawal on L2.
    fn withdraw_native(
        &self,
        amount: U256,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Start a token withdrawal through the L2 gateway router.
    fn withdraw_token(
        &self,
        l1_token: Address,
        amount: U256,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Redeem a confirmed outbound message on L1.
    fn execute_outbound_message(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> impl Future<Output = Result<SubmittedTx, ClientError>> + Send;

    /// Wait until a submitted transaction is mined.
    fn wait_for_receipt(
        &self,
        tx: &SubmittedTx,
    ) -> impl Future<Output = Result<TxReceipt, ClientError>> + Send;

    /// Authoritative on-chain state of an outbound message.
    fn outbound_message_state(
        &self,
        batch_number: U256,
        index_in_batch: U256,
    ) -> impl Future<Output = Result<OutgoingMessageState, ClientError>> + Send;

    /// `L2ToL1Transaction` events addressed to `destination`.
    fn native_withdrawal_events(
        &self,
        destination: Address,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<L2ToL1Event>, ClientError>> + Send;

    /// `WithdrawalInitiated` events of one gateway addressed to `destination`.
    fn gateway_withdrawal_events(
        &self,
        gateway: Address,
        destination: Address,
        filter: &EventFilter,
    ) -> impl Future<Output = Result<Vec<GatewayWithdrawal>, ClientError>> + Send;

    /// Receipt of a mined L2 transaction.
    fn l2_transaction_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TxReceipt, ClientError>> + Send;

    /// Outbound messages emitted by a mined transaction.
    fn messages_in_receipt(&self, receipt: &TxReceipt) -> Vec<L2ToL1Event> {
        extract_l2_to_l1_events(receipt)
    }

    /// L1 inbox that deposits are delivered through.
    fn inbox_address(&self) -> Address;

    /// Inbox sequence numbers created by a mined deposit.
    fn inbox_sequence_numbers(&self, receipt: &TxReceipt) -> Vec<U256> {
        extract_inbox_sequence_numbers(receipt, self.inbox_address())
    }

    fn token_symbol(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    fn token_decimals(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<u8, ClientError>> + Send;

    fn token_name(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<String, ClientError>> + Send;

    /// Allowance the wallet has granted the token's L1 gateway.
    fn token_allowance(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<U256, ClientError>> + Send;

    /// Counterpart of an L1 token on L2.
    fn l2_token_address(
        &self,
        l1_token: Address,
    ) -> impl Future<Output = Result<Address, ClientError>> + Send;
}
