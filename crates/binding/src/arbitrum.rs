//! Rollup core contract bindings.
//!
//! Includes contracts for moving messages between the two chains:
//! - ArbSys (L2 precompile, initiates L2→L1 messages)
//! - NodeInterface (L2 virtual contract, serves outbox proofs)
//! - ArbRetryableTx (L2 precompile, prices retryable submissions)
//! - Inbox (L1, deposits)
//! - Outbox / OutboxEntry (L1, message execution)

use alloy_primitives::{address, Address};
use alloy_sol_types::sol;

/// ArbSys precompile address (same on every rollup instance).
pub const ARB_SYS_ADDRESS: Address = address!("0000000000000000000000000000000000000064");

/// ArbRetryableTx precompile address.
pub const ARB_RETRYABLE_TX_ADDRESS: Address =
    address!("000000000000000000000000000000000000006E");

/// NodeInterface virtual contract address.
pub const NODE_INTERFACE_ADDRESS: Address = address!("00000000000000000000000000000000000000C8");

sol! {
    /// ArbSys - L2 precompile for sending messages to L1
    #[sol(rpc)]
    interface IArbSys {
        /// Emitted for every outbound L2→L1 message
        event L2ToL1Transaction(
            address caller,
            address indexed destination,
            uint256 indexed uniqueId,
            uint256 indexed batchNumber,
            uint256 indexInBatch,
            uint256 arbBlockNum,
            uint256 ethBlockNum,
            uint256 timestamp,
            uint256 callvalue,
            bytes data
        );

        /// Send ETH to an L1 destination
        function withdrawEth(address destination) external payable returns (uint256);
    }

    /// NodeInterface - serves merkle proofs for outbox batches
    #[sol(rpc)]
    interface INodeInterface {
        /// Reverts while the batch has not been created yet
        function lookupMessageBatchProof(uint256 batchNum, uint64 index)
            external
            view
            returns (
                bytes32[] memory proof,
                uint256 path,
                address l2Sender,
                address l1Dest,
                uint256 l2Block,
                uint256 l1Block,
                uint256 timestamp,
                uint256 amount,
                bytes memory calldataForL1
            );
    }

    /// ArbRetryableTx - retryable ticket pricing
    #[sol(rpc)]
    interface IArbRetryableTx {
        /// Returns (price, nextUpdateTimestamp)
        function getSubmissionPrice(uint256 calldataSize) external view returns (uint256, uint256);
    }

    /// Inbox - L1 entry point for deposits
    #[sol(rpc)]
    interface IInbox {
        /// Emitted for every message delivered to the inbox
        event InboxMessageDelivered(uint256 indexed messageNum, bytes data);

        /// Emitted when the message data is taken from tx calldata
        event InboxMessageDeliveredFromOrigin(uint256 indexed messageNum);

        /// Deposit ETH into the rollup as a retryable ticket
        function depositEth(uint256 maxSubmissionCost) external payable returns (uint256);
    }

    /// Outbox - L1 contract executing confirmed L2→L1 messages
    #[sol(rpc)]
    #[allow(clippy::too_many_arguments)]
    interface IOutbox {
        /// Emitted when an outbound message is executed
        event OutBoxTransactionExecuted(
            address indexed destAddr,
            address indexed l2Sender,
            uint256 indexed outboxEntryIndex,
            uint256 transactionIndex
        );

        /// Whether the batch root has been posted (the batch is confirmed)
        function outboxEntryExists(uint256 batchNum) external view returns (bool);

        /// OutboxEntry contract holding the batch root and spent set
        function outboxEntries(uint256 batchNum) external view returns (address);

        /// Execute a confirmed message
        function executeTransaction(
            uint256 batchNum,
            bytes32[] calldata proof,
            uint256 index,
            address l2Sender,
            address destAddr,
            uint256 l2Block,
            uint256 l1Block,
            uint256 l2Timestamp,
            uint256 amount,
            bytes calldata calldataForL1
        ) external;
    }

    /// OutboxEntry - per-batch record of spent outputs
    #[sol(rpc)]
    interface IOutboxEntry {
        function spentOutput(bytes32 path) external view returns (bool);
    }
}
