//! Raw chain-level types returned by [`crate::BridgeClient`].

use alloy_primitives::{Address, Bytes, Log, TxHash, U256};
use alloy_rpc_types_eth::TransactionReceipt;
use alloy_sol_types::SolEvent;
use binding::arbitrum::{IArbSys::L2ToL1Transaction, IInbox, ARB_SYS_ADDRESS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an outbound (L2→L1) message as seen from L1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutgoingMessageState {
    /// The batch holding the message has not been confirmed on L1 yet
    Unconfirmed,
    /// Confirmed and redeemable
    Confirmed,
    /// Already redeemed on L1; terminal
    Executed,
}

impl OutgoingMessageState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unconfirmed => "unconfirmed",
            Self::Confirmed => "confirmed",
            Self::Executed => "executed",
        }
    }
}

impl fmt::Display for OutgoingMessageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded `L2ToL1Transaction` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L2ToL1Event {
    pub caller: Address,
    pub destination: Address,
    pub unique_id: U256,
    pub batch_number: U256,
    pub index_in_batch: U256,
    pub arb_block_num: U256,
    pub eth_block_num: U256,
    pub timestamp: U256,
    pub callvalue: U256,
    pub data: Bytes,
    /// L2 transaction that emitted the event, when known
    pub tx_hash: Option<TxHash>,
}

impl L2ToL1Event {
    pub fn from_event(event: &L2ToL1Transaction, tx_hash: Option<TxHash>) -> Self {
        Self {
            caller: event.caller,
            destination: event.destination,
            unique_id: event.uniqueId,
            batch_number: event.batchNumber,
            index_in_batch: event.indexInBatch,
            arb_block_num: event.arbBlockNum,
            eth_block_num: event.ethBlockNum,
            timestamp: event.timestamp,
            callvalue: event.callvalue,
            data: event.data.clone(),
            tx_hash,
        }
    }

    /// Encode back into the log ArbSys would emit.
    pub fn to_log(&self) -> Log {
        let event = L2ToL1Transaction {
            caller: self.caller,
            destination: self.destination,
            uniqueId: self.unique_id,
            batchNumber: self.batch_number,
            indexInBatch: self.index_in_batch,
            arbBlockNum: self.arb_block_num,
            ethBlockNum: self.eth_block_num,
            timestamp: self.timestamp,
            callvalue: self.callvalue,
            data: self.data.clone(),
        };

        Log {
            address: ARB_SYS_ADDRESS,
            data: event.encode_log_data(),
        }
    }

    /// Native transfers carry no payload; token withdrawals carry gateway calldata.
    pub fn is_native_transfer(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decoded `WithdrawalInitiated` gateway event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayWithdrawal {
    pub l1_token: Address,
    pub from: Address,
    pub to: Address,
    pub l2_to_l1_id: U256,
    pub exit_num: U256,
    pub amount: U256,
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
}

/// Optional block range for event queries. Missing bounds mean genesis / latest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
}

impl EventFilter {
    pub const fn new(from_block: Option<u64>, to_block: Option<u64>) -> Self {
        Self {
            from_block,
            to_block,
        }
    }

    pub fn contains(&self, block: u64) -> bool {
        self.from_block.is_none_or(|from| block >= from)
            && self.to_block.is_none_or(|to| block <= to)
    }
}

/// Chain a transaction was submitted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Chain {
    L1,
    L2,
}

/// Handle to a submitted, not yet confirmed transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedTx {
    pub hash: TxHash,
    pub chain: Chain,
}

impl SubmittedTx {
    pub const fn l1(hash: TxHash) -> Self {
        Self {
            hash,
            chain: Chain::L1,
        }
    }

    pub const fn l2(hash: TxHash) -> Self {
        Self {
            hash,
            chain: Chain::L2,
        }
    }
}

/// Chain-agnostic view of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: u64,
    /// false when the transaction reverted
    pub status: bool,
    pub logs: Vec<Log>,
}

impl From<&TransactionReceipt> for TxReceipt {
    fn from(receipt: &TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            gas_used: receipt.gas_used,
            status: receipt.status(),
            logs: receipt.logs().iter().map(|log| log.inner.clone()).collect(),
        }
    }
}

/// All outbound messages emitted by a transaction through ArbSys.
pub fn extract_l2_to_l1_events(receipt: &TxReceipt) -> Vec<L2ToL1Event> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == ARB_SYS_ADDRESS)
        .filter_map(|log| L2ToL1Transaction::decode_log(log).ok())
        .map(|decoded| L2ToL1Event::from_event(&decoded.data, Some(receipt.tx_hash)))
        .collect()
}

/// Inbox sequence numbers assigned to the messages a deposit created.
///
/// Only logs emitted by `inbox` are considered.
pub fn extract_inbox_sequence_numbers(receipt: &TxReceipt, inbox: Address) -> Vec<U256> {
    receipt
        .logs
        .iter()
        .filter(|log| log.address == inbox)
        .filter_map(|log| {
            if let Ok(decoded) = IInbox::InboxMessageDelivered::decode_log(log) {
                return Some(decoded.data.messageNum);
            }
            IInbox::InboxMessageDeliveredFromOrigin::decode_log(log)
                .ok()
                .map(|decoded| decoded.data.messageNum)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256, bytes};

    fn sample_event(unique_id: u64, data: Bytes) -> L2ToL1Event {
        L2ToL1Event {
            caller: address!("1111111111111111111111111111111111111111"),
            destination: address!("2222222222222222222222222222222222222222"),
            unique_id: U256::from(unique_id),
            batch_number: U256::from(7),
            index_in_batch: U256::from(3),
            arb_block_num: U256::from(100),
            eth_block_num: U256::from(50),
            timestamp: U256::from(1_600_000_000u64),
            callvalue: U256::from(10).pow(U256::from(18)),
            data,
            tx_hash: None,
        }
    }

    fn receipt_with(logs: Vec<Log>) -> TxReceipt {
        TxReceipt {
            tx_hash: b256!("00000000000000000000000000000000000000000000000000000000000000aa"),
            block_number: Some(12),
            gas_used: 21_000,
            status: true,
            logs,
        }
    }

    #[test]
    fn test_extract_l2_to_l1_events_from_logs() {
        let event = sample_event(42, Bytes::new());
        let receipt = receipt_with(vec![event.to_log()]);

        let extracted = extract_l2_to_l1_events(&receipt);

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].unique_id, U256::from(42));
        assert_eq!(extracted[0].destination, event.destination);
        assert_eq!(extracted[0].tx_hash, Some(receipt.tx_hash));
        assert!(extracted[0].is_native_transfer());
    }

    #[test]
    fn test_extract_ignores_unrelated_logs() {
        let unrelated = Log::new_unchecked(
            address!("3333333333333333333333333333333333333333"),
            vec![b256!(
                "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
            )],
            Bytes::new(),
        );
        let token_event = sample_event(43, bytes!("deadbeef"));
        let receipt = receipt_with(vec![unrelated, token_event.to_log()]);

        let extracted = extract_l2_to_l1_events(&receipt);

        assert_eq!(extracted.len(), 1);
        assert!(!extracted[0].is_native_transfer());
    }

    #[test]
    fn test_extract_inbox_sequence_numbers() {
        let delivered = IInbox::InboxMessageDelivered {
            messageNum: U256::from(9),
            data: Bytes::new(),
        };
        let from_origin = IInbox::InboxMessageDeliveredFromOrigin {
            messageNum: U256::from(10),
        };
        let inbox = address!("4Dbd4fc535Ac27206064B68FfCf827b0A60BAB3f");
        let receipt = receipt_with(vec![
            Log {
                address: inbox,
                data: delivered.encode_log_data(),
            },
            Log {
                address: inbox,
                data: from_origin.encode_log_data(),
            },
        ]);

        assert_eq!(
            extract_inbox_sequence_numbers(&receipt, inbox),
            vec![U256::from(9), U256::from(10)]
        );
        assert!(extract_inbox_sequence_numbers(&receipt, Address::with_last_byte(0x1b)).is_empty());
    }

    #[test]
    fn test_extract_ignores_events_from_other_contracts() {
        let genuine = sample_event(42, Bytes::new());
        let mut imitation = sample_event(43, Bytes::new()).to_log();
        imitation.address = address!("3333333333333333333333333333333333333333");
        let receipt = receipt_with(vec![genuine.to_log(), imitation]);

        let extracted = extract_l2_to_l1_events(&receipt);

        assert_eq!(extracted.len(), 1);
        assert_eq!(extracted[0].unique_id, U256::from(42));
    }

    #[test]
    fn test_event_filter_bounds() {
        let open = EventFilter::default();
        assert!(open.contains(0));
        assert!(open.contains(u64::MAX));

        let bounded = EventFilter::new(Some(10), Some(20));
        assert!(!bounded.contains(9));
        assert!(bounded.contains(10));
        assert!(bounded.contains(20));
        assert!(!bounded.contains(21));
    }

    #[test]
    fn test_state_display_is_lowercase() {
        assert_eq!(OutgoingMessageState::Confirmed.to_string(), "confirmed");
        assert_eq!(OutgoingMessageState::Unconfirmed.as_str(), "unconfirmed");
    }
}
