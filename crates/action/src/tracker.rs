//! Bookkeeping of submitted transactions.

use alloy_primitives::{Address, TxHash, U256};
use client::types::TxReceipt;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;
use withdrawal::AssetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Deposit,
    Withdraw,
    Approve,
    Outbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedTransaction {
    pub tx_hash: TxHash,
    pub kind: TxKind,
    pub status: TxStatus,
    /// Amount in whole units, e.g. `1.0`
    pub value: Option<String>,
    pub asset_name: String,
    pub asset_type: AssetKind,
    pub sender: Address,
    pub l1_network_id: u64,
    pub block_number: Option<u64>,
    /// Set for deposits once mined
    pub inbox_sequence_number: Option<U256>,
}

impl TrackedTransaction {
    /// A freshly submitted transaction.
    pub fn pending(
        tx_hash: TxHash,
        kind: TxKind,
        asset_name: impl Into<String>,
        asset_type: AssetKind,
        sender: Address,
        l1_network_id: u64,
    ) -> Self {
        Self {
            tx_hash,
            kind,
            status: TxStatus::Pending,
            value: None,
            asset_name: asset_name.into(),
            asset_type,
            sender,
            l1_network_id,
            block_number: None,
            inbox_sequence_number: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Records submitted transactions and their outcome.
pub trait TransactionTracker: Send + Sync {
    fn add(&self, tx: TrackedTransaction);

    /// Returns false if the hash is unknown.
    fn set_status(&self, tx_hash: TxHash, status: TxStatus, block_number: Option<u64>) -> bool;

    fn set_inbox_sequence_number(&self, tx_hash: TxHash, sequence_number: U256) -> bool;

    fn get(&self, tx_hash: TxHash) -> Option<TrackedTransaction>;

    /// Every tracked transaction, oldest first.
    fn all(&self) -> Vec<TrackedTransaction>;

    fn set_confirmed(&self, tx_hash: TxHash, block_number: Option<u64>) -> bool {
        self.set_status(tx_hash, TxStatus::Confirmed, block_number)
    }

    fn set_failed(&self, tx_hash: TxHash, block_number: Option<u64>) -> bool {
        self.set_status(tx_hash, TxStatus::Failed, block_number)
    }

    /// Confirmed or failed according to the receipt status.
    fn record_receipt(&self, receipt: &TxReceipt) -> bool {
        if receipt.status {
            self.set_confirmed(receipt.tx_hash, receipt.block_number)
        } else {
            self.set_failed(receipt.tx_hash, receipt.block_number)
        }
    }
}

/// Tracker kept in memory for the lifetime of a session.
#[derive(Debug, Default)]
pub struct InMemoryTracker {
    transactions: RwLock<Vec<TrackedTransaction>>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn modify(&self, tx_hash: TxHash, f: impl FnOnce(&mut TrackedTransaction)) -> bool {
        let mut transactions = self.transactions.write();
        match transactions.iter_mut().find(|tx| tx.tx_hash == tx_hash) {
            Some(tx) => {
                f(tx);
                true
            }
            None => false,
        }
    }
}

impl TransactionTracker for InMemoryTracker {
    fn add(&self, tx: TrackedTransaction) {
        debug!(tx_hash = %tx.tx_hash, kind = ?tx.kind, "Tracking transaction");

        let mut transactions = self.transactions.write();
        match transactions.iter_mut().find(|t| t.tx_hash == tx.tx_hash) {
            Some(existing) => *existing = tx,
            None => transactions.push(tx),
        }
    }

    fn set_status(&self, tx_hash: TxHash, status: TxStatus, block_number: Option<u64>) -> bool {
        self.modify(tx_hash, |tx| {
            tx.status = status;
            tx.block_number = block_number.or(tx.block_number);
        })
    }

    fn set_inbox_sequence_number(&self, tx_hash: TxHash, sequence_number: U256) -> bool {
        self.modify(tx_hash, |tx| tx.inbox_sequence_number = Some(sequence_number))
    }

    fn get(&self, tx_hash: TxHash) -> Option<TrackedTransaction> {
        self.transactions
            .read()
            .iter()
            .find(|tx| tx.tx_hash == tx_hash)
            .cloned()
    }

    fn all(&self) -> Vec<TrackedTransaction> {
        self.transactions.read().clone()
    }
}
