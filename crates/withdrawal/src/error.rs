use alloy_primitives::TxHash;
use client::ClientError;
use storage::StoreError;
use thiserror::Error;
use token::TokenError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// No pending withdrawal with this id
    #[error("Withdrawal {0} not found")]
    NotFound(String),

    /// A transaction emitted more than one outbound message
    #[error("Transaction {tx_hash} emitted {count} outbound messages; only one is supported")]
    MultipleMessagesUnsupported { tx_hash: TxHash, count: usize },

    /// A transaction expected to emit an outbound message emitted none
    #[error("No outbound message in transaction {0}")]
    MessageNotFound(TxHash),

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
