use alloy_primitives::TxHash;
use std::{fmt::Display, time::Duration};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// Error parsing or validating URLs
    #[error("Invalid RPC URL: {0}")]
    InvalidUrl(String),

    /// Error with private key
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    /// Any failure reported by the node or the transport (including reverts)
    #[error("Provider error: {0}")]
    Provider(String),

    /// A call or confirmation wait exceeded its deadline
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The node has no receipt for a transaction that should be mined
    #[error("No receipt for transaction {0}")]
    MissingReceipt(TxHash),
}

impl ClientError {
    pub fn provider(err: impl Display) -> Self {
        Self::Provider(err.to_string())
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
