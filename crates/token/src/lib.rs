//! Token metadata and the bridge's token registry.

pub mod metadata;
pub mod registry;

pub use metadata::TokenMetadataCache;
pub use registry::{BridgeToken, TokenList, TokenRegistry};

use alloy_primitives::Address;
use std::fmt::Display;
use storage::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TokenError {
    /// A token contract call failed or returned garbage
    #[error("Token data unavailable for {address}: {reason}")]
    TokenDataUnavailable { address: Address, reason: String },

    /// Registry caches could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TokenError {
    pub fn unavailable(address: Address, reason: impl Display) -> Self {
        Self::TokenDataUnavailable {
            address,
            reason: reason.to_string(),
        }
    }
}
