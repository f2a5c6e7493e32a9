use crate::TokenError;
use alloy_primitives::Address;
use client::BridgeClient;
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::warn;

/// Symbol shown when a token's metadata cannot be read.
pub const PLACEHOLDER_SYMBOL: &str = "???";

/// Decimals assumed when a token's metadata cannot be read.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Process-wide memo of token symbols and decimals.
///
/// Successful lookups are kept for the lifetime of the cache; failures are
/// not cached, so the next call retries the chain.
#[derive(Debug, Default)]
pub struct TokenMetadataCache {
    symbols: RwLock<HashMap<Address, String>>,
    decimals: RwLock<HashMap<Address, u8>>,
}

impl TokenMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn symbol<B: BridgeClient>(
        &self,
        bridge: &B,
        token: Address,
    ) -> Result<String, TokenError> {
        if let Some(symbol) = self.cached_symbol(token) {
            return Ok(symbol);
        }

        let symbol = bridge
            .token_symbol(token)
            .await
            .map_err(|e| TokenError::unavailable(token, e))?;
        self.symbols.write().insert(token, symbol.clone());

        Ok(symbol)
    }

    pub async fn decimals<B: BridgeClient>(
        &self,
        bridge: &B,
        token: Address,
    ) -> Result<u8, TokenError> {
        if let Some(decimals) = self.cached_decimals(token) {
            return Ok(decimals);
        }

        let decimals = bridge
            .token_decimals(token)
            .await
            .map_err(|e| TokenError::unavailable(token, e))?;
        self.decimals.write().insert(token, decimals);

        Ok(decimals)
    }

    /// Like [`Self::symbol`], degrading to [`PLACEHOLDER_SYMBOL`].
    pub async fn symbol_or_placeholder<B: BridgeClient>(&self, bridge: &B, token: Address) -> String {
        match self.symbol(bridge, token).await {
            Ok(symbol) => symbol,
            Err(e) => {
                warn!(token = %token, error = %e, "Using placeholder symbol");
                PLACEHOLDER_SYMBOL.to_string()
            }
        }
    }

    /// Like [`Self::decimals`], degrading to [`DEFAULT_DECIMALS`].
    pub async fn decimals_or_default<B: BridgeClient>(&self, bridge: &B, token: Address) -> u8 {
        match self.decimals(bridge, token).await {
            Ok(decimals) => decimals,
            Err(e) => {
                warn!(token = %token, error = %e, "Using default decimals");
                DEFAULT_DECIMALS
            }
        }
    }

    fn cached_symbol(&self, token: Address) -> Option<String> {
        self.symbols.read().get(&token).cloned()
    }

    fn cached_decimals(&self, token: Address) -> Option<u8> {
        self.decimals.read().get(&token).copied()
    }
}
