//! Tokens known to the bridge, and the persisted address lists that let a
//! restarted session rebuild them.

use crate::TokenError;
use alloy_primitives::{Address, U256};
use client::BridgeClient;
use futures::future::join_all;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, sync::Arc};
use storage::Store;
use tracing::{info, warn};

/// Namespace holding the L1 addresses of ERC20 tokens added by the user.
pub const ERC20_CACHE_NAMESPACE: &str = "ERC20Cache";

/// Namespace holding the L1 addresses of ERC721 tokens added by the user.
pub const ERC721_CACHE_NAMESPACE: &str = "ERC721Cache";

/// A bridgeable ERC20, keyed by its L1 address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeToken {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Whether the L1 gateway may already move the wallet's tokens
    pub allowed: bool,
    pub l1_address: Address,
    pub l2_address: Option<Address>,
}

/// Uniswap-style token list of L2 tokens.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub name: String,
    pub tokens: Vec<TokenListEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListEntry {
    #[serde(default)]
    pub chain_id: u64,
    /// L2 address
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub extensions: Option<TokenListExtensions>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenListExtensions {
    pub l1_address: Option<Address>,
}

pub struct TokenRegistry {
    store: Arc<dyn Store>,
    tokens: RwLock<BTreeMap<Address, BridgeToken>>,
}

impl TokenRegistry {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            tokens: RwLock::new(BTreeMap::new()),
        }
    }

    /// Read a token's metadata from chain and register it.
    ///
    /// The L1 address is remembered in the ERC20 cache so that
    /// [`Self::load_cached`] can restore it later.
    pub async fn add_token<B: BridgeClient>(
        &self,
        bridge: &B,
        l1_address: Address,
    ) -> Result<Address, TokenError> {
        let token = fetch_token(bridge, l1_address).await?;

        info!(
            token = %l1_address,
            symbol = %token.symbol,
            allowed = token.allowed,
            "Added token"
        );

        self.tokens.write().insert(l1_address, token);
        self.remember_erc20(l1_address)?;

        Ok(l1_address)
    }

    /// Register every list entry that names its L1 counterpart.
    ///
    /// No chain calls are made; imported tokens start out not allowed.
    /// Returns the number of tokens imported.
    pub fn add_token_list(&self, list: &TokenList) -> usize {
        let mut tokens = self.tokens.write();
        let mut imported = 0;

        for entry in &list.tokens {
            let Some(l1_address) = entry.extensions.as_ref().and_then(|ext| ext.l1_address) else {
                warn!(token = %entry.address, list = %list.name, "Token list entry without l1Address");
                continue;
            };

            tokens.insert(
                l1_address,
                BridgeToken {
                    name: entry.name.clone(),
                    symbol: entry.symbol.clone(),
                    decimals: entry.decimals,
                    allowed: false,
                    l1_address,
                    l2_address: Some(entry.address),
                },
            );
            imported += 1;
        }

        info!(list = %list.name, imported, "Imported token list");
        imported
    }

    /// Re-add every address in the ERC20 cache.
    ///
    /// Entries whose metadata can no longer be read are dropped from the cache.
    pub async fn load_cached<B: BridgeClient>(&self, bridge: &B) -> Result<Vec<Address>, TokenError> {
        let cached = self.erc20_cache()?;

        let results = join_all(cached.iter().map(|address| async move {
            (*address, fetch_token(bridge, *address).await)
        }))
        .await;

        let mut loaded = Vec::with_capacity(results.len());
        {
            let mut tokens = self.tokens.write();
            for (address, result) in results {
                match result {
                    Ok(token) => {
                        tokens.insert(address, token);
                        loaded.push(address);
                    }
                    Err(e) => warn!(token = %address, error = %e, "Invalid ERC20 cache entry"),
                }
            }
        }

        self.store.put(ERC20_CACHE_NAMESPACE, &loaded)?;
        Ok(loaded)
    }

    pub fn get(&self, l1_address: &Address) -> Option<BridgeToken> {
        self.tokens.read().get(l1_address).cloned()
    }

    pub fn tokens(&self) -> Vec<BridgeToken> {
        self.tokens.read().values().cloned().collect()
    }

    pub fn erc20_cache(&self) -> Result<Vec<Address>, TokenError> {
        Ok(self.store.get(ERC20_CACHE_NAMESPACE)?.unwrap_or_default())
    }

    pub fn erc721_cache(&self) -> Result<Vec<Address>, TokenError> {
        Ok(self.store.get(ERC721_CACHE_NAMESPACE)?.unwrap_or_default())
    }

    /// Forget both persisted address lists. Registered tokens stay loaded.
    pub fn expire_cache(&self) -> Result<(), TokenError> {
        self.store.remove(ERC20_CACHE_NAMESPACE)?;
        self.store.remove(ERC721_CACHE_NAMESPACE)?;
        info!("Expired token caches");
        Ok(())
    }

    fn remember_erc20(&self, l1_address: Address) -> Result<(), TokenError> {
        let mut cached = self.erc20_cache()?;
        if !cached.contains(&l1_address) {
            cached.push(l1_address);
            self.store.put(ERC20_CACHE_NAMESPACE, &cached)?;
        }
        Ok(())
    }
}

async fn fetch_token<B: BridgeClient>(bridge: &B, l1_address: Address) -> Result<BridgeToken, TokenError> {
    let unavailable = |e| TokenError::unavailable(l1_address, e);

    let (name, symbol, decimals, allowance) = futures::try_join!(
        bridge.token_name(l1_address),
        bridge.token_symbol(l1_address),
        bridge.token_decimals(l1_address),
        bridge.token_allowance(l1_address),
    )
    .map_err(unavailable)?;

    let l2_address = match bridge.l2_token_address(l1_address).await {
        Ok(address) => Some(address),
        Err(e) => {
            info!(token = %l1_address, error = %e, "No L2 token yet");
            None
        }
    };

    Ok(BridgeToken {
        name,
        symbol,
        decimals,
        allowed: allowance > U256::ZERO,
        l1_address,
        l2_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use client::test_utils::{MockBridge, MockToken};
    use storage::MemoryStore;

    const WALLET: Address = address!("00000000000000000000000000000000000000aa");
    const DAI: Address = address!("6B175474E89094C44Da98b954EedeAC495271d0F");
    const L2_DAI: Address = address!("DA10009cBd5D07dd0CeCc66161FC93D7c9000da1");
    const GONE: Address = address!("00000000000000000000000000000000000000ff");

    fn setup() -> (MockBridge, Arc<dyn Store>, TokenRegistry) {
        let bridge = MockBridge::new(WALLET);
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let registry = TokenRegistry::new(store.clone());
        (bridge, store, registry)
    }

    #[tokio::test]
    async fn test_add_token_reads_chain_and_persists() {
        let (bridge, _store, registry) = setup();
        bridge.add_token(
            DAI,
            MockToken {
                allowance: U256::from(1),
                l2_address: Some(L2_DAI),
                ..MockToken::new("Dai Stablecoin", "DAI", 18)
            },
        );

        let added = registry.add_token(&bridge, DAI).await.unwrap();
        let token = registry.get(&DAI).unwrap();

        assert_eq!(added, DAI);
        assert_eq!(token.symbol, "DAI");
        assert!(token.allowed);
        assert_eq!(token.l2_address, Some(L2_DAI));
        assert_eq!(registry.erc20_cache().unwrap(), vec![DAI]);

        registry.add_token(&bridge, DAI).await.unwrap();
        assert_eq!(registry.erc20_cache().unwrap(), vec![DAI]);
    }

    #[tokio::test]
    async fn test_missing_l2_token_is_not_an_error() {
        let (bridge, _store, registry) = setup();
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));

        registry.add_token(&bridge, DAI).await.unwrap();

        let token = registry.get(&DAI).unwrap();
        assert_eq!(token.l2_address, None);
        assert!(!token.allowed);
    }

    #[tokio::test]
    async fn test_unreadable_token_is_rejected() {
        let (bridge, _store, registry) = setup();

        let err = registry.add_token(&bridge, GONE).await.unwrap_err();

        assert!(matches!(err, TokenError::TokenDataUnavailable { address, .. } if address == GONE));
        assert!(registry.get(&GONE).is_none());
        assert!(registry.erc20_cache().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_load_cached_drops_invalid_entries() {
        let (bridge, store, registry) = setup();
        bridge.add_token(DAI, MockToken::new("Dai Stablecoin", "DAI", 18));
        store.put(ERC20_CACHE_NAMESPACE, &vec![DAI, GONE]).unwrap();

        let loaded = registry.load_cached(&bridge).await.unwrap();

        assert_eq!(loaded, vec![DAI]);
        assert_eq!(registry.erc20_cache().unwrap(), vec![DAI]);
        assert!(registry.get(&DAI).is_some());
    }

    #[test]
    fn test_token_list_import() {
        let (_bridge, _store, registry) = setup();
        let list: TokenList = serde_json::from_str(
            r#"{
                "name": "Arbed Uniswap List",
                "tokens": [
                    {
                        "chainId": 42161,
                        "address": "0xDA10009cBd5D07dd0CeCc66161FC93D7c9000da1",
                        "name": "Dai Stablecoin",
                        "symbol": "DAI",
                        "decimals": 18,
                        "extensions": { "l1Address": "0x6B175474E89094C44Da98b954EedeAC495271d0F" }
                    },
                    {
                        "chainId": 42161,
                        "address": "0x0000000000000000000000000000000000000001",
                        "name": "Orphan",
                        "symbol": "ORP",
                        "decimals": 6
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(registry.add_token_list(&list), 1);

        let dai = registry.get(&DAI).unwrap();
        assert_eq!(dai.l2_address, Some(L2_DAI));
        assert!(!dai.allowed);
        assert_eq!(registry.tokens().len(), 1);
    }

    #[tokio::test]
    async fn test_expire_cache_clears_both_lists() {
        let (_bridge, store, registry) = setup();
        store.put(ERC20_CACHE_NAMESPACE, &vec![DAI]).unwrap();
        store.put(ERC721_CACHE_NAMESPACE, &vec![GONE]).unwrap();

        registry.expire_cache().unwrap();

        assert!(registry.erc20_cache().unwrap().is_empty());
        assert!(registry.erc721_cache().unwrap().is_empty());
    }
}
