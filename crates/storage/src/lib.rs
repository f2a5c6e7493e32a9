//! Durable local state for the bridge client.
//!
//! State is kept as one JSON document per namespace, mirroring a browser-style
//! key-value storage: the executed-message cache and the token-list caches
//! each live under their own namespace and can be cleared independently.

pub mod file;
pub mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing medium failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be encoded or decoded
    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Namespaced JSON document store.
///
/// Implementations must be safe to share between tasks; writes to the same
/// namespace are last-write-wins.
pub trait Store: Send + Sync {
    /// Load the document stored under `namespace`, if any.
    fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError>;

    /// Replace the document stored under `namespace`.
    fn save(&self, namespace: &str, value: &Value) -> Result<(), StoreError>;

    /// Delete the document stored under `namespace`. Missing documents are not an error.
    fn remove(&self, namespace: &str) -> Result<(), StoreError>;
}

impl dyn Store {
    /// Load and decode a typed document.
    pub fn get<T: DeserializeOwned>(&self, namespace: &str) -> Result<Option<T>, StoreError> {
        match self.load(namespace)? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Encode and store a typed document.
    pub fn put<T: Serialize>(&self, namespace: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value)?;
        self.save(namespace, &value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::BTreeMap, sync::Arc};

    #[test]
    fn test_typed_roundtrip_through_trait_object() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());

        let mut entries = BTreeMap::new();
        entries.insert("7,3".to_string(), true);
        store.put("executedMessagesCache", &entries).unwrap();

        let loaded: Option<BTreeMap<String, bool>> = store.get("executedMessagesCache").unwrap();
        assert_eq!(loaded, Some(entries));
    }

    #[test]
    fn test_typed_get_rejects_mismatched_shape() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        store.put("ERC20Cache", &"not a list").unwrap();

        let loaded = store.get::<Vec<String>>("ERC20Cache");
        assert!(matches!(loaded, Err(StoreError::Serialization(_))));
    }
}
