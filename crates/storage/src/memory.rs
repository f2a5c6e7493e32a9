use crate::{Store, StoreError};
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;

/// Volatile store, used by tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of namespaces currently holding a document.
    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

impl Store for MemoryStore {
    fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.documents.read().get(namespace).cloned())
    }

    fn save(&self, namespace: &str, value: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .insert(namespace.to_string(), value.clone());
        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<(), StoreError> {
        self.documents.write().remove(namespace);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_load_remove() {
        let store = MemoryStore::new();
        assert!(store.load("ERC20Cache").unwrap().is_none());

        store.save("ERC20Cache", &json!(["0xabc"])).unwrap();
        assert_eq!(store.load("ERC20Cache").unwrap(), Some(json!(["0xabc"])));
        assert_eq!(store.len(), 1);

        store.remove("ERC20Cache").unwrap();
        assert!(store.is_empty());
        // removing twice is fine
        store.remove("ERC20Cache").unwrap();
    }
}
