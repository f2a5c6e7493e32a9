use crate::{types::message_key, Result};
use alloy_primitives::U256;
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};
use storage::Store;
use tracing::{debug, info};

/// Namespace of the executed-message set in the state store.
pub const EXECUTED_MESSAGES_NAMESPACE: &str = "executedMessagesCache";

/// Durable set of outbound messages known to be executed on L1.
///
/// Entries are only added by a confirmed redemption and only removed by
/// [`ExecutionCache::clear`]. The lock is held across the store write so
/// persisted snapshots are never reordered.
pub struct ExecutionCache {
    store: Arc<dyn Store>,
    keys: Mutex<BTreeSet<String>>,
}

impl ExecutionCache {
    /// Load the persisted set (empty when nothing was stored yet).
    pub fn open(store: Arc<dyn Store>) -> Result<Self> {
        let stored: BTreeMap<String, bool> = store
            .get(EXECUTED_MESSAGES_NAMESPACE)?
            .unwrap_or_default();
        let keys: BTreeSet<String> = stored
            .into_iter()
            .filter_map(|(key, executed)| executed.then_some(key))
            .collect();

        debug!(entries = keys.len(), "Loaded execution cache");

        Ok(Self {
            store,
            keys: Mutex::new(keys),
        })
    }

    pub fn has(&self, batch_number: U256, index_in_batch: U256) -> bool {
        self.keys
            .lock()
            .contains(&message_key(batch_number, index_in_batch))
    }

    /// Record a message as executed. Returns whether it was new.
    ///
    /// The in-memory set is updated before persisting, so a failed write
    /// still suppresses further submissions in this process.
    pub fn mark(&self, batch_number: U256, index_in_batch: U256) -> Result<bool> {
        let key = message_key(batch_number, index_in_batch);

        let mut keys = self.keys.lock();
        if !keys.insert(key.clone()) {
            return Ok(false);
        }
        self.persist(&keys)?;

        debug!(key = %key, "Marked message executed");
        Ok(true)
    }

    /// Forget every entry, in memory and on disk.
    pub fn clear(&self) -> Result<()> {
        let mut keys = self.keys.lock();
        self.store.remove(EXECUTED_MESSAGES_NAMESPACE)?;
        let cleared = keys.len();
        keys.clear();

        info!(cleared, "Cleared execution cache");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.lock().is_empty()
    }

    fn persist(&self, keys: &BTreeSet<String>) -> Result<()> {
        let document: BTreeMap<&str, bool> = keys.iter().map(|key| (key.as_str(), true)).collect();
        self.store.put(EXECUTED_MESSAGES_NAMESPACE, &document)?;
        Ok(())
    }
}
