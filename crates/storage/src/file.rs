use crate::{Store, StoreError};
use parking_lot::Mutex;
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Store keeping one `<namespace>.json` file per namespace in a directory.
///
/// Writes go to a temporary file first and are renamed into place, so a crash
/// mid-write never leaves a truncated document behind.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        debug!(dir = %dir.display(), "Opened state directory");

        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> PathBuf {
        self.dir.join(format!("{namespace}.json"))
    }
}

impl Store for JsonFileStore {
    fn load(&self, namespace: &str) -> Result<Option<Value>, StoreError> {
        let contents = match fs::read_to_string(self.path_for(namespace)) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, namespace: &str, value: &Value) -> Result<(), StoreError> {
        let encoded = serde_json::to_vec_pretty(value)?;
        let path = self.path_for(namespace);
        let tmp = path.with_extension("json.tmp");

        let _guard = self.write_lock.lock();
        fs::write(&tmp, encoded)?;
        fs::rename(&tmp, &path)?;

        Ok(())
    }

    fn remove(&self, namespace: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.path_for(namespace)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_missing_namespace_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.load("executedMessagesCache").unwrap().is_none());
    }

    #[test]
    fn test_documents_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store
                .save("executedMessagesCache", &json!({ "7,3": true }))
                .unwrap();
        }

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert_eq!(
            reopened.load("executedMessagesCache").unwrap(),
            Some(json!({ "7,3": true }))
        );
        assert!(!dir.path().join("executedMessagesCache.json.tmp").exists());
    }

    #[test]
    fn test_remove_only_touches_one_namespace() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        store.save("ERC20Cache", &json!(["0x01"])).unwrap();
        store.save("ERC721Cache", &json!(["0x02"])).unwrap();

        store.remove("ERC20Cache").unwrap();
        store.remove("ERC20Cache").unwrap();

        assert!(store.load("ERC20Cache").unwrap().is_none());
        assert_eq!(store.load("ERC721Cache").unwrap(), Some(json!(["0x02"])));
    }

    #[test]
    fn test_corrupt_document_is_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        fs::write(dir.path().join("ERC20Cache.json"), "{not json").unwrap();

        assert!(matches!(
            store.load("ERC20Cache"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn test_open_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("state").join("relayer");
        let store = JsonFileStore::open(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.dir(), nested.as_path());
    }
}
