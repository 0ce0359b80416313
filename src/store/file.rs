use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};

use super::SettingsStore;
use crate::error::StoreError;

/// JSON-object file store.
///
/// Every read goes to disk so writes from another process are seen on the
/// next access. Writes replace the file atomically.
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Map<String, Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => return Err(StoreError::Read { path: self.path.clone(), source }),
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&text)
            .map_err(|source| StoreError::Corrupt { path: self.path.clone(), source })
    }

    fn persist(&self, map: &Map<String, Value>) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write { path: self.path.clone(), source };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(map)
            .map_err(|e| write_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)
    }

    fn update(&self, f: impl FnOnce(&mut Map<String, Value>) -> bool) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut map = self.load()?;
        if f(&mut map) {
            self.persist(&map)?;
        }
        Ok(())
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.update(|map| {
            map.insert(key.to_string(), value);
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|map| map.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_reads_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("storage.json"));
        assert_eq!(store.get("openAIAPIKey").unwrap(), None);
    }

    #[test]
    fn values_survive_a_new_instance() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");
        FileStore::new(&path).set("textCompletion", json!(true)).unwrap();

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("textCompletion").unwrap(), Some(json!(true)));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn set_touches_only_its_key() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("storage.json"));
        store.set("openAIAPIKey", json!("sk-x")).unwrap();
        store.set("textImprovement", json!(false)).unwrap();
        assert_eq!(store.get("openAIAPIKey").unwrap(), Some(json!("sk-x")));
        assert_eq!(store.get("textImprovement").unwrap(), Some(json!(false)));
    }

    #[test]
    fn remove_absent_key_is_ok_and_does_not_create_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let store = FileStore::new(&path);
        store.remove("openAIAPIKey").unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_panic() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storage.json");
        fs::write(&path, "[1, 2").unwrap();
        let store = FileStore::new(&path);
        assert!(matches!(store.get("openAIAPIKey"), Err(StoreError::Corrupt { .. })));
        assert!(store.set("openAIAPIKey", json!("sk-x")).is_err());
    }
}
