//! Durable key-value settings shared by the editor and the settings form.

pub mod file;
pub mod watch;

pub use file::FileStore;
pub use watch::StoreWatcher;

use serde_json::Value;

use crate::credential::Credential;
use crate::error::StoreError;

/// Storage key holding the API token.
pub const API_KEY: &str = "openAIAPIKey";

pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;
    /// Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureFlag {
    TextCompletion,
    TextImprovement,
}

impl FeatureFlag {
    pub const ALL: [FeatureFlag; 2] = [FeatureFlag::TextCompletion, FeatureFlag::TextImprovement];

    /// Storage key; also the name used in user-facing messages.
    pub fn key(self) -> &'static str {
        match self {
            FeatureFlag::TextCompletion => "textCompletion",
            FeatureFlag::TextImprovement => "textImprovement",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FeatureFlag::TextCompletion => "Text completion",
            FeatureFlag::TextImprovement => "Text improvement",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key().eq_ignore_ascii_case(key))
    }
}

/// Typed snapshot of everything in the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub api_key: Option<Credential>,
    pub text_completion: bool,
    pub text_improvement: bool,
}

impl Settings {
    pub fn flag(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::TextCompletion => self.text_completion,
            FeatureFlag::TextImprovement => self.text_improvement,
        }
    }

    pub fn has_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }
}

/// Reads the whole schema. Values of the wrong type read as absent.
pub fn load_settings(store: &dyn SettingsStore) -> Result<Settings, StoreError> {
    let api_key = match store.get(API_KEY)? {
        Some(Value::String(s)) if !s.is_empty() => Some(Credential::new(s)),
        _ => None,
    };
    let flag = |f: FeatureFlag| -> Result<bool, StoreError> {
        Ok(matches!(store.get(f.key())?, Some(Value::Bool(true))))
    };
    Ok(Settings {
        api_key,
        text_completion: flag(FeatureFlag::TextCompletion)?,
        text_improvement: flag(FeatureFlag::TextImprovement)?,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{BTreeMap, HashSet};
    use std::sync::Mutex;

    use super::*;

    /// In-memory store with switchable failures and a write journal.
    #[derive(Default)]
    pub struct MemoryStore {
        pub data: Mutex<BTreeMap<String, Value>>,
        pub failing: Mutex<HashSet<&'static str>>,
        pub writes: Mutex<Vec<String>>,
    }

    impl MemoryStore {
        pub fn fail(&self, op: &'static str) {
            self.failing.lock().unwrap().insert(op);
        }

        fn check(&self, op: &'static str) -> Result<(), StoreError> {
            if self.failing.lock().unwrap().contains(op) {
                return Err(StoreError::Write {
                    path: "memory".into(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "quota exceeded"),
                });
            }
            Ok(())
        }
    }

    impl SettingsStore for MemoryStore {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.check("get")?;
            Ok(self.data.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
            self.check("set")?;
            self.writes.lock().unwrap().push(key.to_string());
            self.data.lock().unwrap().insert(key.to_string(), value);
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StoreError> {
            self.check("remove")?;
            self.writes.lock().unwrap().push(key.to_string());
            self.data.lock().unwrap().remove(key);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::MemoryStore;
    use super::*;

    #[test]
    fn empty_store_is_disabled_with_flags_off() {
        let store = MemoryStore::default();
        let settings = load_settings(&store).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.has_key());
    }

    #[test]
    fn reads_all_schema_keys() {
        let store = MemoryStore::default();
        store.set(API_KEY, json!("sk-abc")).unwrap();
        store.set("textImprovement", json!(true)).unwrap();
        let settings = load_settings(&store).unwrap();
        assert_eq!(settings.api_key.as_ref().map(|k| k.expose()), Some("sk-abc"));
        assert!(settings.flag(FeatureFlag::TextImprovement));
        assert!(!settings.flag(FeatureFlag::TextCompletion));
    }

    #[test]
    fn wrongly_typed_values_read_as_absent() {
        let store = MemoryStore::default();
        store.set(API_KEY, json!(42)).unwrap();
        store.set("textCompletion", json!("yes")).unwrap();
        let settings = load_settings(&store).unwrap();
        assert!(settings.api_key.is_none());
        assert!(!settings.text_completion);
    }

    #[test]
    fn empty_key_string_is_no_key() {
        let store = MemoryStore::default();
        store.set(API_KEY, json!("")).unwrap();
        assert!(!load_settings(&store).unwrap().has_key());
    }

    #[test]
    fn flag_lookup_by_key() {
        assert_eq!(FeatureFlag::from_key("textCompletion"), Some(FeatureFlag::TextCompletion));
        assert_eq!(FeatureFlag::from_key("textimprovement"), Some(FeatureFlag::TextImprovement));
        assert_eq!(FeatureFlag::from_key("other"), None);
    }
}
