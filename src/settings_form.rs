//! State and actions behind the settings form, shared by the settings
//! screen and the `key`/`flag`/`status` commands.

use serde_json::Value;

use crate::credential::Credential;
use crate::error::SettingsError;
use crate::store::{load_settings, FeatureFlag, SettingsStore, API_KEY};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub kind: MessageKind,
    pub text: String,
}

/// What the form currently shows.
#[derive(Debug, Clone, Default)]
pub struct SettingsPanel {
    key_set: bool,
    text_completion: bool,
    text_improvement: bool,
    messages: Vec<Message>,
}

impl SettingsPanel {
    /// A panel already refreshed from `store`.
    pub fn load(store: &dyn SettingsStore) -> Self {
        let mut panel = Self::default();
        panel.refresh(store);
        panel
    }

    pub fn key_status(&self) -> &'static str {
        if self.key_set { "set" } else { "not set" }
    }

    pub fn key_set(&self) -> bool {
        self.key_set
    }

    pub fn flag(&self, flag: FeatureFlag) -> bool {
        match flag {
            FeatureFlag::TextCompletion => self.text_completion,
            FeatureFlag::TextImprovement => self.text_improvement,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Re-reads displayed state. An unreadable store shows as empty.
    pub fn refresh(&mut self, store: &dyn SettingsStore) {
        match load_settings(store) {
            Ok(s) => {
                self.key_set = s.has_key();
                self.text_completion = s.text_completion;
                self.text_improvement = s.text_improvement;
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not read settings");
                self.key_set = false;
                self.text_completion = false;
                self.text_improvement = false;
            }
        }
    }

    pub fn submit_key(&mut self, store: &dyn SettingsStore, input: &str) -> Result<(), SettingsError> {
        self.mutate(store, "API Token saved.", |store| {
            let credential = Credential::parse(input)?;
            store
                .set(API_KEY, Value::String(credential.expose().to_string()))
                .map_err(SettingsError::SetToken)
        })
    }

    pub fn clear_key(&mut self, store: &dyn SettingsStore) -> Result<(), SettingsError> {
        self.mutate(store, "API Token cleared.", |store| store.remove(API_KEY).map_err(SettingsError::RemoveToken))
    }

    pub fn set_flag(&mut self, store: &dyn SettingsStore, flag: FeatureFlag, value: bool) -> Result<(), SettingsError> {
        let note = format!("{} {}.", flag.label(), if value { "enabled" } else { "disabled" });
        self.mutate(store, &note, |store| {
            store
                .set(flag.key(), Value::Bool(value))
                .map_err(|source| SettingsError::SetFlag { name: flag.key(), source })
        })
    }

    pub fn toggle_flag(&mut self, store: &dyn SettingsStore, flag: FeatureFlag) -> Result<(), SettingsError> {
        let value = !self.flag(flag);
        self.set_flag(store, flag, value)
    }

    /// Clear messages, run the storage operation, then either report the
    /// error and stop or refresh everything.
    fn mutate(
        &mut self,
        store: &dyn SettingsStore,
        success: &str,
        op: impl FnOnce(&dyn SettingsStore) -> Result<(), SettingsError>,
    ) -> Result<(), SettingsError> {
        self.messages.clear();
        if let Err(e) = op(store) {
            match &e {
                SettingsError::InvalidToken => tracing::debug!("rejected malformed API token"),
                other => tracing::warn!(error = ?other, "settings update failed"),
            }
            self.messages.push(Message { kind: MessageKind::Error, text: format!("{e}.") });
            return Err(e);
        }
        self.refresh(store);
        self.messages.push(Message { kind: MessageKind::Info, text: success.to_string() });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::credential::sample_token;
    use crate::store::testing::MemoryStore;

    fn last_message(panel: &SettingsPanel) -> (MessageKind, &str) {
        let m = panel.messages().last().unwrap();
        (m.kind, m.text.as_str())
    }

    #[test]
    fn valid_key_is_saved_and_status_flips() {
        let store = MemoryStore::default();
        let mut panel = SettingsPanel::load(&store);
        assert_eq!(panel.key_status(), "not set");

        let token = sample_token('k');
        panel.submit_key(&store, &token).unwrap();
        assert_eq!(panel.key_status(), "set");
        assert_eq!(store.get(API_KEY).unwrap(), Some(json!(token)));
        assert_eq!(last_message(&panel).0, MessageKind::Info);
    }

    #[test]
    fn invalid_key_is_rejected_without_touching_storage() {
        let store = MemoryStore::default();
        let mut panel = SettingsPanel::load(&store);
        let err = panel.submit_key(&store, "sk-too-short").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidToken));
        assert_eq!(panel.key_status(), "not set");
        assert_eq!(last_message(&panel), (MessageKind::Error, "Invalid API Token."));
        assert!(store.writes.lock().unwrap().is_empty());
    }

    #[test]
    fn clearing_removes_key_and_is_fine_when_absent() {
        let store = MemoryStore::default();
        let mut panel = SettingsPanel::load(&store);
        panel.submit_key(&store, &sample_token('c')).unwrap();

        panel.clear_key(&store).unwrap();
        assert_eq!(panel.key_status(), "not set");
        assert_eq!(store.get(API_KEY).unwrap(), None);

        panel.clear_key(&store).unwrap();
        assert_eq!(last_message(&panel).0, MessageKind::Info);
    }

    #[test]
    fn toggling_a_flag_writes_only_that_key() {
        let store = MemoryStore::default();
        let mut panel = SettingsPanel::load(&store);
        panel.toggle_flag(&store, FeatureFlag::TextCompletion).unwrap();

        assert!(panel.flag(FeatureFlag::TextCompletion));
        assert!(!panel.flag(FeatureFlag::TextImprovement));
        assert_eq!(store.writes.lock().unwrap().as_slice(), &["textCompletion".to_string()]);
        assert_eq!(store.get("textCompletion").unwrap(), Some(json!(true)));

        panel.toggle_flag(&store, FeatureFlag::TextCompletion).unwrap();
        assert_eq!(store.get("textCompletion").unwrap(), Some(json!(false)));
    }

    #[test]
    fn storage_failures_surface_inline_and_skip_refresh() {
        let store = MemoryStore::default();
        let mut panel = SettingsPanel::load(&store);
        store.fail("set");
        store.fail("remove");

        assert!(panel.submit_key(&store, &sample_token('f')).is_err());
        assert_eq!(last_message(&panel), (MessageKind::Error, "Failed to set API Token."));
        assert_eq!(panel.key_status(), "not set");

        assert!(panel.clear_key(&store).is_err());
        assert_eq!(last_message(&panel), (MessageKind::Error, "Failed to remove API Token."));

        assert!(panel.toggle_flag(&store, FeatureFlag::TextImprovement).is_err());
        assert_eq!(panel.messages().len(), 1);
        assert_eq!(last_message(&panel), (MessageKind::Error, "Failed to set textImprovement setting."));
        assert!(!panel.flag(FeatureFlag::TextImprovement));
    }

    #[test]
    fn unreadable_store_shows_not_set() {
        let store = MemoryStore::default();
        store.set(API_KEY, json!(sample_token('r'))).unwrap();
        store.fail("get");
        let panel = SettingsPanel::load(&store);
        assert_eq!(panel.key_status(), "not set");
    }
}
