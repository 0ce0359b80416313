//! Optional TOML configuration layered over [`Defaults`].

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::defaults::Defaults;
use crate::error::ConfigError;
use crate::keymap::KeyChord;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub shortcuts: ShortcutConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub completion_model: String,
    pub edit_model: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: Defaults::API_BASE_URL.into(),
            completion_model: Defaults::COMPLETION_MODEL.into(),
            edit_model: Defaults::EDIT_MODEL.into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    pub improve: String,
    pub complete: String,
    /// Only install a shortcut when its feature flag is on.
    pub require_flags: bool,
    /// Written over the selection while a request is pending. Empty disables.
    pub placeholder: String,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            improve: Defaults::IMPROVE_CHORD.into(),
            complete: Defaults::COMPLETE_CHORD.into(),
            require_flags: Defaults::REQUIRE_FLAGS,
            placeholder: Defaults::PLACEHOLDER.into(),
        }
    }
}

impl ShortcutConfig {
    pub fn chords(&self) -> Result<(KeyChord, KeyChord), ConfigError> {
        let parse = |chord: &str| {
            chord
                .parse::<KeyChord>()
                .map_err(|source| ConfigError::Shortcut { chord: chord.to_string(), source })
        };
        Ok((parse(&self.improve)?, parse(&self.complete)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// React to storage-change notifications.
    #[default]
    Watch,
    /// Re-read storage on a fixed interval.
    Poll,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mode: SyncMode,
    pub interval_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { mode: SyncMode::Watch, interval_ms: Defaults::SYNC_INTERVAL_MS }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Defaults::LOG_LEVEL.into(), dir: None }
    }
}

impl AppConfig {
    /// Loads `path`, or the default location when `None`. A missing default
    /// file yields the defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == ErrorKind::NotFound && !explicit => return Ok(Self::default()),
            Err(source) => return Err(ConfigError::Read { path, source }),
        };
        let config: AppConfig =
            toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.clone(), source })?;
        config.shortcuts.chords()?;
        Ok(config)
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage.path.clone().unwrap_or_else(|| app_dir(dirs::config_dir()).join(Defaults::STORAGE_FILE))
    }

    pub fn log_dir(&self) -> PathBuf {
        self.log.dir.clone().unwrap_or_else(|| app_dir(dirs::data_local_dir()).join(Defaults::LOG_DIR))
    }
}

fn app_dir(base: Option<PathBuf>) -> PathBuf {
    base.unwrap_or_else(|| PathBuf::from(".")).join(Defaults::APP_DIR)
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(Defaults::APP_DIR).join(Defaults::CONFIG_FILE))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn defaults_match_constants() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://api.openai.com/v1");
        assert_eq!(config.api.completion_model, "text-curie-001");
        assert_eq!(config.shortcuts.placeholder, "…");
        assert!(config.shortcuts.require_flags);
        assert_eq!(config.sync.mode, SyncMode::Watch);
        assert_eq!(config.sync.interval_ms, 1000);
        assert!(config.shortcuts.chords().is_ok());
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
[api]
base_url = "http://localhost:8080/v1"

[shortcuts]
require_flags = false
placeholder = ""

[sync]
mode = "poll"
interval_ms = 250
"#,
        )
        .unwrap();

        let config = AppConfig::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8080/v1");
        assert_eq!(config.api.edit_model, "code-davinci-edit-001");
        assert!(!config.shortcuts.require_flags);
        assert!(config.shortcuts.placeholder.is_empty());
        assert_eq!(config.shortcuts.improve, "ctrl+space");
        assert_eq!(config.sync.mode, SyncMode::Poll);
        assert_eq!(config.sync.interval_ms, 250);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn bad_shortcut_is_rejected_at_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[shortcuts]\nimprove = \"ctrl+\"\n").unwrap();
        assert!(matches!(AppConfig::load(Some(&path)), Err(ConfigError::Shortcut { .. })));
    }

    #[test]
    fn storage_path_override() {
        let mut config = AppConfig::default();
        config.storage.path = Some(PathBuf::from("/tmp/s.json"));
        assert_eq!(config.storage_path(), PathBuf::from("/tmp/s.json"));
        assert!(AppConfig::default().storage_path().ends_with("gpt4overleaf/storage.json"));
    }
}
