use std::path::PathBuf;

use thiserror::Error;

/// Failures of the durable settings store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {} is not a JSON object: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised by the settings form. The display strings are what the
/// user sees inline.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Invalid API Token")]
    InvalidToken,

    #[error("Failed to set API Token")]
    SetToken(#[source] StoreError),

    #[error("Failed to remove API Token")]
    RemoveToken(#[source] StoreError),

    #[error("Failed to set {name} setting")]
    SetFlag {
        name: &'static str,
        #[source]
        source: StoreError,
    },
}

/// Remote API failures are deliberately uniform: callers only ever learn
/// that the query failed. `reason` is kept for the log.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("Failed to query API")]
    RequestFailed { reason: String },
}

impl ApiError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ApiError::RequestFailed { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        match self {
            ApiError::RequestFailed { reason } => reason,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid shortcut `{chord}`: {source}")]
    Shortcut {
        chord: String,
        #[source]
        source: crate::keymap::KeyChordParseError,
    },
}
