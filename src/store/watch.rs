use std::ffi::OsString;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

/// Storage-change notifications for a [`super::FileStore`] file.
///
/// The parent directory is watched rather than the file itself because the
/// store replaces the file on every write. Dropping the watcher stops the
/// notifications.
pub struct StoreWatcher {
    _watcher: RecommendedWatcher,
}

impl StoreWatcher {
    pub fn spawn(path: &Path) -> Result<(Self, UnboundedReceiver<()>)> {
        let dir = path
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let file_name: Option<OsString> = path.file_name().map(|n| n.to_os_string());

        let (tx, rx) = unbounded_channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                Ok(event) => {
                    if matches!(event.kind, EventKind::Access(_)) {
                        return;
                    }
                    let ours = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if ours {
                        let _ = tx.send(());
                    }
                }
                Err(e) => tracing::warn!(error = %e, "storage watcher error"),
            }
        })
        .context("creating storage watcher")?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;
        tracing::debug!(dir = %dir.display(), "watching storage for changes");

        Ok((Self { _watcher: watcher }, rx))
    }
}
