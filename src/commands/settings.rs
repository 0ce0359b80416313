//! Non-interactive mirror of the settings form.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::error::SettingsError;
use crate::settings_form::{MessageKind, SettingsPanel};
use crate::store::{load_settings, FeatureFlag, SettingsStore};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub storage: String,
    pub api_key: &'static str,
    pub text_completion: bool,
    pub text_improvement: bool,
}

pub fn set_key(store: &dyn SettingsStore, token: &str) -> Result<()> {
    run(store, |panel| panel.submit_key(store, token))
}

pub fn clear_key(store: &dyn SettingsStore) -> Result<()> {
    run(store, |panel| panel.clear_key(store))
}

pub fn set_flag(store: &dyn SettingsStore, flag: FeatureFlag, on: bool) -> Result<()> {
    run(store, |panel| panel.set_flag(store, flag, on))
}

/// Runs one form action and prints its success message. Failures come
/// back as the error so the exit code reflects them.
fn run(
    store: &dyn SettingsStore,
    op: impl FnOnce(&mut SettingsPanel) -> Result<(), SettingsError>,
) -> Result<()> {
    let mut panel = SettingsPanel::load(store);
    op(&mut panel)?;
    for m in panel.messages().iter().filter(|m| m.kind == MessageKind::Info) {
        println!("✓ {}", m.text);
    }
    Ok(())
}

pub fn status(store: &dyn SettingsStore, storage: &Path) -> Result<StatusReport> {
    let settings = load_settings(store).context("reading settings")?;
    Ok(StatusReport {
        storage: storage.display().to_string(),
        api_key: if settings.has_key() { "set" } else { "not set" },
        text_completion: settings.text_completion,
        text_improvement: settings.text_improvement,
    })
}

pub fn emit(report: &StatusReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    let on_off = |b: bool| if b { "on" } else { "off" };
    println!("Storage:          {}", report.storage);
    println!("API Token:        {}", report.api_key);
    println!("{:<17} {}", format!("{}:", FeatureFlag::TextCompletion.key()), on_off(report.text_completion));
    println!("{:<17} {}", format!("{}:", FeatureFlag::TextImprovement.key()), on_off(report.text_improvement));
    Ok(())
}
