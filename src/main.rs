use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;

mod api;
mod app;
mod cli;
mod commands;
mod config;
mod controller;
mod credential;
mod defaults;
mod editor;
mod error;
mod keymap;
mod logging;
mod screens;
mod settings_form;
mod store;
mod ui;

use crate::app::AppCtx;
use crate::cli::{Cli, Command, KeyAction};
use crate::config::AppConfig;
use crate::screens::{EditorScreen, SettingsScreen};
use crate::store::{FileStore, SettingsStore};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("loading config")?;
    if let Some(path) = cli.storage {
        config.storage.path = Some(path);
    }
    if let Some(base) = cli.api_base {
        config.api.base_url = base;
    }

    let _log_guard = logging::init(&config.log.level, &config.log_dir())?;
    let file_store = FileStore::new(config.storage_path());
    let storage = file_store.path().to_path_buf();
    tracing::debug!(storage = %storage.display(), "starting");
    let store: Arc<dyn SettingsStore> = Arc::new(file_store);

    match cli.cmd {
        Command::Edit { file } => {
            let ctx = AppCtx { store, config };
            let screen = EditorScreen::open(file, &ctx)?;
            app::run(ctx, Box::new(screen)).await
        }

        Command::Settings => {
            let screen = SettingsScreen::new(store.as_ref());
            app::run(AppCtx { store, config }, Box::new(screen)).await
        }

        Command::Key { action } => match action {
            KeyAction::Set { token } => commands::settings::set_key(store.as_ref(), &token),
            KeyAction::Clear => commands::settings::clear_key(store.as_ref()),
        },

        Command::Flag { name, state } => commands::settings::set_flag(store.as_ref(), name, state.is_on()),

        Command::Status { json } => {
            let report = commands::settings::status(store.as_ref(), &storage)?;
            commands::settings::emit(&report, json)
        }
    }
}
