use std::cell::Cell;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Frame,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

use crate::api::{OpenAiClient, TextAssistant};
use crate::app::{AppCtx, ScreenWidget, Transition};
use crate::config::SyncMode;
use crate::controller::{
    Applied, ControllerOptions, Finished, Operation, Reconciled, ShortcutController, Triggered,
};
use crate::defaults::Defaults;
use crate::editor::Document;
use crate::keymap::KeyChord;
use crate::screens::SettingsScreen;
use crate::store::{load_settings, Settings, SettingsStore, StoreWatcher};
use crate::ui::components::draw_frame_title;
use crate::ui::help::help_editor;
use crate::ui::layout::follow;
use crate::ui::style::{selection_style, status_style};

/// How the editor learns about settings written elsewhere.
enum SettingsSync {
    Watch { _watcher: StoreWatcher, rx: UnboundedReceiver<()> },
    Poll { every: Duration, last: Instant },
}

impl SettingsSync {
    fn poll(interval_ms: u64) -> Self {
        SettingsSync::Poll { every: Duration::from_millis(interval_ms.max(1)), last: Instant::now() }
    }

    /// True when storage may have changed since the last call.
    fn changed(&mut self) -> bool {
        match self {
            SettingsSync::Watch { rx, .. } => {
                let mut any = false;
                while rx.try_recv().is_ok() {
                    any = true;
                }
                any
            }
            SettingsSync::Poll { every, last } => {
                if last.elapsed() >= *every {
                    *last = Instant::now();
                    true
                } else {
                    false
                }
            }
        }
    }
}

struct Notice {
    text: String,
    error: bool,
    at: Instant,
}

/// Text editor for one file with the AI shortcuts installed on it.
pub struct EditorScreen {
    path: PathBuf,
    document: Document,
    controller: ShortcutController,
    results_tx: UnboundedSender<Finished>,
    results_rx: UnboundedReceiver<Finished>,
    sync: SettingsSync,
    in_flight: usize,
    notice: Option<Notice>,
    scroll: Cell<usize>,
}

impl EditorScreen {
    /// Opens `path`. A file that does not exist yet starts empty and is
    /// created on the first save.
    pub fn open(path: PathBuf, ctx: &AppCtx) -> Result<Self> {
        let text = match fs::read_to_string(&path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
        };
        let options = ControllerOptions::from_config(&ctx.config.shortcuts)?;
        let api = ctx.config.api.clone();
        let controller = ShortcutController::new(
            options,
            Box::new(move |credential| Arc::new(OpenAiClient::new(credential, &api)) as Arc<dyn TextAssistant>),
        );

        let sync = match ctx.config.sync.mode {
            SyncMode::Watch => match StoreWatcher::spawn(&ctx.config.storage_path()) {
                Ok((watcher, rx)) => SettingsSync::Watch { _watcher: watcher, rx },
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "storage watcher unavailable, polling instead");
                    SettingsSync::poll(ctx.config.sync.interval_ms)
                }
            },
            SyncMode::Poll => SettingsSync::poll(ctx.config.sync.interval_ms),
        };

        tracing::info!(path = %path.display(), bytes = text.len(), "opened document");
        let (results_tx, results_rx) = unbounded_channel();
        let mut screen = Self {
            path,
            document: Document::new(text),
            controller,
            results_tx,
            results_rx,
            sync,
            in_flight: 0,
            notice: None,
            scroll: Cell::new(0),
        };
        screen.sync_settings(ctx.store.as_ref());
        Ok(screen)
    }

    fn sync_settings(&mut self, store: &dyn SettingsStore) {
        let settings = load_settings(store).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read settings, disabling AI shortcuts");
            Settings::default()
        });
        match self.controller.reconcile(&settings) {
            Reconciled::Unchanged => {}
            Reconciled::Installed { handlers } => {
                self.notify(format!("AI shortcuts enabled ({handlers} active)"), false);
            }
            Reconciled::Disabled => self.notify("AI shortcuts disabled", false),
        }
    }

    fn notify(&mut self, text: impl Into<String>, error: bool) {
        self.notice = Some(Notice { text: text.into(), error, at: Instant::now() });
    }

    fn finish(&mut self, finished: Finished) {
        self.in_flight = self.in_flight.saturating_sub(1);
        let op = finished.operation();
        match finished.apply(&mut self.document) {
            Ok(Applied::Written) => {
                let done = match op {
                    Operation::Improve => "Text improved",
                    Operation::Complete => "Text completed",
                };
                self.notify(done, false);
            }
            Ok(Applied::Stale) => self.notify("Selection changed, result discarded", false),
            Err(e) => self.notify(e.to_string(), true),
        }
    }

    fn save(&mut self) -> Result<()> {
        fs::write(&self.path, self.document.text()).with_context(|| format!("writing {}", self.path.display()))?;
        self.document.mark_saved();
        tracing::info!(path = %self.path.display(), "saved document");
        Ok(())
    }

    /// Installed chords with their labels, for the help bar.
    fn shortcuts(&self) -> Vec<(KeyChord, &'static str)> {
        let keymap = self.controller.keymap();
        if keymap.is_empty() {
            return Vec::new();
        }
        let installed = keymap.chords();
        let options = self.controller.options();
        let mut out = Vec::new();
        for (chord, label) in [(options.improve, "Improve"), (options.complete, "Complete")] {
            if installed.contains(&chord) {
                out.push((chord, label));
            }
        }
        out
    }

    fn draw_text(&self, f: &mut Frame<'_>, area: Rect) {
        let block = draw_frame_title(self.title());
        let inner = block.inner(area);
        let height = inner.height as usize;
        let (row, col) = self.document.cursor_line_col();
        let top = follow(self.scroll.get(), row, height);
        self.scroll.set(top);

        let selection = self.document.selection();
        let lines: Vec<Line> = self
            .document
            .lines()
            .skip(top)
            .take(height)
            .map(|(offset, line)| match &selection {
                Some(sel) if sel.start < offset + line.len() + 1 && sel.end > offset => {
                    let from = sel.start.saturating_sub(offset).min(line.len());
                    let to = (sel.end - offset).min(line.len());
                    let mut spans = vec![Span::raw(line[..from].to_string())];
                    // A selected line break shows as one highlighted cell.
                    let selected = if sel.end > offset + line.len() && from == to {
                        " ".to_string()
                    } else {
                        line[from..to].to_string()
                    };
                    spans.push(Span::styled(selected, selection_style()));
                    spans.push(Span::raw(line[to..].to_string()));
                    Line::from(spans)
                }
                _ => Line::from(line.to_string()),
            })
            .collect();

        f.render_widget(Paragraph::new(lines).block(block), area);
        if row >= top && row < top + height {
            let x = inner.x.saturating_add(col as u16).min(inner.right().saturating_sub(1));
            f.set_cursor(x, inner.y + (row - top) as u16);
        }
    }

    fn status_line(&self) -> Line<'static> {
        let (row, col) = self.document.cursor_line_col();
        let active = self.controller.is_active();
        let mut spans = vec![
            Span::styled(if active { "AI active" } else { "AI disabled" }, status_style(active)),
            Span::raw(format!("  {}:{}", row + 1, col + 1)),
        ];
        if self.document.is_dirty() {
            spans.push(Span::raw("  [modified]"));
        }
        if self.in_flight > 0 {
            spans.push(Span::styled(format!("  waiting for API ({})", self.in_flight), Style::default().fg(Color::Yellow)));
        }
        if let Some(n) = &self.notice {
            if n.at.elapsed() < Duration::from_secs(Defaults::NOTICE_SECS) {
                let color = if n.error { Color::Red } else { Color::Green };
                spans.push(Span::styled(format!("  {}", n.text), Style::default().fg(color)));
            }
        }
        Line::from(spans)
    }
}

#[async_trait]
impl ScreenWidget for EditorScreen {
    fn title(&self) -> &str {
        self.path.file_name().and_then(|n| n.to_str()).unwrap_or("GPT4Overleaf")
    }

    fn draw(&self, f: &mut Frame<'_>, size: Rect, _ctx: &AppCtx) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1), Constraint::Length(3)])
            .split(size);

        f.render_widget(Clear, size);
        self.draw_text(f, chunks[0]);
        f.render_widget(Paragraph::new(self.status_line()), chunks[1]);
        f.render_widget(help_editor(&self.shortcuts()), chunks[2]);
    }

    fn on_tick(&mut self, ctx: &mut AppCtx) {
        while let Ok(finished) = self.results_rx.try_recv() {
            self.finish(finished);
        }
        if self.sync.changed() {
            self.sync_settings(ctx.store.as_ref());
        }
    }

    fn on_paste(&mut self, text: &str, _ctx: &mut AppCtx) {
        self.document.insert_str(&text.replace("\r\n", "\n"));
    }

    async fn on_key(&mut self, k: KeyEvent, ctx: &mut AppCtx) -> Result<Transition> {
        match self.controller.trigger(&k, &mut self.document) {
            Triggered::NotBound => {}
            Triggered::Ignored => return Ok(Transition::Stay),
            Triggered::Started(pending) => {
                self.in_flight += 1;
                tracing::debug!(op = pending.operation().label(), in_flight = self.in_flight, "request started");
                let tx = self.results_tx.clone();
                tokio::spawn(async move {
                    let _ = tx.send(pending.run().await);
                });
                return Ok(Transition::Stay);
            }
        }

        let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
        let shift = k.modifiers.contains(KeyModifiers::SHIFT);
        match k.code {
            KeyCode::Char('s') if ctrl => {
                if self.in_flight > 0 {
                    self.notify("Waiting for API, not saved", true);
                } else if let Err(e) = self.save() {
                    tracing::error!(error = %format!("{e:#}"), "save failed");
                    self.notify(format!("{e:#}"), true);
                } else {
                    self.notify("Saved", false);
                }
            }
            KeyCode::Char('o') if ctrl => {
                return Ok(Transition::Push(Box::new(SettingsScreen::new(ctx.store.as_ref()))));
            }
            KeyCode::Char('a') if ctrl => self.document.select_all(),

            KeyCode::Left => self.document.move_left(shift),
            KeyCode::Right => self.document.move_right(shift),
            KeyCode::Up => self.document.move_up(shift),
            KeyCode::Down => self.document.move_down(shift),
            KeyCode::Home if ctrl => self.document.doc_start(shift),
            KeyCode::End if ctrl => self.document.doc_end(shift),
            KeyCode::Home => self.document.home(shift),
            KeyCode::End => self.document.end(shift),

            KeyCode::Enter => self.document.insert_char('\n'),
            KeyCode::Tab => self.document.insert_str(Defaults::TAB),
            KeyCode::Backspace => self.document.backspace(),
            KeyCode::Delete => self.document.delete(),
            KeyCode::Char(c) if !ctrl && !k.modifiers.contains(KeyModifiers::ALT) => self.document.insert_char(c),

            _ => {}
        }
        Ok(Transition::Stay)
    }
}
