use anyhow::Result;
use async_trait::async_trait;
use crossterm::{
    event::{
        self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
        PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{backend::CrosstermBackend, layout::Rect, prelude::Frame, Terminal};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::screens::ConfirmQuitScreen;
use crate::store::SettingsStore;

pub enum Transition {
    Stay,
    Push(Box<dyn ScreenWidget>),
    Pop,
    Quit,
}

/// Shared by every screen on the stack.
pub struct AppCtx {
    pub store: Arc<dyn SettingsStore>,
    pub config: AppConfig,
}

#[async_trait]
pub trait ScreenWidget: Send {
    fn title(&self) -> &str {
        "GPT4Overleaf"
    }
    fn draw(&self, f: &mut Frame<'_>, area: Rect, ctx: &AppCtx);

    /// Called once per loop iteration for every screen on the stack, top
    /// or not, so background work keeps flowing.
    fn on_tick(&mut self, _ctx: &mut AppCtx) {}

    /// Bracketed paste, delivered to the top screen.
    fn on_paste(&mut self, _text: &str, _ctx: &mut AppCtx) {}

    async fn on_key(&mut self, key: KeyEvent, ctx: &mut AppCtx) -> Result<Transition>;
}

type Term = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(ctx: AppCtx, root: Box<dyn ScreenWidget>) -> Result<()> {
    // terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    // Needed to tell Ctrl+Enter apart from Enter.
    let enhanced = supports_keyboard_enhancement().unwrap_or(false);
    if enhanced {
        execute!(stdout, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES))?;
    }
    tracing::debug!(enhanced, "terminal initialised");
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?; // clean start

    let result = event_loop(&mut terminal, ctx, root).await;

    // restore
    if enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableBracketedPaste, LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

async fn event_loop(terminal: &mut Term, mut ctx: AppCtx, root: Box<dyn ScreenWidget>) -> Result<()> {
    let mut stack: Vec<Box<dyn ScreenWidget>> = vec![root];

    loop {
        for screen in stack.iter_mut() {
            screen.on_tick(&mut ctx);
        }

        // Bottom to top, so dialogs render over the screen they belong to.
        terminal.draw(|f| {
            let size = f.size();
            for screen in &stack {
                screen.draw(f, size, &ctx);
            }
        })?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                // GLOBAL HOTKEY: Ctrl+Q shows confirm quit from anywhere
                if k.modifiers.contains(KeyModifiers::CONTROL) && matches!(k.code, KeyCode::Char('q' | 'Q')) {
                    stack.push(Box::new(ConfirmQuitScreen::new()));
                    continue;
                }

                let Some(top) = stack.last_mut() else { break };
                match top.on_key(k, &mut ctx).await? {
                    Transition::Stay => {}
                    Transition::Push(s) => stack.push(s),
                    Transition::Pop => {
                        stack.pop();
                        if stack.is_empty() {
                            break;
                        }
                    }
                    Transition::Quit => break,
                }
            }
            Event::Paste(text) => {
                if let Some(top) = stack.last_mut() {
                    top.on_paste(&text, &mut ctx);
                }
            }
            _ => {}
        }
    }
    Ok(())
}
