use anyhow::Result;
use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    prelude::Frame,
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};

use crate::app::{AppCtx, ScreenWidget, Transition};
use crate::settings_form::SettingsPanel;
use crate::store::{FeatureFlag, SettingsStore};
use crate::ui::common_nav::esc_to_back;
use crate::ui::components::{bool_field_line, draw_frame_title, masked_field_line, message_line, TextField};
use crate::ui::help::help_settings;
use crate::ui::style::{button_spans, status_style};

const TOKEN: usize = 0;
const SAVE: usize = 1;
const CLEAR: usize = 2;
const COMPLETION: usize = 3;
const IMPROVEMENT: usize = 4;
const FIELD_COUNT: usize = 5;

/// API token and feature flag form.
pub struct SettingsScreen {
    token: TextField,
    panel: SettingsPanel,
    field_index: usize,
}

impl SettingsScreen {
    pub fn new(store: &dyn SettingsStore) -> Self {
        Self { token: TextField::default(), panel: SettingsPanel::load(store), field_index: TOKEN }
    }

    fn flag_at(&self, idx: usize) -> Option<FeatureFlag> {
        match idx {
            COMPLETION => Some(FeatureFlag::TextCompletion),
            IMPROVEMENT => Some(FeatureFlag::TextImprovement),
            _ => None,
        }
    }

    fn submit(&mut self, store: &dyn SettingsStore) {
        let input = self.token.take();
        // Errors are already on screen as messages.
        let _ = self.panel.submit_key(store, &input);
    }
}

#[async_trait]
impl ScreenWidget for SettingsScreen {
    fn title(&self) -> &str {
        "GPT4Overleaf Settings"
    }

    fn draw(&self, f: &mut Frame<'_>, size: Rect, _ctx: &AppCtx) {
        let message_height = self.panel.messages().len().max(1) as u16 + 2;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(9),
                Constraint::Length(message_height),
                Constraint::Length(3),
            ])
            .split(size);

        let header = Paragraph::new(Line::from(vec![
            Span::raw("API Token: "),
            Span::styled(self.panel.key_status(), status_style(self.panel.key_set())),
        ]))
        .block(draw_frame_title(self.title()));

        let mut buttons = button_spans("Save", self.field_index == SAVE);
        buttons.push(Span::raw("   "));
        buttons.extend(button_spans("Clear", self.field_index == CLEAR));

        let lines = vec![
            masked_field_line("Paste API Token", &self.token, self.field_index == TOKEN),
            Line::from(""),
            Line::from(buttons),
            Line::from(""),
            bool_field_line(
                FeatureFlag::TextCompletion.label(),
                self.panel.flag(FeatureFlag::TextCompletion),
                self.field_index == COMPLETION,
            ),
            bool_field_line(
                FeatureFlag::TextImprovement.label(),
                self.panel.flag(FeatureFlag::TextImprovement),
                self.field_index == IMPROVEMENT,
            ),
        ];
        let form = Paragraph::new(lines).block(draw_frame_title("Settings"));

        let messages: Vec<Line> = self.panel.messages().iter().map(message_line).collect();
        let messages = Paragraph::new(messages).block(draw_frame_title("Messages")).wrap(Wrap { trim: true });

        f.render_widget(Clear, size);
        f.render_widget(header, chunks[0]);
        f.render_widget(form, chunks[1]);
        f.render_widget(messages, chunks[2]);
        f.render_widget(help_settings(), chunks[3]);
    }

    fn on_paste(&mut self, text: &str, _ctx: &mut AppCtx) {
        if self.field_index == TOKEN {
            self.token.insert_str(text.trim());
        }
    }

    async fn on_key(&mut self, k: KeyEvent, ctx: &mut AppCtx) -> Result<Transition> {
        if let Some(t) = esc_to_back(&k) {
            return Ok(t);
        }
        let store = ctx.store.as_ref();

        match k.code {
            // Navigation
            KeyCode::Up | KeyCode::BackTab => {
                self.field_index = (self.field_index + FIELD_COUNT - 1) % FIELD_COUNT;
            }
            KeyCode::Down | KeyCode::Tab => {
                self.field_index = (self.field_index + 1) % FIELD_COUNT;
            }

            KeyCode::Enter => match self.field_index {
                TOKEN | SAVE => self.submit(store),
                CLEAR => {
                    let _ = self.panel.clear_key(store);
                }
                idx => {
                    if let Some(flag) = self.flag_at(idx) {
                        let _ = self.panel.toggle_flag(store, flag);
                    }
                }
            },

            // Checkbox toggle
            KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right if self.flag_at(self.field_index).is_some() => {
                if let Some(flag) = self.flag_at(self.field_index) {
                    let _ = self.panel.toggle_flag(store, flag);
                }
            }

            // Buttons side by side
            KeyCode::Left | KeyCode::Right if matches!(self.field_index, SAVE | CLEAR) => {
                self.field_index = if self.field_index == SAVE { CLEAR } else { SAVE };
            }

            // Token editing
            KeyCode::Left if self.field_index == TOKEN => self.token.move_left(),
            KeyCode::Right if self.field_index == TOKEN => self.token.move_right(),
            KeyCode::Home if self.field_index == TOKEN => self.token.home(),
            KeyCode::End if self.field_index == TOKEN => self.token.end(),
            KeyCode::Backspace if self.field_index == TOKEN => self.token.backspace(),
            KeyCode::Delete if self.field_index == TOKEN => self.token.delete(),
            KeyCode::Char(c) if self.field_index == TOKEN && !k.modifiers.contains(KeyModifiers::CONTROL) => {
                self.token.insert_char(c);
            }

            _ => {}
        }
        Ok(Transition::Stay)
    }
}
