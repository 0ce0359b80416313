use ratatui::{
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use super::style::{span_key, span_sep, span_text};
use crate::keymap::KeyChord;

fn bar(spans: Vec<Span<'static>>) -> Paragraph<'static> {
    Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL)).wrap(Wrap { trim: true })
}

/// Footer for the editor. `shortcuts` lists the AI chords currently installed.
pub fn help_editor(shortcuts: &[(KeyChord, &'static str)]) -> Paragraph<'static> {
    let mut spans = Vec::new();
    for (chord, label) in shortcuts {
        spans.extend([span_key(chord.to_string()), Span::raw(format!(" {label}")), span_sep()]);
    }
    spans.extend([
        span_key("Shift+Arrows"), span_text(" Select"), span_sep(),
        span_key("Ctrl+A"), span_text(" All"), span_sep(),
        span_key("Ctrl+S"), span_text(" Save"), span_sep(),
        span_key("Ctrl+O"), span_text(" Settings"), span_sep(),
        span_key("Ctrl+Q"), span_text(" Quit"),
    ]);
    bar(spans)
}

pub fn help_settings() -> Paragraph<'static> {
    bar(vec![
        span_key("↑/↓/Tab"), span_text(" Move"), span_sep(),
        span_key("Enter"), span_text(" Activate"), span_sep(),
        span_key("Space"), span_text(" Toggle"), span_sep(),
        span_key("Esc"), span_text(" Back"), span_sep(),
        span_key("Ctrl+Q"), span_text(" Quit"),
    ])
}
