use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders},
};

use crate::settings_form::{Message, MessageKind};

/// Single-line input. `cursor` is a byte offset on a char boundary.
#[derive(Clone, Default)]
pub struct TextField {
    pub text: String,
    pub cursor: usize,
}

impl TextField {
    pub fn insert_char(&mut self, c: char) {
        self.text.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }
    pub fn insert_str(&mut self, s: &str) {
        self.text.insert_str(self.cursor, s);
        self.cursor += s.len();
    }
    pub fn backspace(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
            self.text.remove(self.cursor);
        }
    }
    pub fn delete(&mut self) {
        if self.cursor < self.text.len() {
            self.text.remove(self.cursor);
        }
    }
    pub fn move_left(&mut self) {
        if let Some(c) = self.text[..self.cursor].chars().next_back() {
            self.cursor -= c.len_utf8();
        }
    }
    pub fn move_right(&mut self) {
        if let Some(c) = self.text[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }
    pub fn home(&mut self) {
        self.cursor = 0;
    }
    pub fn end(&mut self) {
        self.cursor = self.text.len();
    }

    /// Empties the field and returns what it held.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }
}

pub fn draw_frame_title(title: &str) -> Block<'_> {
    Block::default().borders(Borders::ALL).title(title)
}

fn cursor_block(s: &str) -> Span<'static> {
    Span::styled(
        s.to_string(),
        Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD),
    )
}

/// Input line with every char shown as a dot and a block cursor that
/// covers the char under it.
pub fn masked_field_line<'a>(label: &str, field: &TextField, focused: bool) -> Line<'a> {
    let dots = "•".repeat(field.text.chars().count());
    let cursor_chars = field.text[..field.cursor.min(field.text.len())].chars().count();
    render_field(label, &dots, cursor_chars * '•'.len_utf8(), focused)
}

fn render_field<'a>(label: &str, text: &str, cur: usize, focused: bool) -> Line<'a> {
    let label_span = Span::styled(format!("{label}: "), Style::default().fg(Color::Yellow));
    if !focused {
        return Line::from(vec![label_span, Span::raw(text.to_string())]);
    }

    let (left, rest) = text.split_at(cur);
    if let Some(ch) = rest.chars().next() {
        let after = &rest[ch.len_utf8()..];
        Line::from(vec![
            label_span,
            Span::raw(left.to_string()),
            cursor_block(&ch.to_string()),
            Span::raw(after.to_string()),
        ])
    } else {
        Line::from(vec![label_span, Span::raw(left.to_string()), cursor_block(" ")])
    }
}

pub fn bool_field_line<'a>(label: &str, val: bool, focused: bool) -> Line<'a> {
    let label = format!("{label}: ");
    let mark = if val { "[x] On " } else { "[ ] Off" };
    let cursor = if focused { " ▉" } else { "" };
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Yellow)),
        Span::raw(mark.to_string()),
        Span::styled(cursor, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    ])
}

pub fn message_line(message: &Message) -> Line<'static> {
    let color = match message.kind {
        MessageKind::Info => Color::Green,
        MessageKind::Error => Color::Red,
    };
    Line::from(Span::styled(message.text.clone(), Style::default().fg(color)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_field_edits_on_char_boundaries() {
        let mut f = TextField::default();
        f.insert_str("aé");
        f.insert_char('z');
        assert_eq!(f.text, "aéz");
        f.move_left();
        f.move_left();
        assert_eq!(f.cursor, 1);
        f.delete();
        assert_eq!(f.text, "az");
        f.end();
        f.backspace();
        f.backspace();
        assert_eq!(f.text, "");
        f.backspace();
        assert_eq!(f.cursor, 0);
    }

    #[test]
    fn take_wipes_the_field() {
        let mut f = TextField::default();
        f.insert_str("sk-secret");
        assert_eq!(f.take(), "sk-secret");
        assert!(f.text.is_empty());
        assert_eq!(f.cursor, 0);
    }

    #[test]
    fn masked_line_hides_text() {
        let mut f = TextField::default();
        f.insert_str("sk-abc");
        let line = masked_field_line("API Token", &f, false);
        let rendered: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(rendered, "API Token: ••••••");
    }
}
