use std::collections::BTreeMap;
use std::ops::Range;

use super::{Captured, SelectionEditor, SelectionHandle};

/// Plain-text buffer with a cursor, an optional selection anchor and a set
/// of tracked spans. All offsets are byte offsets on char boundaries.
#[derive(Debug, Clone, Default)]
pub struct Document {
    text: String,
    cursor: usize,
    anchor: Option<usize>,
    spans: BTreeMap<u64, Range<usize>>,
    next_span: u64,
    dirty: bool,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into(), ..Self::default() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    /// The non-empty selected range, ordered.
    pub fn selection(&self) -> Option<Range<usize>> {
        let anchor = self.anchor?;
        let range = anchor.min(self.cursor)..anchor.max(self.cursor);
        (!range.is_empty()).then_some(range)
    }

    pub fn selected_text(&self) -> Option<&str> {
        self.selection().map(|r| &self.text[r])
    }

    /// Selects `range` with the cursor at its end. Offsets are clamped to
    /// the text and snapped to char boundaries.
    pub fn select(&mut self, range: Range<usize>) {
        self.anchor = Some(self.floor(range.start));
        self.cursor = self.floor(range.end);
    }

    pub fn select_all(&mut self) {
        self.select(0..self.text.len());
    }

    /// Currently tracked range for `handle`, if still valid.
    pub fn span(&self, handle: SelectionHandle) -> Option<Range<usize>> {
        self.spans.get(&handle.0).cloned()
    }

    /// Line start offsets paired with line contents, newline excluded.
    pub fn lines(&self) -> impl Iterator<Item = (usize, &str)> + '_ {
        let mut start = 0;
        self.text.split('\n').map(move |line| {
            let at = start;
            start += line.len() + 1;
            (at, line)
        })
    }

    /// Zero-based line index and column in chars.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let line = self.text[..self.cursor].matches('\n').count();
        (line, self.col_of(self.cursor))
    }

    /* ---------- editing ---------- */

    /// Inserts at the cursor, replacing the selection if there is one.
    pub fn insert_str(&mut self, s: &str) {
        let range = self.selection().unwrap_or(self.cursor..self.cursor);
        let start = range.start;
        self.splice(range, s, None);
        self.cursor = start + s.len();
        self.anchor = None;
    }

    pub fn insert_char(&mut self, c: char) {
        let mut buf = [0u8; 4];
        self.insert_str(c.encode_utf8(&mut buf));
    }

    pub fn backspace(&mut self) {
        if self.selection().is_some() {
            return self.insert_str("");
        }
        if self.cursor > 0 {
            let from = self.prev_boundary(self.cursor);
            self.splice(from..self.cursor, "", None);
            self.cursor = from;
        }
        self.anchor = None;
    }

    pub fn delete(&mut self) {
        if self.selection().is_some() {
            return self.insert_str("");
        }
        if self.cursor < self.text.len() {
            let to = self.next_boundary(self.cursor);
            self.splice(self.cursor..to, "", None);
        }
        self.anchor = None;
    }

    /* ---------- movement ---------- */

    pub fn move_to(&mut self, pos: usize, extend: bool) {
        if extend {
            self.anchor.get_or_insert(self.cursor);
        } else {
            self.anchor = None;
        }
        self.cursor = self.floor(pos);
    }

    pub fn move_left(&mut self, extend: bool) {
        self.move_to(self.prev_boundary(self.cursor), extend);
    }

    pub fn move_right(&mut self, extend: bool) {
        self.move_to(self.next_boundary(self.cursor), extend);
    }

    pub fn move_up(&mut self, extend: bool) {
        let start = self.line_start(self.cursor);
        let target = if start == 0 {
            0
        } else {
            let prev = self.line_start(start - 1);
            self.pos_at_col(prev, self.col_of(self.cursor))
        };
        self.move_to(target, extend);
    }

    pub fn move_down(&mut self, extend: bool) {
        let end = self.line_end(self.cursor);
        let target = if end == self.text.len() {
            end
        } else {
            self.pos_at_col(end + 1, self.col_of(self.cursor))
        };
        self.move_to(target, extend);
    }

    pub fn home(&mut self, extend: bool) {
        self.move_to(self.line_start(self.cursor), extend);
    }

    pub fn end(&mut self, extend: bool) {
        self.move_to(self.line_end(self.cursor), extend);
    }

    pub fn doc_start(&mut self, extend: bool) {
        self.move_to(0, extend);
    }

    pub fn doc_end(&mut self, extend: bool) {
        self.move_to(self.text.len(), extend);
    }

    /* ---------- internals ---------- */

    /// Replaces `range` and remaps cursor, anchor and tracked spans.
    /// Spans overlapping the edit are dropped, except `keep`, which is set
    /// to cover the inserted text.
    fn splice(&mut self, range: Range<usize>, insert: &str, keep: Option<u64>) {
        let (a, b) = (range.start, range.end);
        let new_end = a + insert.len();
        self.text.replace_range(a..b, insert);

        let remap = |p: usize| {
            if p <= a {
                p
            } else if p >= b {
                p - b + new_end
            } else {
                new_end
            }
        };
        self.cursor = remap(self.cursor);
        self.anchor = self.anchor.map(remap);

        self.spans.retain(|id, span| {
            if Some(*id) == keep {
                *span = a..new_end;
                true
            } else if b <= span.start {
                *span = (span.start - b + new_end)..(span.end - b + new_end);
                true
            } else {
                a >= span.end
            }
        });
        self.dirty = true;
    }

    fn floor(&self, pos: usize) -> usize {
        let mut p = pos.min(self.text.len());
        while !self.text.is_char_boundary(p) {
            p -= 1;
        }
        p
    }

    fn prev_boundary(&self, pos: usize) -> usize {
        self.text[..pos].chars().next_back().map_or(0, |c| pos - c.len_utf8())
    }

    fn next_boundary(&self, pos: usize) -> usize {
        self.text[pos..].chars().next().map_or(pos, |c| pos + c.len_utf8())
    }

    fn line_start(&self, pos: usize) -> usize {
        self.text[..pos].rfind('\n').map_or(0, |i| i + 1)
    }

    fn line_end(&self, pos: usize) -> usize {
        self.text[pos..].find('\n').map_or(self.text.len(), |i| pos + i)
    }

    fn col_of(&self, pos: usize) -> usize {
        self.text[self.line_start(pos)..pos].chars().count()
    }

    fn pos_at_col(&self, line_start: usize, col: usize) -> usize {
        let end = self.line_end(line_start);
        self.text[line_start..end]
            .char_indices()
            .nth(col)
            .map_or(end, |(i, _)| line_start + i)
    }
}

impl SelectionEditor for Document {
    fn read(&mut self) -> Option<Captured> {
        let range = self.selection()?;
        if self.spans.values().any(|span| span.start < range.end && range.start < span.end) {
            return None;
        }
        let text = self.selected_text()?.to_string();
        self.next_span += 1;
        let handle = SelectionHandle(self.next_span);
        self.spans.insert(handle.0, range);
        Some(Captured { text, handle })
    }

    fn replace(&mut self, handle: SelectionHandle, text: &str) -> bool {
        match self.span(handle) {
            Some(range) if !range.is_empty() => {
                let covered = self
                    .selection()
                    .is_some_and(|sel| sel.start < range.end && range.start < sel.end);
                self.splice(range, text, Some(handle.0));
                if covered {
                    self.anchor = None;
                    self.cursor = self.span(handle).map_or(self.cursor, |r| r.end);
                }
                true
            }
            _ => false,
        }
    }

    fn release(&mut self, handle: SelectionHandle) {
        self.spans.remove(&handle.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_selection(text: &str, range: Range<usize>) -> Document {
        let mut doc = Document::new(text);
        doc.select(range);
        doc
    }

    #[test]
    fn read_without_selection_is_none() {
        let mut doc = Document::new("hello");
        assert!(doc.read().is_none());
        doc.select(2..2);
        assert!(doc.read().is_none());
    }

    #[test]
    fn replace_swaps_exactly_the_selection_and_collapses_it() {
        let mut doc = doc_with_selection("A: Ths is a tst. Z", 3..16);
        let captured = doc.read().unwrap();
        assert_eq!(captured.text, "Ths is a tst.");

        assert!(doc.replace(captured.handle, "This is a test."));
        assert_eq!(doc.text(), "A: This is a test. Z");
        assert!(doc.selection().is_none());
        assert_eq!(doc.cursor(), 18);
        assert_eq!(doc.span(captured.handle), Some(3..18));
    }

    #[test]
    fn replace_leaves_an_unrelated_selection_alone() {
        let mut doc = doc_with_selection("abc def ghi", 0..3);
        let captured = doc.read().unwrap();
        doc.select(8..11);
        assert!(doc.replace(captured.handle, "ABCD"));
        assert_eq!(doc.selected_text(), Some("ghi"));
    }

    #[test]
    fn selection_over_a_tracked_span_cannot_be_captured() {
        let mut doc = doc_with_selection("abc def ghi", 4..7);
        let captured = doc.read().unwrap();
        assert!(doc.replace(captured.handle, "…"));

        assert!(doc.read().is_none());
        doc.select_all();
        assert!(doc.read().is_none());
        doc.select(0..3);
        let other = doc.read().unwrap();
        assert_eq!(other.text, "abc");

        doc.release(other.handle);
        doc.release(captured.handle);
        doc.select_all();
        assert!(doc.read().is_some());
    }

    #[test]
    fn placeholder_then_result_through_the_same_handle() {
        let mut doc = doc_with_selection("x draft y", 2..7);
        let captured = doc.read().unwrap();
        assert!(doc.replace(captured.handle, "…"));
        assert_eq!(doc.text(), "x … y");
        assert!(doc.replace(captured.handle, "final"));
        assert_eq!(doc.text(), "x final y");
    }

    #[test]
    fn edits_before_shift_edits_after_leave_alone() {
        let mut doc = doc_with_selection("abc def ghi", 4..7);
        let captured = doc.read().unwrap();

        doc.move_to(0, false);
        doc.insert_str(">> ");
        assert_eq!(doc.span(captured.handle), Some(7..10));

        doc.doc_end(false);
        doc.insert_str("!");
        assert_eq!(doc.span(captured.handle), Some(7..10));

        assert!(doc.replace(captured.handle, "DEF"));
        assert_eq!(doc.text(), ">> abc DEF ghi!");
    }

    #[test]
    fn overlapping_edit_invalidates_handle() {
        let mut doc = doc_with_selection("abc def ghi", 4..7);
        let captured = doc.read().unwrap();
        doc.move_to(5, false);
        doc.insert_char('X');
        assert_eq!(doc.span(captured.handle), None);

        let before = doc.text().to_string();
        assert!(!doc.replace(captured.handle, "late"));
        assert_eq!(doc.text(), before);
    }

    #[test]
    fn collapsed_or_released_handle_is_a_no_op() {
        let mut doc = doc_with_selection("abc", 0..3);
        let captured = doc.read().unwrap();
        assert!(doc.replace(captured.handle, ""));
        assert_eq!(doc.text(), "");
        assert!(!doc.replace(captured.handle, "again"));

        let mut doc = doc_with_selection("abc", 0..3);
        let captured = doc.read().unwrap();
        doc.release(captured.handle);
        assert!(!doc.replace(captured.handle, "zzz"));
        assert_eq!(doc.text(), "abc");
    }

    #[test]
    fn typing_replaces_selection() {
        let mut doc = doc_with_selection("hello world", 6..11);
        doc.insert_str("there");
        assert_eq!(doc.text(), "hello there");
        assert_eq!(doc.cursor(), 11);
        assert!(doc.selection().is_none());
        assert!(doc.is_dirty());
    }

    #[test]
    fn backspace_and_delete_respect_multibyte_chars() {
        let mut doc = Document::new("aé…b");
        doc.doc_end(false);
        doc.backspace();
        assert_eq!(doc.text(), "aé…");
        doc.backspace();
        assert_eq!(doc.text(), "aé");
        doc.doc_start(false);
        doc.move_right(false);
        doc.delete();
        assert_eq!(doc.text(), "a");
    }

    #[test]
    fn vertical_movement_keeps_column_where_possible() {
        let mut doc = Document::new("first line\nab\nthird line");
        doc.move_to(7, false);
        doc.move_down(false);
        assert_eq!(doc.cursor_line_col(), (1, 2));
        doc.move_down(false);
        assert_eq!(doc.cursor_line_col(), (2, 2));
        doc.move_up(true);
        doc.move_up(true);
        assert_eq!(doc.cursor_line_col(), (0, 2));
        assert_eq!(doc.selected_text(), Some("rst line\nab\nth"));
    }

    #[test]
    fn shift_movement_builds_selection() {
        let mut doc = Document::new("one two");
        doc.move_to(4, false);
        doc.end(true);
        assert_eq!(doc.selected_text(), Some("two"));
        doc.home(false);
        assert!(doc.selection().is_none());
        assert_eq!(doc.cursor(), 0);
    }

    #[test]
    fn lines_report_offsets() {
        let doc = Document::new("a\nbc\n");
        let lines: Vec<_> = doc.lines().collect();
        assert_eq!(lines, vec![(0, "a"), (2, "bc"), (5, "")]);
    }

    #[test]
    fn select_snaps_to_char_boundaries() {
        let mut doc = Document::new("é");
        doc.select(0..1);
        assert!(doc.selection().is_none());
        doc.select_all();
        assert_eq!(doc.selected_text(), Some("é"));
    }
}
