//! The document being edited and the selection contract the shortcuts use.

pub mod document;

pub use document::Document;

/// Opaque reference to a tracked range of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionHandle(pub(crate) u64);

/// A selection captured for one shortcut invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Captured {
    pub text: String,
    pub handle: SelectionHandle,
}

pub trait SelectionEditor {
    /// Captures the current selection. `None` when nothing is selected or
    /// the selection overlaps a span that is still tracked.
    fn read(&mut self) -> Option<Captured>;

    /// Replaces the handle's span with `text`; the handle then spans the
    /// inserted text and a selection touching it collapses to its end.
    /// Returns `false` and changes nothing when the handle is unknown,
    /// invalidated by an overlapping edit, or collapsed.
    fn replace(&mut self, handle: SelectionHandle, text: &str) -> bool;

    /// Stops tracking the handle.
    fn release(&mut self, handle: SelectionHandle);
}
