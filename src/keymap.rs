//! Key chords and a subscription-based handler registry.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use thiserror::Error;

const RELEVANT: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SHIFT)
    .union(KeyModifiers::SUPER);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyChord {
    pub fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code: normalize(code), modifiers: modifiers & RELEVANT }
    }

    pub fn ctrl(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::CONTROL)
    }

    pub fn matches(&self, ev: &KeyEvent) -> bool {
        normalize(ev.code) == self.code && (ev.modifiers & RELEVANT) == self.modifiers
    }
}

fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyChordParseError {
    #[error("empty key chord")]
    Empty,
    #[error("no key specified (only modifiers)")]
    NoKey,
    #[error("more than one key: {0}")]
    MultipleKeys(String),
    #[error("unknown key: {0}")]
    UnknownKey(String),
}

impl FromStr for KeyChord {
    type Err = KeyChordParseError;

    /// Parses strings like `ctrl+space` or `Ctrl+Shift+K`, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(KeyChordParseError::Empty);
        }

        let mut modifiers = KeyModifiers::NONE;
        let mut code: Option<KeyCode> = None;
        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => modifiers |= KeyModifiers::CONTROL,
                "alt" | "option" => modifiers |= KeyModifiers::ALT,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "super" | "meta" | "cmd" | "win" => modifiers |= KeyModifiers::SUPER,
                _ => {
                    if code.is_some() {
                        return Err(KeyChordParseError::MultipleKeys(s.to_string()));
                    }
                    code = Some(parse_key(part)?);
                }
            }
        }

        code.map(|c| KeyChord::new(c, modifiers)).ok_or(KeyChordParseError::NoKey)
    }
}

fn parse_key(s: &str) -> Result<KeyCode, KeyChordParseError> {
    let lower = s.to_ascii_lowercase();
    let mut chars = lower.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    Ok(match lower.as_str() {
        "space" => KeyCode::Char(' '),
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "esc" | "escape" => KeyCode::Esc,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        f if f.starts_with('f') => match f[1..].parse::<u8>() {
            Ok(n @ 1..=12) => KeyCode::F(n),
            _ => return Err(KeyChordParseError::UnknownKey(s.to_string())),
        },
        _ => return Err(KeyChordParseError::UnknownKey(s.to_string())),
    })
}

impl fmt::Display for KeyChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (m, name) in [
            (KeyModifiers::CONTROL, "Ctrl+"),
            (KeyModifiers::ALT, "Alt+"),
            (KeyModifiers::SHIFT, "Shift+"),
            (KeyModifiers::SUPER, "Super+"),
        ] {
            if self.modifiers.contains(m) {
                f.write_str(name)?;
            }
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("Space"),
            KeyCode::Char(c) => write!(f, "{}", c.to_ascii_uppercase()),
            KeyCode::F(n) => write!(f, "F{n}"),
            KeyCode::Enter => f.write_str("Enter"),
            KeyCode::Esc => f.write_str("Esc"),
            KeyCode::PageUp => f.write_str("PageUp"),
            KeyCode::PageDown => f.write_str("PageDown"),
            other => write!(f, "{other:?}"),
        }
    }
}

/* ───────────────────────── Registry ───────────────────────── */

struct Entry<H> {
    id: u64,
    chord: KeyChord,
    handler: H,
}

struct Registry<H> {
    next_id: u64,
    entries: Vec<Entry<H>>,
}

/// Handlers keyed by chord. Each [`Keymap::subscribe`] returns the
/// [`Subscription`] that removes it again; nothing stays registered
/// without an owner.
pub struct Keymap<H> {
    registry: Arc<Mutex<Registry<H>>>,
}

impl<H> Clone for Keymap<H> {
    fn clone(&self) -> Self {
        Self { registry: Arc::clone(&self.registry) }
    }
}

impl<H: Clone + Send + 'static> Default for Keymap<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Clone + Send + 'static> Keymap<H> {
    pub fn new() -> Self {
        Self { registry: Arc::new(Mutex::new(Registry { next_id: 0, entries: Vec::new() })) }
    }

    fn lock(&self) -> MutexGuard<'_, Registry<H>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self, chord: KeyChord, handler: H) -> Subscription {
        let id = {
            let mut reg = self.lock();
            reg.next_id += 1;
            let id = reg.next_id;
            reg.entries.push(Entry { id, chord, handler });
            id
        };
        let weak = Arc::downgrade(&self.registry);
        Subscription {
            id,
            dispose: Some(Box::new(move || {
                if let Some(registry) = weak.upgrade() {
                    let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
                    reg.entries.retain(|e| e.id != id);
                }
            })),
        }
    }

    /// The most recently subscribed handler for this key, if any.
    pub fn lookup(&self, ev: &KeyEvent) -> Option<H> {
        self.lock().entries.iter().rev().find(|e| e.chord.matches(ev)).map(|e| e.handler.clone())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn chords(&self) -> Vec<KeyChord> {
        self.lock().entries.iter().map(|e| e.chord).collect()
    }

    /// Every registered handler, oldest first.
    #[cfg(test)]
    pub(crate) fn handlers(&self) -> Vec<H> {
        self.lock().entries.iter().map(|e| e.handler.clone()).collect()
    }
}

/// Disposer for one keymap entry. Disposing twice is impossible; dropping
/// an undisposed subscription disposes it.
pub struct Subscription {
    id: u64,
    dispose: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn dispose(mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(f) = self.dispose.take() {
            f();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
