//! Installs the AI shortcuts for the current credential and runs them.

use std::mem;
use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::api::TextAssistant;
use crate::config::ShortcutConfig;
use crate::credential::Credential;
use crate::editor::{SelectionEditor, SelectionHandle};
use crate::error::{ApiError, ConfigError};
use crate::keymap::{KeyChord, Keymap, Subscription};
use crate::store::{FeatureFlag, Settings};

/// Builds the API client for a newly installed credential.
pub type AssistantFactory = Box<dyn Fn(Credential) -> Arc<dyn TextAssistant> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Improve,
    Complete,
}

impl Operation {
    pub fn flag(self) -> FeatureFlag {
        match self {
            Operation::Improve => FeatureFlag::TextImprovement,
            Operation::Complete => FeatureFlag::TextCompletion,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Operation::Improve => "improve",
            Operation::Complete => "complete",
        }
    }
}

/// What a keymap entry carries: the operation and the client it was
/// installed with.
#[derive(Clone)]
pub struct Binding {
    pub operation: Operation,
    pub generation: u64,
    assistant: Arc<dyn TextAssistant>,
}

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub improve: KeyChord,
    pub complete: KeyChord,
    pub require_flags: bool,
    pub placeholder: String,
}

impl ControllerOptions {
    pub fn from_config(config: &ShortcutConfig) -> Result<Self, ConfigError> {
        let (improve, complete) = config.chords()?;
        Ok(Self {
            improve,
            complete,
            require_flags: config.require_flags,
            placeholder: config.placeholder.clone(),
        })
    }

    fn chord(&self, op: Operation) -> KeyChord {
        match op {
            Operation::Improve => self.improve,
            Operation::Complete => self.complete,
        }
    }
}

/// Everything the installed handlers depend on. A change in any part
/// means reinstalling.
#[derive(Clone, PartialEq, Eq)]
struct BindingKey {
    credential: Credential,
    flags: Option<(bool, bool)>,
}

enum State {
    Disabled,
    Active { key: BindingKey, subscriptions: Vec<Subscription> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Unchanged,
    Installed { handlers: usize },
    Disabled,
}

pub struct ShortcutController {
    options: ControllerOptions,
    keymap: Keymap<Binding>,
    factory: AssistantFactory,
    state: State,
    generation: u64,
}

impl ShortcutController {
    pub fn new(options: ControllerOptions, factory: AssistantFactory) -> Self {
        Self { options, keymap: Keymap::new(), factory, state: State::Disabled, generation: 0 }
    }

    pub fn options(&self) -> &ControllerOptions {
        &self.options
    }

    pub fn keymap(&self) -> &Keymap<Binding> {
        &self.keymap
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    /// Brings the installed handlers in line with `settings`. Old handlers
    /// are always disposed before new ones are subscribed.
    pub fn reconcile(&mut self, settings: &Settings) -> Reconciled {
        let next = settings.api_key.clone().filter(|k| !k.is_empty()).map(|credential| BindingKey {
            credential,
            flags: self
                .options
                .require_flags
                .then_some((settings.text_completion, settings.text_improvement)),
        });
        let current = match &self.state {
            State::Active { key, .. } => Some(key),
            State::Disabled => None,
        };
        if current == next.as_ref() {
            return Reconciled::Unchanged;
        }

        self.uninstall();
        match next {
            Some(key) => self.install(key),
            None => {
                tracing::info!("no API key stored, AI shortcuts disabled");
                Reconciled::Disabled
            }
        }
    }

    fn uninstall(&mut self) {
        if let State::Active { subscriptions, .. } = mem::replace(&mut self.state, State::Disabled) {
            let count = subscriptions.len();
            for sub in subscriptions {
                sub.dispose();
            }
            tracing::debug!(generation = self.generation, count, "shortcut handlers removed");
        }
    }

    fn install(&mut self, key: BindingKey) -> Reconciled {
        self.generation += 1;
        let assistant = (self.factory)(key.credential.clone());

        let mut subscriptions = Vec::new();
        for op in [Operation::Improve, Operation::Complete] {
            let enabled = match key.flags {
                Some((completion, improvement)) => match op.flag() {
                    FeatureFlag::TextCompletion => completion,
                    FeatureFlag::TextImprovement => improvement,
                },
                None => true,
            };
            if !enabled {
                continue;
            }
            let binding = Binding { operation: op, generation: self.generation, assistant: Arc::clone(&assistant) };
            subscriptions.push(self.keymap.subscribe(self.options.chord(op), binding));
        }

        let handlers = subscriptions.len();
        tracing::info!(generation = self.generation, handlers, "API key set, AI shortcuts enabled");
        self.state = State::Active { key, subscriptions };
        Reconciled::Installed { handlers }
    }

    /// Handles a key press. A bound chord is always consumed, even when
    /// there is nothing to send.
    pub fn trigger<E: SelectionEditor>(&self, key: &KeyEvent, editor: &mut E) -> Triggered {
        let Some(binding) = self.keymap.lookup(key) else {
            return Triggered::NotBound;
        };
        let Some(captured) = editor.read() else {
            tracing::debug!(op = binding.operation.label(), "nothing to send, shortcut ignored");
            return Triggered::Ignored;
        };
        let placeholder = !self.options.placeholder.is_empty()
            && editor.replace(captured.handle, &self.options.placeholder);
        tracing::debug!(
            op = binding.operation.label(),
            generation = binding.generation,
            chars = captured.text.chars().count(),
            "shortcut triggered"
        );
        Triggered::Started(PendingRequest {
            operation: binding.operation,
            assistant: binding.assistant,
            original: captured.text,
            handle: captured.handle,
            placeholder,
        })
    }
}

/// Outcome of a key press seen by [`ShortcutController::trigger`].
pub enum Triggered {
    /// Not a shortcut; handle the key normally.
    NotBound,
    /// A shortcut with no selection to act on, or one already pending.
    Ignored,
    Started(PendingRequest),
}

impl Triggered {
    #[cfg(test)]
    fn started(self) -> Option<PendingRequest> {
        match self {
            Triggered::Started(p) => Some(p),
            _ => None,
        }
    }
}

/// A captured selection waiting on the API. Owns the client it was
/// triggered with, so a credential change while it runs does not affect it.
pub struct PendingRequest {
    operation: Operation,
    assistant: Arc<dyn TextAssistant>,
    original: String,
    handle: SelectionHandle,
    placeholder: bool,
}

impl PendingRequest {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub async fn run(self) -> Finished {
        let result = match self.operation {
            Operation::Improve => self.assistant.improve(&self.original).await,
            Operation::Complete => self
                .assistant
                .complete(&self.original)
                .await
                .map(|continuation| format!("{}{}", self.original, continuation)),
        };
        Finished {
            operation: self.operation,
            original: self.original,
            handle: self.handle,
            placeholder: self.placeholder,
            result,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Written,
    /// The selection was edited or removed while the request ran.
    Stale,
}

pub struct Finished {
    operation: Operation,
    original: String,
    handle: SelectionHandle,
    placeholder: bool,
    result: Result<String, ApiError>,
}

impl Finished {
    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Writes the outcome back. On failure a placeholder is swapped back
    /// for the original text, so the document ends up as it was.
    pub fn apply<E: SelectionEditor>(self, editor: &mut E) -> Result<Applied, ApiError> {
        let outcome = match self.result {
            Ok(text) => {
                if editor.replace(self.handle, &text) {
                    Ok(Applied::Written)
                } else {
                    tracing::debug!(op = self.operation.label(), "selection changed while waiting, result dropped");
                    Ok(Applied::Stale)
                }
            }
            Err(err) => {
                tracing::warn!(op = self.operation.label(), reason = err.reason(), "API request failed");
                if self.placeholder {
                    editor.replace(self.handle, &self.original);
                }
                Err(err)
            }
        };
        editor.release(self.handle);
        outcome
    }
}
