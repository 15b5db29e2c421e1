//! The cached content model and the events that keep it honest.
//!
//! An editor holds one [`CacheState`]: the last model it parsed or rendered,
//! the selection that model reflects and a [`DomIndex`] from rendered nodes
//! back to model locations. Host events go through [`transition`], a pure
//! function that decides what the cache does with them. Selection moves are
//! absorbed in place by [`reconcile_selection`]; anything whose effect on the
//! tree cannot be predicted drops the model so the next read re-parses.

mod index;
mod reconcile;

pub use index::DomIndex;
pub use reconcile::reconcile_selection;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tapestry_dom::DomSelection;
use tapestry_model::ContentModelDocument;

/// What produced a content change. Recorded for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ChangeSource {
    Format,
    SetContent,
    Paste,
    Keyboard,
    Cut,
    Drop,
    SwitchToDarkMode,
    SwitchToLightMode,
}

impl ChangeSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ChangeSource::Format => "Format",
            ChangeSource::SetContent => "SetContent",
            ChangeSource::Paste => "Paste",
            ChangeSource::Keyboard => "Keyboard",
            ChangeSource::Cut => "Cut",
            ChangeSource::Drop => "Drop",
            ChangeSource::SwitchToDarkMode => "SwitchToDarkMode",
            ChangeSource::SwitchToLightMode => "SwitchToLightMode",
        }
    }
}

/// A key press as the host reports it, before its default action runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDownEvent {
    /// DOM `key` value: `"a"`, `"Enter"`, `"ArrowLeft"`, ...
    pub key: SmolStr,
    pub ctrl_key: bool,
    pub meta_key: bool,
    pub alt_key: bool,
    /// Another feature already consumed the key.
    pub handled: bool,
    pub default_prevented: bool,
}

impl KeyDownEvent {
    pub fn new(key: &str) -> Self {
        Self {
            key: SmolStr::new(key),
            ..Default::default()
        }
    }

    /// The key types a visible character.
    pub fn is_character_input(&self) -> bool {
        !self.ctrl_key && !self.meta_key && self.key.chars().count() == 1
    }
}

/// Content was changed outside the cache's view.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentChangedEvent {
    pub source: ChangeSource,
    /// The model after the change, when the changer has one.
    pub model: Option<Box<ContentModelDocument>>,
    pub selection: Option<DomSelection>,
}

impl ContentChangedEvent {
    pub fn new(source: ChangeSource) -> Self {
        Self {
            source,
            model: None,
            selection: None,
        }
    }

    pub fn with_model(mut self, model: ContentModelDocument, selection: Option<DomSelection>) -> Self {
        self.model = Some(Box::new(model));
        self.selection = selection;
        self
    }
}

/// Host events the cache listens to, in dispatch order.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    KeyDown(KeyDownEvent),
    Input,
    /// The editor changed the selection itself.
    SelectionChanged,
    /// The host selection moved while the editor had focus.
    NativeSelectionChanged,
    ContentChanged(ContentChangedEvent),
}

impl EditorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            EditorEvent::KeyDown(_) => "keyDown",
            EditorEvent::Input => "input",
            EditorEvent::SelectionChanged => "selectionChanged",
            EditorEvent::NativeSelectionChanged => "nativeSelectionChanged",
            EditorEvent::ContentChanged(_) => "contentChanged",
        }
    }
}

/// Why the cached model was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidateReason {
    KeyAlreadyHandled,
    DefaultPrevented,
    Enter,
    /// Typing replaces a non-collapsed, image or table selection.
    TypingOverSelection,
    ContentChangedWithoutModel,
    /// Reconciliation is turned off.
    CacheDisabled,
    ReconcileFailed,
    Requested,
}

/// What the cache does with one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheAction {
    Keep,
    Invalidate(InvalidateReason),
    /// Take the model and selection carried by the event.
    Adopt,
    /// Move the cached selection to the current DOM selection. A forced
    /// reconcile runs even when the selection looks unchanged.
    Reconcile { forced: bool },
}

/// The model an editor last saw and the selection it reflects.
#[derive(Debug, Clone, Default)]
pub struct CacheState {
    pub model: Option<ContentModelDocument>,
    pub selection: Option<DomSelection>,
    pub index: Option<DomIndex>,
}

impl CacheState {
    pub fn clear(&mut self) {
        self.model = None;
        self.selection = None;
        self.index = None;
    }

    pub fn has_model(&self) -> bool {
        self.model.is_some()
    }
}

/// Keys whose effect on the tree the cache cannot predict.
pub fn invalidation_for_key(event: &KeyDownEvent, cached_selection: Option<&DomSelection>) -> Option<InvalidateReason> {
    if event.handled {
        return Some(InvalidateReason::KeyAlreadyHandled);
    }
    if event.default_prevented {
        return Some(InvalidateReason::DefaultPrevented);
    }
    if event.key == "Enter" {
        return Some(InvalidateReason::Enter);
    }
    let replaces_selection = !cached_selection.is_some_and(DomSelection::is_collapsed_range);
    if event.is_character_input() && replaces_selection {
        return Some(InvalidateReason::TypingOverSelection);
    }
    None
}

/// Decide what `event` does to `state`.
///
/// With `cache_model` off there is nothing to reconcile against, so any
/// selection move drops the model.
pub fn transition(state: &CacheState, event: &EditorEvent, cache_model: bool) -> CacheAction {
    match event {
        EditorEvent::ContentChanged(changed) => match changed.model {
            Some(_) => CacheAction::Adopt,
            None => CacheAction::Invalidate(InvalidateReason::ContentChangedWithoutModel),
        },
        EditorEvent::KeyDown(key) => match invalidation_for_key(key, state.selection.as_ref()) {
            Some(reason) if state.has_model() => CacheAction::Invalidate(reason),
            _ => CacheAction::Keep,
        },
        EditorEvent::Input | EditorEvent::SelectionChanged | EditorEvent::NativeSelectionChanged => {
            if !state.has_model() {
                CacheAction::Keep
            } else if !cache_model {
                CacheAction::Invalidate(InvalidateReason::CacheDisabled)
            } else {
                CacheAction::Reconcile {
                    forced: matches!(event, EditorEvent::Input),
                }
            }
        }
    }
}
