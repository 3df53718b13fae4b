//! Keyboard shortcuts, running alongside controller navigation.
//!
//! Shortcuts are written as `"ctrl+shift+f"`: any number of modifiers, then
//! exactly one key, joined by `+`. Parsing is case-insensitive and modifier
//! order does not matter; [`Shortcut`]'s `Display` always produces the
//! canonical form (`ctrl`, `alt`, `shift`, `meta`, then the key).

use crate::persistence::{self, ConfigStore, StoreError};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Store key holding the action → shortcut table
pub const SHORTCUTS_KEY: &str = "shortcuts";

/// Passes through even while a text field has focus
pub const ESCAPE_KEY: &str = "escape";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ShortcutError {
    #[error("Empty shortcut")]
    Empty,

    #[error("Empty segment in shortcut '{0}'")]
    EmptySegment(String),

    #[error("Unknown modifier '{modifier}' in shortcut '{input}'")]
    UnknownModifier { input: String, modifier: String },

    #[error("Shortcut '{0}' has no key")]
    MissingKey(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    /// Case-insensitive name lookup, aliases included
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "alt" | "option" => Some(Modifier::Alt),
            "shift" => Some(Modifier::Shift),
            "meta" | "cmd" | "command" | "super" | "win" => Some(Modifier::Meta),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub fn with(mut self, modifier: Modifier) -> Self {
        match modifier {
            Modifier::Ctrl => self.ctrl = true,
            Modifier::Alt => self.alt = true,
            Modifier::Shift => self.shift = true,
            Modifier::Meta => self.meta = true,
        }
        self
    }

    fn names(&self) -> impl Iterator<Item = &'static str> {
        [
            (self.ctrl, "ctrl"),
            (self.alt, "alt"),
            (self.shift, "shift"),
            (self.meta, "meta"),
        ]
        .into_iter()
        .filter_map(|(held, name)| held.then_some(name))
    }
}

fn normalize_key(key: &str) -> String {
    let key = key.trim().to_lowercase();
    match key.as_str() {
        "esc" => ESCAPE_KEY.to_string(),
        "return" => "enter".to_string(),
        _ => key,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shortcut {
    pub modifiers: Modifiers,
    pub key: String,
}

impl Shortcut {
    pub fn new(modifiers: Modifiers, key: &str) -> Self {
        Self {
            modifiers,
            key: normalize_key(key),
        }
    }

    /// Shortcut for a key event; none for a lone modifier press
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        let key = normalize_key(&event.key);
        if key.is_empty() || Modifier::from_name(&key).is_some() {
            return None;
        }
        Some(Self {
            modifiers: event.modifiers,
            key,
        })
    }

    pub fn is_escape(&self) -> bool {
        self.key == ESCAPE_KEY && self.modifiers == Modifiers::NONE
    }
}

impl FromStr for Shortcut {
    type Err = ShortcutError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let text = input.trim().to_lowercase();
        if text.is_empty() {
            return Err(ShortcutError::Empty);
        }

        // "+" itself can be the key: "ctrl++" or just "+"
        let (prefix, key) = if text == "+" {
            ("", "+")
        } else if let Some(prefix) = text.strip_suffix("++") {
            (prefix, "+")
        } else {
            match text.rsplit_once('+') {
                Some((prefix, key)) => (prefix, key),
                None => ("", text.as_str()),
            }
        };

        let key = key.trim();
        if key.is_empty() || Modifier::from_name(key).is_some() {
            return Err(ShortcutError::MissingKey(input.to_string()));
        }

        let mut modifiers = Modifiers::NONE;
        if !prefix.is_empty() {
            for segment in prefix.split('+').map(str::trim) {
                if segment.is_empty() {
                    return Err(ShortcutError::EmptySegment(input.to_string()));
                }
                let modifier =
                    Modifier::from_name(segment).ok_or_else(|| ShortcutError::UnknownModifier {
                        input: input.to_string(),
                        modifier: segment.to_string(),
                    })?;
                modifiers = modifiers.with(modifier);
            }
        }

        Ok(Shortcut::new(modifiers, key))
    }
}

impl fmt::Display for Shortcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.modifiers.names() {
            write!(f, "{}+", name)?;
        }
        write!(f, "{}", self.key)
    }
}

/// A key press as the host reports it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: String,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: impl Into<String>, modifiers: Modifiers) -> Self {
        Self {
            key: key.into(),
            modifiers,
        }
    }

    pub fn plain(key: impl Into<String>) -> Self {
        Self::new(key, Modifiers::NONE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Name of the bound action
    Action(String),
    /// Canonical string of the key captured in capture mode
    Captured(String),
    Ignored,
}

/// Action table for keyboard shortcuts, one shortcut per action
#[derive(Debug, Default)]
pub struct ShortcutChannel {
    bindings: HashMap<Shortcut, String>,
    capturing: bool,
}

impl ShortcutChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `action` to `shortcut`, replacing the action's previous binding.
    /// A shortcut already bound elsewhere moves to `action`.
    pub fn register(&mut self, action: &str, shortcut: &str) -> Result<Shortcut, ShortcutError> {
        let shortcut: Shortcut = shortcut.parse()?;
        self.unregister_action(action);
        if let Some(previous) = self.bindings.insert(shortcut.clone(), action.to_string()) {
            debug!("{} moved from {} to {}", shortcut, previous, action);
        }
        Ok(shortcut)
    }

    pub fn unregister_action(&mut self, action: &str) -> bool {
        let before = self.bindings.len();
        self.bindings.retain(|_, bound| bound != action);
        self.bindings.len() != before
    }

    pub fn binding_for(&self, action: &str) -> Option<&Shortcut> {
        self.bindings
            .iter()
            .find(|(_, bound)| bound.as_str() == action)
            .map(|(shortcut, _)| shortcut)
    }

    pub fn action_for(&self, shortcut: &Shortcut) -> Option<&str> {
        self.bindings.get(shortcut).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The next non-modifier key event is returned as `Captured` instead of
    /// being matched
    pub fn begin_capture(&mut self) {
        self.capturing = true;
    }

    pub fn cancel_capture(&mut self) {
        self.capturing = false;
    }

    pub fn is_capturing(&self) -> bool {
        self.capturing
    }

    pub fn handle(&mut self, event: &KeyEvent, text_input_focused: bool) -> KeyOutcome {
        let Some(shortcut) = Shortcut::from_event(event) else {
            return KeyOutcome::Ignored;
        };

        if self.capturing {
            self.capturing = false;
            return KeyOutcome::Captured(shortcut.to_string());
        }

        if text_input_focused && !shortcut.is_escape() {
            return KeyOutcome::Ignored;
        }

        match self.bindings.get(&shortcut) {
            Some(action) => {
                debug!("Shortcut {} -> {}", shortcut, action);
                KeyOutcome::Action(action.clone())
            }
            None => KeyOutcome::Ignored,
        }
    }

    /// Loads bindings from the store; unparsable entries are logged and skipped
    pub fn load(store: &dyn ConfigStore) -> Result<Self, StoreError> {
        let mut channel = Self::new();
        let table: BTreeMap<String, String> =
            persistence::get_as(store, SHORTCUTS_KEY)?.unwrap_or_default();
        for (action, shortcut) in &table {
            if let Err(e) = channel.register(action, shortcut) {
                warn!("Skipping shortcut for {}: {}", action, e);
            }
        }
        info!("Loaded {} keyboard shortcuts", channel.len());
        Ok(channel)
    }

    /// Like [`ShortcutChannel::load`], but a store failure or a malformed
    /// `shortcuts` table is logged and yields an empty channel
    pub fn load_or_default(store: &dyn ConfigStore) -> Self {
        Self::load(store).unwrap_or_else(|e| {
            warn!("Failed to load shortcuts, starting without any: {}", e);
            Self::new()
        })
    }

    pub fn save(&self, store: &dyn ConfigStore) -> Result<(), StoreError> {
        let table: BTreeMap<&str, String> = self
            .bindings
            .iter()
            .map(|(shortcut, action)| (action.as_str(), shortcut.to_string()))
            .collect();
        persistence::set_as(store, SHORTCUTS_KEY, &table)
    }
}
