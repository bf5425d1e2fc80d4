use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::dom::events::KeyPress;

pub const DEFAULT_REWRITE_SHORTCUT: &str = "Alt+R";
pub const DEFAULT_MODE_SELECTION_SHORTCUT: &str = "Alt+Shift+R";
pub const SETTINGS_SHORTCUT: &str = "Alt+Shift+S";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShortcutError {
    #[error("empty shortcut")]
    Empty,
    #[error("shortcut '{0}' has no key")]
    MissingKey(String),
    #[error("shortcut '{0}' names more than one key")]
    MultipleKeys(String),
}

/// A modifier set plus one key, e.g. `Alt+Shift+R`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyCombo {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// Lowercased key name.
    pub key: String,
}

impl KeyCombo {
    pub fn matches(&self, press: &KeyPress) -> bool {
        self.ctrl == press.ctrl
            && self.alt == press.alt
            && self.shift == press.shift
            && self.meta == press.meta
            && self.key == press.key.to_lowercase()
    }
}

impl FromStr for KeyCombo {
    type Err = ShortcutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(ShortcutError::Empty);
        }

        let mut combo = KeyCombo::default();
        let mut key: Option<String> = None;

        for part in s.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_lowercase().as_str() {
                "ctrl" | "control" => combo.ctrl = true,
                "alt" | "option" => combo.alt = true,
                "shift" => combo.shift = true,
                "meta" | "cmd" | "command" | "super" => combo.meta = true,
                other => {
                    if key.is_some() {
                        return Err(ShortcutError::MultipleKeys(s.to_string()));
                    }
                    key = Some(other.to_string());
                }
            }
        }

        combo.key = key.ok_or_else(|| ShortcutError::MissingKey(s.to_string()))?;
        Ok(combo)
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.meta {
            parts.push("Meta".to_string());
        }
        parts.push(self.key.to_uppercase());
        write!(f, "{}", parts.join("+"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    RewriteLastMode,
    OpenModeSelection,
    OpenSettings,
    /// `Alt+1`..`Alt+9`: zero-based index into the mode list.
    SelectMode(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keymap {
    bindings: Vec<(KeyCombo, ShortcutAction)>,
}

impl Keymap {
    pub fn new(rewrite: KeyCombo, mode_selection: KeyCombo) -> Self {
        let mut bindings = vec![
            (rewrite, ShortcutAction::RewriteLastMode),
            (mode_selection, ShortcutAction::OpenModeSelection),
        ];
        if let Ok(settings) = SETTINGS_SHORTCUT.parse() {
            bindings.push((settings, ShortcutAction::OpenSettings));
        }
        Self { bindings }
    }

    /// Builds a keymap from user-supplied strings, keeping the default for
    /// any that fail to parse.
    pub fn from_strings(rewrite: &str, mode_selection: &str) -> Self {
        let parse = |s: &str, fallback: &str| {
            s.parse::<KeyCombo>().unwrap_or_else(|e| {
                tracing::warn!("invalid shortcut, using {}: {}", fallback, e);
                fallback.parse().unwrap_or_default()
            })
        };
        Self::new(
            parse(rewrite, DEFAULT_REWRITE_SHORTCUT),
            parse(mode_selection, DEFAULT_MODE_SELECTION_SHORTCUT),
        )
    }

    pub fn resolve(&self, press: &KeyPress) -> Option<ShortcutAction> {
        if let Some((_, action)) = self.bindings.iter().find(|(c, _)| c.matches(press)) {
            return Some(*action);
        }

        // Mode cycling
        if press.alt && !press.ctrl && !press.shift && !press.meta {
            if let Some(digit) = press.key.chars().next().and_then(|c| c.to_digit(10)) {
                if press.key.len() == 1 && (1..=9).contains(&digit) {
                    return Some(ShortcutAction::SelectMode(digit as usize - 1));
                }
            }
        }
        None
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_strings(DEFAULT_REWRITE_SHORTCUT, DEFAULT_MODE_SELECTION_SHORTCUT)
    }
}
