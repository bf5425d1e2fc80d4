use std::collections::BTreeMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::keys;
use crate::field::identity::is_persistable;
use crate::modes::builtin::builtin_modes;
use crate::store::{KeyValueStore, StoreError, get_json, set_json};

pub const CUSTOM_KEY_PREFIX: &str = "custom_";

#[derive(Debug, Error)]
pub enum ModeError {
    #[error("unknown rewrite mode '{0}'")]
    NotFound(String),
    #[error("a rewrite mode with key '{0}' already exists")]
    DuplicateKey(String),
    #[error("rewrite mode key must not be empty")]
    EmptyKey,
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteMode {
    pub key: String,
    pub display_name: String,
    pub prompt_template: String,
    pub description: Option<String>,
    pub is_custom: bool,
}

impl RewriteMode {
    pub fn builtin(key: &str, display_name: &str, prompt_template: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            prompt_template: prompt_template.to_string(),
            description: None,
            is_custom: false,
        }
    }

    pub fn custom(key: &str, display_name: &str, prompt_template: &str) -> Self {
        Self {
            is_custom: true,
            ..Self::builtin(key, display_name, prompt_template)
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }
}

/// Persisted form of a custom mode (`customModes` is `key -> StoredMode`).
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredMode {
    name: String,
    prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
}

/// Ordered set of rewrite modes (built-ins first, then custom modes in the
/// order they were added) plus the last mode used on each field.
pub struct ModeRegistry {
    modes: Vec<RewriteMode>,
    last_used: BTreeMap<String, String>,
    default_mode: Option<String>,
    store: Rc<dyn KeyValueStore>,
}

impl ModeRegistry {
    /// Built-in modes merged with whatever the store holds.
    pub fn load(store: Rc<dyn KeyValueStore>, default_mode: Option<String>) -> Self {
        Self::with_builtins(builtin_modes(), store, default_mode)
    }

    pub fn with_builtins(
        builtins: Vec<RewriteMode>,
        store: Rc<dyn KeyValueStore>,
        default_mode: Option<String>,
    ) -> Self {
        let mut registry = Self {
            modes: builtins,
            last_used: BTreeMap::new(),
            default_mode,
            store,
        };

        let stored: Map<String, serde_json::Value> =
            get_json(registry.store.as_ref(), keys::CUSTOM_MODES).unwrap_or_default();
        for (key, value) in stored {
            let parsed: StoredMode = match serde_json::from_value(value) {
                Ok(m) => m,
                Err(e) => {
                    warn!(key, "skipping unreadable custom mode: {}", e);
                    continue;
                }
            };
            if registry.contains(&key) {
                warn!(key, "skipping custom mode that shadows an existing key");
                continue;
            }
            let mut mode = RewriteMode::custom(&key, &parsed.name, &parsed.prompt);
            mode.description = parsed.description;
            registry.modes.push(mode);
        }

        registry.last_used =
            get_json(registry.store.as_ref(), keys::LAST_USED_MODES).unwrap_or_default();
        registry
    }

    pub fn modes(&self) -> &[RewriteMode] {
        &self.modes
    }

    pub fn contains(&self, key: &str) -> bool {
        self.modes.iter().any(|m| m.key == key)
    }

    pub fn get(&self, key: &str) -> Result<&RewriteMode, ModeError> {
        self.modes
            .iter()
            .find(|m| m.key == key)
            .ok_or_else(|| ModeError::NotFound(key.to_string()))
    }

    pub fn mode_at(&self, index: usize) -> Option<&RewriteMode> {
        self.modes.get(index)
    }

    pub fn set_default_mode(&mut self, default_mode: Option<String>) {
        self.default_mode = default_mode;
    }

    /// Configured default if it names a known mode, else the first mode.
    pub fn default_mode_key(&self) -> String {
        self.default_mode
            .as_deref()
            .filter(|k| self.contains(k))
            .or_else(|| self.modes.first().map(|m| m.key.as_str()))
            .unwrap_or_default()
            .to_string()
    }

    /// Mode last used on `element_key`, falling back to the default when
    /// there is no entry or the entry names a mode that no longer exists.
    pub fn last_used_for(&self, element_key: &str) -> String {
        match self.last_used.get(element_key) {
            Some(mode) if self.contains(mode) => mode.clone(),
            _ => self.default_mode_key(),
        }
    }

    /// Remembers `mode_key` for `element_key` and persists the whole map.
    pub fn record_usage(&mut self, element_key: &str, mode_key: &str) -> Result<(), ModeError> {
        if !is_persistable(element_key) {
            debug!("not recording mode usage for unrooted element");
            return Ok(());
        }
        let previous = self
            .last_used
            .insert(element_key.to_string(), mode_key.to_string());
        if let Err(e) = set_json(self.store.as_ref(), keys::LAST_USED_MODES, &self.last_used) {
            match previous {
                Some(mode) => self.last_used.insert(element_key.to_string(), mode),
                None => self.last_used.remove(element_key),
            };
            return Err(e.into());
        }
        Ok(())
    }

    /// Appends a custom mode. Keys are never overwritten: a collision with a
    /// built-in or custom key is an error and the caller picks another key.
    pub fn add_custom(&mut self, mut mode: RewriteMode) -> Result<(), ModeError> {
        if mode.key.trim().is_empty() {
            return Err(ModeError::EmptyKey);
        }
        if self.contains(&mode.key) {
            return Err(ModeError::DuplicateKey(mode.key));
        }
        mode.is_custom = true;
        self.modes.push(mode);
        if let Err(e) = self.persist_custom() {
            self.modes.pop();
            return Err(e);
        }
        Ok(())
    }

    /// `custom_<slug>` for `display_name`, suffixed `_2`, `_3`, ... until free.
    pub fn unique_custom_key(&self, display_name: &str) -> String {
        let slug = slugify(display_name);
        let base = if slug.is_empty() {
            format!("{}mode", CUSTOM_KEY_PREFIX)
        } else {
            format!("{}{}", CUSTOM_KEY_PREFIX, slug)
        };

        if !self.contains(&base) {
            return base;
        }
        (2..)
            .map(|n| format!("{}_{}", base, n))
            .find(|candidate| !self.contains(candidate))
            .unwrap_or(base)
    }

    fn persist_custom(&self) -> Result<(), ModeError> {
        let custom: Map<String, serde_json::Value> = self
            .modes
            .iter()
            .filter(|m| m.is_custom)
            .filter_map(|m| {
                let stored = StoredMode {
                    name: m.display_name.clone(),
                    prompt: m.prompt_template.clone(),
                    description: m.description.clone(),
                };
                serde_json::to_value(stored).ok().map(|v| (m.key.clone(), v))
            })
            .collect();
        set_json(self.store.as_ref(), keys::CUSTOM_MODES, &custom)?;
        Ok(())
    }
}

/// Lowercase ASCII alphanumerics; every other run of characters becomes a
/// single `_`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut pending_sep = false;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
