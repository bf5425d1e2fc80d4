use tracing::warn;

use crate::field::shortcuts::{DEFAULT_MODE_SELECTION_SHORTCUT, DEFAULT_REWRITE_SHORTCUT};
use crate::field::tagger::{ElementFilter, FieldRule};
use crate::store::{KeyValueStore, StoreError, get_json, set_json};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_MODEL: &str = "llama3";
pub const DEFAULT_MODE: &str = "casual";
pub const DEFAULT_GRACE_DELAY_MS: u64 = 200;

/// Keys of the durable store.
pub mod keys {
    pub const ENABLED: &str = "enabled";
    pub const ENDPOINT_URL: &str = "endpointUrl";
    pub const SELECTED_MODEL: &str = "selectedModel";
    pub const DEFAULT_MODE: &str = "defaultMode";
    pub const DEBUG: &str = "debug";
    pub const MODELS: &str = "models";
    pub const KEYBOARD_SHORTCUT: &str = "keyboardShortcut";
    pub const QUICK_REWRITE_SHORTCUT: &str = "quickRewriteShortcut";
    pub const EXCLUDED_TAGS: &str = "excludedTags";
    pub const INCLUDED_TAGS: &str = "includedTags";
    pub const GRACE_DELAY_MS: &str = "graceDelayMs";
    pub const LAST_USED_MODES: &str = "lastUsedModes";
    pub const CUSTOM_MODES: &str = "customModes";
}

/// User settings, loaded once from the durable store and written back on
/// every change.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub enabled: bool,
    pub endpoint_url: String,
    pub selected_model: String,
    pub default_mode: Option<String>,
    pub debug: bool,
    /// Model names from the last successful listing.
    pub models: Vec<String>,
    pub keyboard_shortcut: String,
    pub quick_rewrite_shortcut: String,
    pub excluded_tags: Vec<FieldRule>,
    pub included_tags: Vec<FieldRule>,
    pub grace_delay_ms: u64,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint_url: DEFAULT_ENDPOINT.to_string(),
            selected_model: DEFAULT_MODEL.to_string(),
            default_mode: Some(DEFAULT_MODE.to_string()),
            debug: false,
            models: Vec::new(),
            keyboard_shortcut: DEFAULT_REWRITE_SHORTCUT.to_string(),
            quick_rewrite_shortcut: DEFAULT_MODE_SELECTION_SHORTCUT.to_string(),
            excluded_tags: Vec::new(),
            included_tags: Vec::new(),
            grace_delay_ms: DEFAULT_GRACE_DELAY_MS,
        }
    }
}

impl Configuration {
    /// Reads every setting, substituting the default for anything missing or
    /// corrupt. Never fails.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        let text = |key: &str, fallback: String| {
            store
                .get(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(fallback)
        };

        Self {
            enabled: get_json(store, keys::ENABLED).unwrap_or(defaults.enabled),
            endpoint_url: text(keys::ENDPOINT_URL, defaults.endpoint_url),
            selected_model: text(keys::SELECTED_MODEL, defaults.selected_model),
            default_mode: store
                .get(keys::DEFAULT_MODE)
                .filter(|v| !v.trim().is_empty())
                .or(defaults.default_mode),
            debug: get_json(store, keys::DEBUG).unwrap_or(defaults.debug),
            models: get_json(store, keys::MODELS).unwrap_or_default(),
            keyboard_shortcut: text(keys::KEYBOARD_SHORTCUT, defaults.keyboard_shortcut),
            quick_rewrite_shortcut: text(
                keys::QUICK_REWRITE_SHORTCUT,
                defaults.quick_rewrite_shortcut,
            ),
            excluded_tags: get_json(store, keys::EXCLUDED_TAGS).unwrap_or_default(),
            included_tags: get_json(store, keys::INCLUDED_TAGS).unwrap_or_default(),
            grace_delay_ms: get_json(store, keys::GRACE_DELAY_MS)
                .unwrap_or(defaults.grace_delay_ms),
        }
    }

    pub fn save(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        set_json(store, keys::ENABLED, &self.enabled)?;
        store.set(keys::ENDPOINT_URL, &self.endpoint_url)?;
        store.set(keys::SELECTED_MODEL, &self.selected_model)?;
        if let Some(mode) = &self.default_mode {
            store.set(keys::DEFAULT_MODE, mode)?;
        }
        set_json(store, keys::DEBUG, &self.debug)?;
        set_json(store, keys::MODELS, &self.models)?;
        store.set(keys::KEYBOARD_SHORTCUT, &self.keyboard_shortcut)?;
        store.set(keys::QUICK_REWRITE_SHORTCUT, &self.quick_rewrite_shortcut)?;
        set_json(store, keys::EXCLUDED_TAGS, &self.excluded_tags)?;
        set_json(store, keys::INCLUDED_TAGS, &self.included_tags)?;
        set_json(store, keys::GRACE_DELAY_MS, &self.grace_delay_ms)?;
        Ok(())
    }

    /// Same as [`Self::save`], but failures are logged instead of returned.
    /// Settings are best-effort.
    pub fn save_or_warn(&self, store: &dyn KeyValueStore) {
        if let Err(e) = self.save(store) {
            warn!("failed to persist configuration: {}", e);
        }
    }

    pub fn element_filter(&self) -> ElementFilter {
        ElementFilter::new(self.excluded_tags.clone(), self.included_tags.clone())
    }

    pub fn grace_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.grace_delay_ms)
    }
}
