use std::cell::{Ref, RefCell};
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::Configuration;
use crate::dom::document::{Document, NodeId};
use crate::dom::events::{DomEvent, EventKind};
use crate::field::shortcuts::{Keymap, ShortcutAction};
use crate::field::tracker::ActiveFieldTracker;
use crate::model::backend::ModelBackend;
use crate::model::error::ModelError;
use crate::model::ollama::OllamaBackend;
use crate::modes::registry::{ModeError, ModeRegistry, RewriteMode};
use crate::rewrite::error::RewriteError;
use crate::rewrite::orchestrator::{RewriteOrchestrator, RewriteOutcome};
use crate::status::{ConnectionStatus, Notification, Notifier};
use crate::store::KeyValueStore;
use crate::trace::logger::TraceLogger;

/// Builds the model backend for an endpoint URL.
pub type BackendFactory = Box<dyn Fn(&str) -> Rc<dyn ModelBackend>>;

/// What the trigger surface should do in response to an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteCommand {
    /// Rewrite `element`; `mode: None` means the field's last-used mode.
    Rewrite {
        element: NodeId,
        mode: Option<String>,
    },
    ShowModes {
        element: NodeId,
    },
    ShowSettings,
}

/// What the store keeps underneath a session-only override, written back in
/// place of the overridden value whenever settings are saved.
#[derive(Debug, Clone, Default)]
struct StoredValues {
    endpoint_url: Option<String>,
    selected_model: Option<String>,
}

/// One rewriter per page: settings, field tracking, shortcuts and the
/// request lifecycle behind a single context object.
///
/// Every operation takes `&self` so events keep flowing into the tracker
/// while a rewrite is waiting on the model server.
pub struct Rewriter {
    store: Rc<dyn KeyValueStore>,
    config: RefCell<Configuration>,
    stored: RefCell<StoredValues>,
    tracker: RefCell<ActiveFieldTracker>,
    keymap: Keymap,
    orchestrator: RewriteOrchestrator,
    backend_factory: BackendFactory,
    trace_path: Option<PathBuf>,
}

impl Rewriter {
    pub fn new(
        store: Rc<dyn KeyValueStore>,
        notifier: Rc<dyn Notifier>,
        backend_factory: BackendFactory,
    ) -> Self {
        let config = Configuration::load(store.as_ref());
        let registry = ModeRegistry::load(Rc::clone(&store), config.default_mode.clone());
        let backend = backend_factory(&config.endpoint_url);
        let orchestrator =
            RewriteOrchestrator::new(backend, registry, notifier, &config.selected_model);

        debug!(
            endpoint = %config.endpoint_url,
            model = %config.selected_model,
            enabled = config.enabled,
            "rewriter initialized"
        );

        Self {
            tracker: RefCell::new(ActiveFieldTracker::new(
                config.grace_delay(),
                config.element_filter(),
            )),
            keymap: Keymap::from_strings(&config.keyboard_shortcut, &config.quick_rewrite_shortcut),
            store,
            config: RefCell::new(config),
            stored: RefCell::new(StoredValues::default()),
            orchestrator,
            backend_factory,
            trace_path: None,
        }
    }

    /// Rewriter talking to an Ollama server at the configured endpoint.
    pub fn ollama(store: Rc<dyn KeyValueStore>, notifier: Rc<dyn Notifier>) -> Self {
        Self::new(
            store,
            notifier,
            Box::new(|endpoint: &str| Rc::new(OllamaBackend::new(endpoint)) as Rc<dyn ModelBackend>),
        )
    }

    /// Session-only endpoint/model, e.g. from command-line flags. Saving
    /// settings keeps the stored values; only `set_endpoint`/`set_model`
    /// replace them.
    pub fn with_overrides(self, endpoint: Option<&str>, model: Option<&str>) -> Self {
        if let Some(endpoint) = endpoint {
            let previous = std::mem::replace(
                &mut self.config.borrow_mut().endpoint_url,
                endpoint.to_string(),
            );
            let mut stored = self.stored.borrow_mut();
            stored.endpoint_url = stored.endpoint_url.take().or(Some(previous));
            self.orchestrator.set_backend((self.backend_factory)(endpoint));
        }
        if let Some(model) = model {
            let previous = std::mem::replace(
                &mut self.config.borrow_mut().selected_model,
                model.to_string(),
            );
            let mut stored = self.stored.borrow_mut();
            stored.selected_model = stored.selected_model.take().or(Some(previous));
            self.orchestrator.set_model(model);
        }
        self
    }

    /// Where debug traces go once `debug` is on.
    pub fn with_trace_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.trace_path = Some(path.into());
        self.sync_tracer();
        self
    }

    /// Settings in effect for this session, overrides included.
    pub fn config(&self) -> Ref<'_, Configuration> {
        self.config.borrow()
    }

    pub fn orchestrator(&self) -> &RewriteOrchestrator {
        &self.orchestrator
    }

    pub fn tracker(&self) -> Ref<'_, ActiveFieldTracker> {
        self.tracker.borrow()
    }

    fn is_enabled(&self) -> bool {
        self.config.borrow().enabled
    }

    // ========================================================================
    // Events and commands
    // ========================================================================

    /// Feeds `event` to the tracker and maps shortcuts to commands. Key
    /// presses only act on a tracked field that is still on the page.
    pub fn handle_event(
        &self,
        doc: &Document,
        event: &DomEvent,
        now: Instant,
    ) -> Option<RewriteCommand> {
        if !self.is_enabled() {
            return None;
        }

        self.tracker.borrow_mut().handle_event(doc, event, now);

        let EventKind::KeyDown(press) = &event.kind else {
            return None;
        };
        let action = self.keymap.resolve(press)?;

        if action == ShortcutAction::OpenSettings {
            return Some(RewriteCommand::ShowSettings);
        }

        let element = self.tracker.borrow_mut().current_live(doc, now)?;
        match action {
            ShortcutAction::RewriteLastMode => Some(RewriteCommand::Rewrite {
                element,
                mode: None,
            }),
            ShortcutAction::OpenModeSelection => Some(RewriteCommand::ShowModes { element }),
            ShortcutAction::SelectMode(index) => {
                let registry = self.orchestrator.registry();
                let mode = registry.mode_at(index)?;
                Some(RewriteCommand::Rewrite {
                    element,
                    mode: Some(mode.key.clone()),
                })
            }
            ShortcutAction::OpenSettings => Some(RewriteCommand::ShowSettings),
        }
    }

    /// Runs a `Rewrite` command. UI commands yield `None`.
    pub async fn run(
        &self,
        doc: &RefCell<Document>,
        command: &RewriteCommand,
    ) -> Option<Result<RewriteOutcome, RewriteError>> {
        match command {
            RewriteCommand::Rewrite { element, mode } => {
                Some(self.rewrite(doc, *element, mode.as_deref()).await)
            }
            RewriteCommand::ShowModes { .. } | RewriteCommand::ShowSettings => None,
        }
    }

    pub async fn rewrite(
        &self,
        doc: &RefCell<Document>,
        element: NodeId,
        mode: Option<&str>,
    ) -> Result<RewriteOutcome, RewriteError> {
        if !self.is_enabled() {
            return Err(RewriteError::Disabled);
        }
        self.orchestrator.trigger(doc, element, mode).await
    }

    // ========================================================================
    // Model server
    // ========================================================================

    /// Fetches the model list. A selected model the server no longer has is
    /// replaced by the first one it offers.
    pub async fn refresh_models(&self) -> Result<Vec<String>, RewriteError> {
        let backend = self.orchestrator.backend();
        let models = match backend.list_models().await {
            Ok(models) => models,
            Err(e) => {
                self.record_connection_failure(&e);
                let err = RewriteError::from(e);
                self.orchestrator
                    .notifier()
                    .notify(&Notification::error(format!("Could not list models: {}", err)));
                return Err(err);
            }
        };

        self.orchestrator.status().mark_connected();
        self.config.borrow_mut().models = models.clone();

        let selected = self.config.borrow().selected_model.clone();
        if let Some(replacement) = models.first().filter(|_| !models.contains(&selected)) {
            warn!(missing = %selected, using = %replacement, "selected model not available");
            self.orchestrator.notifier().notify(&Notification::info(format!(
                "Model {} not found, using {}",
                selected, replacement
            )));
            self.config.borrow_mut().selected_model = replacement.clone();
            self.orchestrator.set_model(replacement);
        }

        self.persist();
        Ok(models)
    }

    /// Probes the server version and updates the connection indicator.
    pub async fn check_connection(&self) -> ConnectionStatus {
        let backend = self.orchestrator.backend();
        match backend.version().await {
            Ok(version) => {
                let status = ConnectionStatus::Connected {
                    version: Some(version),
                };
                self.orchestrator.status().set_connection(status.clone());
                status
            }
            Err(e) => {
                self.record_connection_failure(&e);
                self.orchestrator.status().connection()
            }
        }
    }

    fn record_connection_failure(&self, error: &ModelError) {
        let status = match error {
            ModelError::Unreachable(reason) => ConnectionStatus::Disconnected(reason.clone()),
            other => ConnectionStatus::Error(other.to_string()),
        };
        self.orchestrator.status().set_connection(status);
    }

    // ========================================================================
    // Settings
    // ========================================================================

    pub fn set_enabled(&self, enabled: bool) {
        self.config.borrow_mut().enabled = enabled;
        if !enabled {
            self.tracker.borrow_mut().clear();
        }
        info!(enabled, "rewriter toggled");
        self.persist();
    }

    pub fn set_model(&self, model: &str) {
        self.stored.borrow_mut().selected_model = None;
        self.config.borrow_mut().selected_model = model.to_string();
        self.orchestrator.set_model(model);
        self.persist();
    }

    /// Points the rewriter at another server. The connection state is reset
    /// until the new server has been probed.
    pub fn set_endpoint(&self, endpoint: &str) {
        self.stored.borrow_mut().endpoint_url = None;
        self.config.borrow_mut().endpoint_url = endpoint.to_string();
        self.orchestrator
            .set_backend((self.backend_factory)(endpoint));
        self.orchestrator
            .status()
            .set_connection(ConnectionStatus::Unknown);
        self.persist();
    }

    pub fn set_debug(&self, debug: bool) {
        self.config.borrow_mut().debug = debug;
        self.sync_tracer();
        self.persist();
    }

    pub fn set_default_mode(&self, mode: &str) -> Result<(), RewriteError> {
        if !self.orchestrator.registry().contains(mode) {
            return Err(RewriteError::InvalidMode(mode.to_string()));
        }
        self.config.borrow_mut().default_mode = Some(mode.to_string());
        self.orchestrator
            .registry_mut()
            .set_default_mode(Some(mode.to_string()));
        self.persist();
        Ok(())
    }

    /// Registers a custom mode under a fresh `custom_<slug>` key.
    pub fn add_custom_mode(
        &self,
        name: &str,
        prompt: &str,
        description: Option<&str>,
    ) -> Result<RewriteMode, ModeError> {
        let mut registry = self.orchestrator.registry_mut();
        let key = registry.unique_custom_key(name);
        let mut mode = RewriteMode::custom(&key, name, prompt);
        if let Some(description) = description {
            mode = mode.with_description(description);
        }
        registry.add_custom(mode.clone())?;
        Ok(mode)
    }

    /// Saves the settings, keeping stored values under session overrides.
    fn persist(&self) {
        let mut saved = self.config.borrow().clone();
        let stored = self.stored.borrow();
        if let Some(endpoint) = &stored.endpoint_url {
            saved.endpoint_url = endpoint.clone();
        }
        if let Some(model) = &stored.selected_model {
            saved.selected_model = model.clone();
        }
        saved.save_or_warn(self.store.as_ref());
    }

    fn sync_tracer(&self) {
        let tracer = match (&self.trace_path, self.config.borrow().debug) {
            (Some(path), true) => Some(TraceLogger::new(path)),
            _ => None,
        };
        self.orchestrator.set_tracer(tracer);
    }
}
