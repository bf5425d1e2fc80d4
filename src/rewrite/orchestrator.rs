use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tracing::{debug, info, warn};

use crate::dom::document::{Document, NodeId};
use crate::field::{accessor, classifier, identity};
use crate::model::backend::ModelBackend;
use crate::modes::registry::{ModeRegistry, RewriteMode};
use crate::rewrite::error::RewriteError;
use crate::rewrite::prompt::RewriteRequest;
use crate::rewrite::single_flight::SingleFlight;
use crate::rewrite::site_context::{SiteContext, SiteContextExtractor};
use crate::status::{ConnectionStatus, Notification, Notifier, StatusBoard};
use crate::trace::logger::TraceLogger;
use crate::trace::trace::RewriteTrace;

/// Result of a settled rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub element_key: String,
    pub mode: String,
    pub text: String,
    /// `false` when the field left the page while the model was generating;
    /// the response was dropped and nothing was recorded.
    pub applied: bool,
}

/// Drives one rewrite from trigger to write-back.
pub struct RewriteOrchestrator {
    backend: RefCell<Rc<dyn ModelBackend>>,
    registry: RefCell<ModeRegistry>,
    sites: SiteContextExtractor,
    flight: SingleFlight,
    status: StatusBoard,
    notifier: Rc<dyn Notifier>,
    model: RefCell<String>,
    tracer: RefCell<Option<TraceLogger>>,
}

impl RewriteOrchestrator {
    pub fn new(
        backend: Rc<dyn ModelBackend>,
        registry: ModeRegistry,
        notifier: Rc<dyn Notifier>,
        model: &str,
    ) -> Self {
        Self {
            backend: RefCell::new(backend),
            registry: RefCell::new(registry),
            sites: SiteContextExtractor::builtin(),
            flight: SingleFlight::new(),
            status: StatusBoard::new(),
            notifier,
            model: RefCell::new(model.to_string()),
            tracer: RefCell::new(None),
        }
    }

    pub fn with_sites(mut self, sites: SiteContextExtractor) -> Self {
        self.sites = sites;
        self
    }

    pub fn set_tracer(&self, tracer: Option<TraceLogger>) {
        *self.tracer.borrow_mut() = tracer;
    }

    /// Takes effect for the next request; one already in flight keeps the
    /// backend it started with.
    pub fn set_backend(&self, backend: Rc<dyn ModelBackend>) {
        *self.backend.borrow_mut() = backend;
    }

    pub fn backend(&self) -> Rc<dyn ModelBackend> {
        Rc::clone(&self.backend.borrow())
    }

    pub fn model(&self) -> String {
        self.model.borrow().clone()
    }

    pub fn set_model(&self, model: &str) {
        *self.model.borrow_mut() = model.to_string();
    }

    pub fn registry(&self) -> Ref<'_, ModeRegistry> {
        self.registry.borrow()
    }

    pub fn registry_mut(&self) -> RefMut<'_, ModeRegistry> {
        self.registry.borrow_mut()
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    pub fn notifier(&self) -> &dyn Notifier {
        self.notifier.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.flight.is_busy()
    }

    /// Rewrites `element` in place.
    ///
    /// The document is only borrowed around reads and the final write, never
    /// across the model call, so the host can keep mutating it meanwhile.
    /// Every failure is reported through the notifier and leaves the field
    /// untouched.
    pub async fn trigger(
        &self,
        doc: &RefCell<Document>,
        element: NodeId,
        mode_override: Option<&str>,
    ) -> Result<RewriteOutcome, RewriteError> {
        let result = self.run_trigger(doc, element, mode_override).await;
        self.report(&result);
        result
    }

    async fn run_trigger(
        &self,
        doc: &RefCell<Document>,
        element: NodeId,
        mode_override: Option<&str>,
    ) -> Result<RewriteOutcome, RewriteError> {
        let request = {
            let doc = doc.borrow();
            self.prepare(&doc, element, mode_override)?
        };

        let Some(_guard) = self.flight.try_acquire() else {
            debug!(element_key = %request.element_key, "rejecting trigger, rewrite in flight");
            return Err(RewriteError::AlreadyInFlight);
        };

        let model = self.model();
        let prompt = request.prompt();
        let trace = RewriteTrace::now(&request.element_key, &request.mode.key, &model)
            .with_prompt(&prompt);

        debug!(
            element_key = %request.element_key,
            mode = %request.mode.key,
            model = %model,
            "sending rewrite request"
        );

        let backend = self.backend();
        let generated = match backend.generate(&model, &prompt).await {
            Ok(text) => text,
            Err(e) => {
                let err = RewriteError::from(e);
                self.trace(trace.failed(&err));
                return Err(err);
            }
        };

        let text = generated.trim().to_string();
        if text.is_empty() {
            let err = RewriteError::EmptyResponse;
            self.trace(trace.failed(&err));
            return Err(err);
        }

        let applied = accessor::write(&mut doc.borrow_mut(), element, &text);
        if applied {
            let recorded = self
                .registry
                .borrow_mut()
                .record_usage(&request.element_key, &request.mode.key);
            if let Err(e) = recorded {
                warn!("could not persist last-used mode: {}", e);
            }
        } else {
            info!(element_key = %request.element_key, "field left the page, discarding rewrite");
        }

        self.trace(trace.applied(&text, applied));

        Ok(RewriteOutcome {
            element_key: request.element_key,
            mode: request.mode.key,
            text,
            applied,
        })
    }

    /// Validates the element and gathers everything the model call needs.
    fn prepare(
        &self,
        doc: &Document,
        element: NodeId,
        mode_override: Option<&str>,
    ) -> Result<RewriteRequest, RewriteError> {
        if !classifier::is_editable(doc, element) {
            return Err(RewriteError::NotEditable);
        }
        if !doc.is_connected(element) {
            return Err(RewriteError::Detached);
        }

        let original_text = accessor::read(doc, element);
        if original_text.trim().is_empty() {
            return Err(RewriteError::EmptySource);
        }

        let element_key = identity::key_for(doc, element);
        let mode = self.resolve_mode(&element_key, mode_override)?;

        let context = match doc.url() {
            Some(url) => self.sites.extract_context(doc, url),
            None => SiteContext::default(),
        };

        Ok(RewriteRequest {
            element_key,
            original_text,
            mode,
            context_text: context.context_text().map(str::to_string),
            character_limit: context.character_limit,
        })
    }

    fn resolve_mode(
        &self,
        element_key: &str,
        mode_override: Option<&str>,
    ) -> Result<RewriteMode, RewriteError> {
        let registry = self.registry.borrow();
        let key = match mode_override {
            Some(key) => key.to_string(),
            None => registry.last_used_for(element_key),
        };
        registry
            .get(&key)
            .cloned()
            .map_err(|_| RewriteError::InvalidMode(key))
    }

    fn report(&self, result: &Result<RewriteOutcome, RewriteError>) {
        match result {
            Ok(outcome) if outcome.applied => {
                self.status.mark_connected();
                let name = self
                    .registry
                    .borrow()
                    .get(&outcome.mode)
                    .map(|m| m.display_name.clone())
                    .unwrap_or_else(|_| outcome.mode.clone());
                self.notifier
                    .notify(&Notification::success(format!("Rewritten ({})", name)));
            }
            Ok(_) => {
                self.status.mark_connected();
                self.notifier.notify(&Notification::info(
                    "The field is gone; rewrite discarded",
                ));
            }
            Err(err) => {
                match err {
                    RewriteError::EndpointUnreachable(reason) => self
                        .status
                        .set_connection(ConnectionStatus::Disconnected(reason.clone())),
                    RewriteError::EndpointError { .. } => self
                        .status
                        .set_connection(ConnectionStatus::Error(err.to_string())),
                    // The server answered, so it is up.
                    RewriteError::MalformedResponse(_) | RewriteError::EmptyResponse => {
                        self.status.mark_connected()
                    }
                    _ => {}
                }
                let notification = match err {
                    RewriteError::AlreadyInFlight => Notification::info(err.to_string()),
                    _ => Notification::error(err.to_string()),
                };
                self.notifier.notify(&notification);
            }
        }
    }

    fn trace(&self, event: RewriteTrace) {
        if let Some(tracer) = self.tracer.borrow().as_ref() {
            tracer.log(&event);
        }
    }
}
