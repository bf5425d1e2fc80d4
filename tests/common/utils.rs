use std::cell::RefCell;
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::oneshot;

use smart_rewriter::dom::document::{Document, NodeId};
use smart_rewriter::model::backend::ModelBackend;
use smart_rewriter::model::error::ModelError;
use smart_rewriter::modes::registry::{ModeRegistry, RewriteMode};
use smart_rewriter::rewrite::orchestrator::RewriteOrchestrator;
use smart_rewriter::status::MemoryNotifier;
use smart_rewriter::store::MemoryStore;

/// Appends `<tag attrs...>` to `parent`.
pub fn element(doc: &mut Document, parent: NodeId, tag: &str, attrs: &[(&str, &str)]) -> NodeId {
    let node = doc.create_element(tag);
    for (name, value) in attrs {
        doc.set_attribute(node, name, value);
    }
    doc.append_child(parent, node);
    node
}

/// A page with one `<textarea id=...>` holding `text`.
pub fn textarea_page(id: &str, text: &str) -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.body();
    let area = element(&mut doc, body, "textarea", &[("id", id)]);
    doc.set_value(area, text);
    (doc, area)
}

/// Two modes with short templates, `casual` first.
pub fn test_modes() -> Vec<RewriteMode> {
    vec![
        RewriteMode::builtin("casual", "Casual", "Rewrite casually:"),
        RewriteMode::builtin("academic", "Academic", "Rewrite formally:"),
    ]
}

pub struct Harness {
    pub orchestrator: RewriteOrchestrator,
    pub notifier: Rc<MemoryNotifier>,
    pub store: Rc<MemoryStore>,
}

pub fn harness(backend: Rc<dyn ModelBackend>) -> Harness {
    let store = Rc::new(MemoryStore::new());
    let notifier = Rc::new(MemoryNotifier::new());
    let registry = ModeRegistry::with_builtins(
        test_modes(),
        store.clone(),
        Some("casual".to_string()),
    );
    let orchestrator = RewriteOrchestrator::new(backend, registry, notifier.clone(), "llama3");
    Harness {
        orchestrator,
        notifier,
        store,
    }
}

/// Holds its first `generate` call open until the paired sender fires.
/// Later calls answer immediately.
pub struct GatedBackend {
    gate: RefCell<Option<oneshot::Receiver<()>>>,
    reply: String,
    calls: RefCell<usize>,
}

impl GatedBackend {
    pub fn new(reply: &str) -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        let backend = Self {
            gate: RefCell::new(Some(rx)),
            reply: reply.to_string(),
            calls: RefCell::new(0),
        };
        (tx, backend)
    }

    pub fn calls(&self) -> usize {
        *self.calls.borrow()
    }
}

#[async_trait(?Send)]
impl ModelBackend for GatedBackend {
    async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ModelError> {
        *self.calls.borrow_mut() += 1;
        let gate = self.gate.borrow_mut().take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        Ok(self.reply.clone())
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        Ok(vec!["llama3".to_string()])
    }

    async fn version(&self) -> Result<String, ModelError> {
        Ok("gated".to_string())
    }
}

pub fn cell(doc: Document) -> RefCell<Document> {
    RefCell::new(doc)
}
