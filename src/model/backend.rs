use std::cell::RefCell;

use async_trait::async_trait;

use crate::model::error::ModelError;

/// Text-generation server the rewriter talks to.
///
/// `?Send`: everything runs on the page's single event loop.
#[async_trait(?Send)]
pub trait ModelBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError>;

    async fn list_models(&self) -> Result<Vec<String>, ModelError>;

    /// Cheap liveness probe.
    async fn version(&self) -> Result<String, ModelError>;
}

// ============================================================================
// Mock Backend (for testing without Ollama)
// ============================================================================

/// Replies with a canned result and records every prompt it receives.
pub struct MockBackend {
    pub reply: Result<String, ModelError>,
    pub models: Vec<String>,
    calls: RefCell<Vec<(String, String)>>,
}

impl MockBackend {
    pub fn replying(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            models: vec!["llama3".to_string()],
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing(error: ModelError) -> Self {
        Self {
            reply: Err(error),
            models: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_models(mut self, models: &[&str]) -> Self {
        self.models = models.iter().map(|m| m.to_string()).collect();
        self
    }

    /// `(model, prompt)` pairs seen so far.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.borrow().clone()
    }
}

#[async_trait(?Send)]
impl ModelBackend for MockBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        self.calls
            .borrow_mut()
            .push((model.to_string(), prompt.to_string()));
        self.reply.clone()
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        match &self.reply {
            Err(e @ ModelError::Unreachable(_)) => Err(e.clone()),
            _ => Ok(self.models.clone()),
        }
    }

    async fn version(&self) -> Result<String, ModelError> {
        match &self.reply {
            Err(e @ ModelError::Unreachable(_)) => Err(e.clone()),
            _ => Ok("mock".to_string()),
        }
    }
}
