use serde::Serialize;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::rewrite::error::RewriteError;

/// One line of the debug trace, written after every settled trigger.
#[derive(Debug, Clone, Serialize)]
pub struct RewriteTrace {
    pub timestamp_ms: u128,

    pub element_key: String,
    pub mode: String,
    pub model: String,

    pub outcome: String,
    pub error: Option<String>,

    pub prompt_chars: usize,
    pub response_chars: Option<usize>,
}

impl RewriteTrace {
    pub fn now(element_key: &str, mode: &str, model: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            element_key: element_key.to_string(),
            mode: mode.to_string(),
            model: model.to_string(),
            outcome: "pending".to_string(),
            error: None,
            prompt_chars: 0,
            response_chars: None,
        }
    }

    pub fn with_prompt(mut self, prompt: &str) -> Self {
        self.prompt_chars = prompt.chars().count();
        self
    }

    pub fn applied(mut self, response: &str, applied: bool) -> Self {
        self.outcome = if applied { "applied" } else { "discarded" }.to_string();
        self.response_chars = Some(response.chars().count());
        self
    }

    pub fn failed(mut self, error: &RewriteError) -> Self {
        self.outcome = "failed".to_string();
        self.error = Some(error.to_string());
        self
    }
}
