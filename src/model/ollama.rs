use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::config::DEFAULT_ENDPOINT;
use crate::model::backend::ModelBackend;
use crate::model::error::ModelError;
use crate::model::response::{error_message, parse_generate_body, parse_model_names, parse_version};

/// An unreachable server should fail fast; a reachable one generating a long
/// reply gets much longer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub generate: Duration,
    pub list_models: Duration,
    pub version: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(5),
            generate: Duration::from_secs(60),
            list_models: Duration::from_secs(10),
            version: Duration::from_secs(5),
        }
    }
}

pub struct OllamaBackend {
    client: reqwest::Client,
    endpoint: String,
    timeouts: Timeouts,
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

impl OllamaBackend {
    /// `endpoint` is the full generate URL, e.g.
    /// `http://localhost:11434/api/generate`.
    pub fn new(endpoint: &str) -> Self {
        Self::with_timeouts(endpoint, Timeouts::default())
    }

    pub fn with_timeouts(endpoint: &str, timeouts: Timeouts) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(timeouts.connect)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            endpoint: endpoint.to_string(),
            timeouts,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Server root: everything before the first `/api/`.
    pub fn base_url(&self) -> String {
        base_url(&self.endpoint)
    }

    async fn send(
        &self,
        request: reqwest::RequestBuilder,
        timeout: Duration,
    ) -> Result<String, ModelError> {
        let response = request
            .timeout(timeout)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;
        debug!(status = status.as_u16(), bytes = body.len(), "model endpoint replied");

        if !status.is_success() {
            return Err(ModelError::Status {
                status: status.as_u16(),
                message: error_message(&body, status.canonical_reason().unwrap_or("error")),
            });
        }
        Ok(body)
    }
}

#[async_trait(?Send)]
impl ModelBackend for OllamaBackend {
    async fn generate(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
        let request = GenerateRequest {
            model,
            prompt,
            stream: false,
        };
        debug!(model, prompt_chars = prompt.chars().count(), "POST {}", self.endpoint);
        let body = self
            .send(
                self.client.post(&self.endpoint).json(&request),
                self.timeouts.generate,
            )
            .await?;
        parse_generate_body(&body)
    }

    async fn list_models(&self) -> Result<Vec<String>, ModelError> {
        let url = format!("{}/api/tags", self.base_url());
        let body = self
            .send(self.client.get(url), self.timeouts.list_models)
            .await?;
        parse_model_names(&body)
    }

    async fn version(&self) -> Result<String, ModelError> {
        let url = format!("{}/api/version", self.base_url());
        let body = self.send(self.client.get(url), self.timeouts.version).await?;
        parse_version(&body)
    }
}

pub fn base_url(endpoint: &str) -> String {
    let root = match endpoint.find("/api/") {
        Some(idx) => &endpoint[..idx],
        None => endpoint,
    };
    root.trim_end_matches('/').to_string()
}

fn transport_error(e: reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Unreachable(format!("request timed out: {}", e))
    } else {
        ModelError::Unreachable(e.to_string())
    }
}
