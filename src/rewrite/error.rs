use thiserror::Error;

use crate::model::error::ModelError;

/// Every way a rewrite can fail. None of these leave the field modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewriteError {
    #[error("element is not an editable text field")]
    NotEditable,

    #[error("element is no longer attached to the page")]
    Detached,

    #[error("no text to rewrite")]
    EmptySource,

    #[error("a rewrite is already in progress")]
    AlreadyInFlight,

    #[error("unknown rewrite mode '{0}'")]
    InvalidMode(String),

    #[error("the rewriter is disabled")]
    Disabled,

    #[error("model server unreachable: {0}")]
    EndpointUnreachable(String),

    #[error("model server error (HTTP {status}): {message}")]
    EndpointError { status: u16, message: String },

    #[error("unexpected response from model server: {0}")]
    MalformedResponse(String),

    #[error("model returned an empty rewrite")]
    EmptyResponse,
}

impl From<ModelError> for RewriteError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Unreachable(msg) => RewriteError::EndpointUnreachable(msg),
            ModelError::Status { status, message } => {
                RewriteError::EndpointError { status, message }
            }
            ModelError::Malformed(msg) => RewriteError::MalformedResponse(msg),
        }
    }
}

impl RewriteError {
    /// Whether this failure says something about the model server's health.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            RewriteError::EndpointUnreachable(_) | RewriteError::EndpointError { .. }
        )
    }
}
