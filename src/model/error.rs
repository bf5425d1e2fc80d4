use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Connection refused, DNS failure, or a timeout.
    #[error("model endpoint unreachable: {0}")]
    Unreachable(String),

    /// The server answered with a non-2xx status.
    #[error("model endpoint returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// 2xx, but the body could not be interpreted.
    #[error("malformed response from model endpoint: {0}")]
    Malformed(String),
}
