pub mod backend;
pub mod error;
pub mod ollama;
pub mod response;
