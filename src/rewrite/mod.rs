pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod single_flight;
pub mod site_context;
