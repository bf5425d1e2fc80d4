pub mod document;
pub mod events;
pub mod selector;
pub mod snapshot;
