pub mod app;
pub mod cli;
pub mod config;
pub mod dom;
pub mod field;
pub mod model;
pub mod modes;
pub mod rewrite;
pub mod status;
pub mod store;
pub mod trace;
