pub mod cli;
pub mod config;
pub mod evaluator;
pub mod logging;
pub mod orchestrator;
pub mod permission;
pub mod protocol;
pub mod search_path;
pub mod server;
pub mod status;
pub mod types;
