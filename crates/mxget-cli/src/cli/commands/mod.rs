//! CLI command handlers, one file per command.

mod completions;
mod config;
mod get;
mod probe;

pub use completions::run_completions;
pub use config::run_config;
pub use get::run_get;
pub use probe::run_probe;
