//! CLI command handlers.

use std::path::PathBuf;

use amem_config::AmemConfig;

pub mod config;
pub mod repl;
pub mod run;
pub mod session;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Loaded configuration (sections may be absent).
    pub config: AmemConfig,
    /// Config files that contributed to `config`.
    pub sources: Vec<PathBuf>,
}
