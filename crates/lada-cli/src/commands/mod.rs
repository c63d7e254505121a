// Command handlers for the lada CLI

pub mod ask;
pub mod config;
pub mod engines;
pub mod init;
pub mod models;

pub use ask::AskCommand;
pub use config::{ConfigAction, ConfigCommand};
pub use engines::EnginesCommand;
pub use init::InitCommand;
pub use models::ModelsCommand;

use std::path::Path;

use lada_config::ConfigManager;

use crate::error::CliResult;

/// Trait for command handlers
#[async_trait::async_trait]
pub trait Command: Send + Sync {
    /// Execute the command
    async fn execute(&self) -> CliResult<()>;
}

/// Open the configuration at `path`, or the default file in the working directory
pub(crate) fn open_config(path: Option<&Path>) -> CliResult<ConfigManager> {
    let manager = match path {
        Some(path) => ConfigManager::with_path(path)?,
        None => ConfigManager::new()?,
    };
    Ok(manager)
}
