//! LADA Configuration Management
//!
//! Loads, validates, migrates and saves the project configuration file
//! (`.lada_config.yml`). The file is versioned; older schemas are migrated
//! in memory on load and a backup of the migrated data is written next to it.

pub mod error;
pub mod key;
pub mod manager;
pub mod migration;
pub mod types;

pub use error::{ConfigError, Result};
pub use key::ConfigKey;
pub use manager::ConfigManager;
pub use migration::{migrate, needs_migration, CURRENT_VERSION};
pub use types::{EngineConfig, EngineName, LadaConfig, Mode, ModelConfig};
