//! Model registry: identifier parsing and client construction

use std::collections::{BTreeMap, BTreeSet};

use lada_config::{EngineConfig, EngineName, ModelConfig};
use tracing::debug;

use crate::{
    error::Result,
    provider::LlmClient,
    providers::{MlxClient, OllamaClient},
};

/// Connection settings that win over the configured ones
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClientOverrides {
    pub host: Option<String>,
    pub timeout: Option<u64>,
}

impl ClientOverrides {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn timeout(mut self, timeout: u64) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Maps model identifiers such as `mlx:GLM-4.5-Air` to ready clients
///
/// The engine table is plain data; build one per process and pass it by
/// reference. Two registries built from the same config compare equal.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRegistry {
    default_engine: EngineName,
    engines: BTreeMap<EngineName, EngineConfig>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ModelRegistry {
    /// Registry with built-in connection defaults for every engine
    pub fn new() -> Self {
        Self::from_config(&ModelConfig::default())
    }

    /// Registry using the engine settings of a loaded configuration
    pub fn from_config(config: &ModelConfig) -> Self {
        let engines = EngineName::ALL
            .into_iter()
            .map(|engine| (engine, config.engine_config(engine)))
            .collect();
        Self {
            default_engine: EngineName::Ollama,
            engines,
        }
    }

    pub fn default_engine(&self) -> EngineName {
        self.default_engine
    }

    /// Split an identifier into engine and engine-local model name
    ///
    /// Only the first colon is inspected. A prefix that is not a registered
    /// engine is kept as part of the model name.
    pub fn parse(&self, identifier: &str) -> (EngineName, String) {
        if let Some((prefix, rest)) = identifier.split_once(':') {
            if let Ok(engine) = prefix.parse::<EngineName>() {
                return (engine, rest.to_string());
            }
        }
        (self.default_engine, identifier.to_string())
    }

    /// Registered engine names
    pub fn list_engines(&self) -> BTreeSet<EngineName> {
        self.engines.keys().copied().collect()
    }

    /// Connection settings used for an engine
    pub fn engine_config(&self, engine: EngineName) -> EngineConfig {
        self.engines
            .get(&engine)
            .cloned()
            .unwrap_or_else(|| engine.default_engine_config())
    }

    /// Build the client for an identifier, applying `overrides` on top of the
    /// configured engine settings
    pub fn get_client(
        &self,
        identifier: &str,
        overrides: &ClientOverrides,
    ) -> Result<Box<dyn LlmClient>> {
        let (engine, model) = self.parse(identifier);
        let mut config = self.engine_config(engine);
        if let Some(host) = &overrides.host {
            config.host = host.clone();
        }
        if let Some(timeout) = overrides.timeout {
            config.timeout = timeout;
        }

        debug!(
            "Resolved '{}' to engine {} model '{}' at {}",
            identifier, engine, model, config.host
        );
        let client: Box<dyn LlmClient> = match engine {
            EngineName::Ollama => Box::new(OllamaClient::from_config(model, &config)?),
            EngineName::Mlx => Box::new(MlxClient::from_config(model, &config)?),
        };
        Ok(client)
    }
}
