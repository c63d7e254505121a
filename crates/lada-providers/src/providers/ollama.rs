//! Ollama daemon client
//!
//! Talks to a running `ollama serve` instance over its HTTP API.

use async_trait::async_trait;
use lada_config::{EngineConfig, EngineName};
use tracing::{debug, warn};

use super::http::DaemonTransport;
use crate::{
    error::Result,
    models::{GenerationConfig, LlmResponse},
    provider::LlmClient,
};

/// Client for the remote Ollama daemon
#[derive(Debug, Clone)]
pub struct OllamaClient {
    model: String,
    transport: DaemonTransport,
}

impl OllamaClient {
    pub fn new(model: impl Into<String>, host: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            transport: DaemonTransport::new(EngineName::Ollama, host, timeout_secs)?,
        })
    }

    pub fn from_config(model: impl Into<String>, config: &EngineConfig) -> Result<Self> {
        Self::new(model, &config.host, config.timeout)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.transport.timeout_secs()
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    fn engine(&self) -> EngineName {
        EngineName::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        self.transport.host()
    }

    async fn is_available(&self) -> bool {
        let available = self.transport.probe("/api/tags").await;
        if !available {
            warn!("Ollama is not available at {}", self.transport.host());
        }
        available
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        let models = self.transport.model_names().await?;
        debug!("Fetched {} models from Ollama", models.len());
        Ok(models)
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<LlmResponse> {
        self.transport.generate(&self.model, prompt, config).await
    }
}
