//! Client for the in-process runtime, reached through `lada-server`

use async_trait::async_trait;
use lada_config::{EngineConfig, EngineName};
use tracing::warn;

use super::http::DaemonTransport;
use crate::{
    error::Result,
    models::{GenerationConfig, LlmResponse},
    provider::LlmClient,
};

/// Client for the runtime adaptation server
///
/// The server speaks the Ollama wire format, so requests look the same as
/// [`OllamaClient`](super::OllamaClient) requests. The server loads the
/// requested model on demand, evicting whichever model was resident.
#[derive(Debug, Clone)]
pub struct MlxClient {
    model: String,
    transport: DaemonTransport,
}

impl MlxClient {
    pub fn new(model: impl Into<String>, host: &str, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            model: model.into(),
            transport: DaemonTransport::new(EngineName::Mlx, host, timeout_secs)?,
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
impl LlmClient for MlxClient {
    fn engine(&self) -> EngineName {
        EngineName::Mlx
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        self.transport.host()
    }

    async fn is_available(&self) -> bool {
        let available = self.transport.probe("/health").await;
        if !available {
            warn!("Runtime server is not available at {}", self.transport.host());
        }
        available
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        self.transport.model_names().await
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<LlmResponse> {
        self.transport.generate(&self.model, prompt, config).await
    }
}
