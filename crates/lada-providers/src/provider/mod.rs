//! Client trait every engine implements

use async_trait::async_trait;
use lada_config::EngineName;

use crate::{
    error::Result,
    models::{GenerationConfig, LlmResponse},
};

/// Core trait that all backend clients must implement
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Engine this client talks to
    fn engine(&self) -> EngineName;

    /// Engine-local model name requests are sent for
    fn model(&self) -> &str;

    /// Base URL of the backend
    fn host(&self) -> &str;

    /// Liveness probe; transport failures are reported as `false`
    async fn is_available(&self) -> bool;

    /// Engine-local model names, without engine prefix
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Single-shot, non-streaming generation
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<LlmResponse>;
}
