//! [`LlmClient`] over a wrapper in the same process

use async_trait::async_trait;
use lada_config::EngineName;
use lada_providers::{GenerationConfig, LlmClient, LlmResponse, Result};

use crate::wrapper::RuntimeWrapper;

/// Drives a [`RuntimeWrapper`] directly instead of going through `lada-server`
#[derive(Debug, Clone)]
pub struct LocalClient {
    wrapper: RuntimeWrapper,
    model: String,
}

impl LocalClient {
    pub fn new(wrapper: RuntimeWrapper, model: impl Into<String>) -> Self {
        Self {
            wrapper,
            model: model.into(),
        }
    }

    pub fn wrapper(&self) -> &RuntimeWrapper {
        &self.wrapper
    }
}

#[async_trait]
impl LlmClient for LocalClient {
    fn engine(&self) -> EngineName {
        EngineName::Mlx
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn host(&self) -> &str {
        "in-process"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(self.wrapper.list_models())
    }

    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<LlmResponse> {
        let response = self
            .wrapper
            .generate_with_model(&self.model, prompt, config)
            .await?;
        Ok(response)
    }
}
