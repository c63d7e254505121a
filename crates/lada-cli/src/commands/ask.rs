// One-shot prompt

use std::{path::PathBuf, sync::Arc};

use lada_config::{Mode, ModelConfig};
use lada_local_models::{default_cache_root, CandleRuntime, LocalClient, ModelRuntime, RuntimeWrapper};
use lada_providers::{
    ensure_model_available, ClientOverrides, GenerationConfig, LlmClient, LlmResponse,
    ModelRegistry,
};
use tracing::debug;

use super::{open_config, Command};
use crate::{
    error::{CliError, CliResult},
    output::OutputStyle,
};

/// Resolve a model, check it is served, generate once and print the reply
pub struct AskCommand {
    config_path: Option<PathBuf>,
    prompt: String,
    model: Option<String>,
    mode: Mode,
    overrides: ClientOverrides,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    in_process: bool,
    runtime: Option<Arc<dyn ModelRuntime>>,
    cache_dir: Option<PathBuf>,
    stats: bool,
}

impl AskCommand {
    pub fn new(config_path: Option<PathBuf>, prompt: impl Into<String>) -> Self {
        Self {
            config_path,
            prompt: prompt.into(),
            model: None,
            mode: Mode::Chat,
            overrides: ClientOverrides::default(),
            max_tokens: None,
            temperature: None,
            in_process: false,
            runtime: None,
            cache_dir: None,
            stats: false,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    pub fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_host(mut self, host: Option<String>) -> Self {
        self.overrides.host = host;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<u64>) -> Self {
        self.overrides.timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_in_process(mut self, in_process: bool) -> Self {
        self.in_process = in_process;
        self
    }

    /// Runtime used with `--in-process` instead of candle
    pub fn with_runtime(mut self, runtime: Arc<dyn ModelRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    /// Print token counts and timing after the reply
    pub fn with_stats(mut self, stats: bool) -> Self {
        self.stats = stats;
        self
    }

    /// Identifier to use: `--model`, else the model configured for the mode
    pub fn identifier(&self, config: &ModelConfig) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| config.get_model_for_mode(self.mode).to_string())
    }

    /// Sampling settings from flags, falling back to the configuration
    pub fn generation_config(&self, config: &ModelConfig) -> GenerationConfig {
        let generation =
            GenerationConfig::default().with_temperature(self.temperature.unwrap_or(config.temperature));
        match self.max_tokens.or(config.max_tokens) {
            Some(max_tokens) => generation.with_max_tokens(max_tokens),
            None => generation,
        }
    }

    fn client(&self, registry: &ModelRegistry, identifier: &str) -> CliResult<Box<dyn LlmClient>> {
        if !self.in_process {
            return Ok(registry.get_client(identifier, &self.overrides)?);
        }

        let (_, model) = registry.parse(identifier);
        let runtime: Arc<dyn ModelRuntime> = match &self.runtime {
            Some(runtime) => runtime.clone(),
            None => Arc::new(CandleRuntime::default()),
        };
        let cache_dir = self.cache_dir.clone().unwrap_or_else(default_cache_root);
        debug!("Running '{}' in process, cache at {}", model, cache_dir.display());
        let wrapper = RuntimeWrapper::new(runtime).with_cache_dir(cache_dir);
        Ok(Box::new(LocalClient::new(wrapper, model)))
    }

    /// Resolve, check and generate without printing
    pub async fn run(&self) -> CliResult<LlmResponse> {
        if self.prompt.trim().is_empty() {
            return Err(CliError::invalid_argument("prompt cannot be empty"));
        }
        let manager = open_config(self.config_path.as_deref())?;
        let model_config = &manager.config().model;
        let registry = ModelRegistry::from_config(model_config);

        let identifier = self.identifier(model_config);
        let client = self.client(&registry, &identifier)?;
        debug!(
            "Asking {} model '{}' at {}",
            client.engine(),
            client.model(),
            client.host()
        );

        ensure_model_available(client.as_ref()).await?;
        let response = client
            .generate(&self.prompt, &self.generation_config(model_config))
            .await?;
        Ok(response)
    }
}

#[async_trait::async_trait]
impl Command for AskCommand {
    async fn execute(&self) -> CliResult<()> {
        let response = self.run().await?;
        println!("{}", response.content);

        if self.stats {
            let style = OutputStyle::default();
            let metadata = &response.metadata;
            println!(
                "{}",
                style.dimmed(&format!(
                    "{}: {} prompt + {} completion tokens in {:.2}s",
                    metadata.model_name,
                    metadata.prompt_tokens,
                    metadata.completion_tokens,
                    metadata.generation_time_secs
                ))
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_falls_back_to_mode_model() {
        let mut config = ModelConfig::default();
        config.plan_model = Some("mlx:Qwen2.5-3B-Instruct".to_string());

        let ask = AskCommand::new(None, "hi").with_mode(Mode::Plan);
        assert_eq!(ask.identifier(&config), "mlx:Qwen2.5-3B-Instruct");

        let ask = ask.with_model(Some("mistral".to_string()));
        assert_eq!(ask.identifier(&config), "mistral");
    }

    #[tokio::test]
    async fn test_blank_prompt_is_rejected() {
        let err = AskCommand::new(None, "  ").run().await.unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument { .. }));
    }

    #[test]
    fn test_generation_config_prefers_flags() {
        let mut config = ModelConfig::default();
        config.temperature = 0.2;
        config.max_tokens = Some(256);

        let generation = AskCommand::new(None, "hi").generation_config(&config);
        assert_eq!(generation.temperature, 0.2);
        assert_eq!(generation.max_tokens, 256);

        let generation = AskCommand::new(None, "hi")
            .with_temperature(Some(1.0))
            .with_max_tokens(Some(16))
            .generation_config(&config);
        assert_eq!(generation.temperature, 1.0);
        assert_eq!(generation.max_tokens, 16);
    }
}
