//! Core configuration types and data structures

use std::{collections::BTreeMap, fmt, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ConfigError, Result},
    migration::CURRENT_VERSION,
};

/// Default model used by every mode when no override is configured
pub const DEFAULT_MODEL: &str = "codellama:7b";

/// Default Ollama daemon address
pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";

/// Default address of the runtime adaptation server
pub const DEFAULT_MLX_HOST: &str = "http://localhost:8000";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const DEFAULT_MAX_RETRIES: u32 = 3;

/// A backend family that can serve generation requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineName {
    /// Remote Ollama daemon
    Ollama,
    /// In-process runtime exposed through the adaptation server
    Mlx,
}

impl EngineName {
    /// Every registered engine
    pub const ALL: [EngineName; 2] = [EngineName::Ollama, EngineName::Mlx];

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineName::Ollama => "ollama",
            EngineName::Mlx => "mlx",
        }
    }

    /// Connection parameters used when the config file has no entry for this engine
    pub fn default_engine_config(&self) -> EngineConfig {
        match self {
            EngineName::Ollama => EngineConfig::new(DEFAULT_OLLAMA_HOST),
            EngineName::Mlx => EngineConfig::new(DEFAULT_MLX_HOST),
        }
    }
}

impl fmt::Display for EngineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineName {
    type Err = ConfigError;

    /// Exact, case-sensitive match against the registered names
    fn from_str(s: &str) -> Result<Self> {
        EngineName::ALL
            .into_iter()
            .find(|engine| engine.as_str() == s)
            .ok_or_else(|| ConfigError::invalid("engine", format!("unknown engine '{}'", s)))
    }
}

/// Command mode a model is selected for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Chat,
    Plan,
    Code,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Chat, Mode::Plan, Mode::Code];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Chat => "chat",
            Mode::Plan => "plan",
            Mode::Code => "code",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(Mode::Chat),
            "plan" => Ok(Mode::Plan),
            "code" => Ok(Mode::Code),
            other => Err(ConfigError::invalid(
                "mode",
                format!("unknown mode '{}', expected chat, plan or code", other),
            )),
        }
    }
}

/// Connection parameters for one engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineConfig {
    /// Base URL of the engine's HTTP endpoint
    pub host: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Retry budget; carried for the command layer, the clients do not retry
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Free-form engine-specific parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_params: BTreeMap<String, serde_json::Value>,
}

impl EngineConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            extra_params: BTreeMap::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_engines() -> BTreeMap<EngineName, EngineConfig> {
    EngineName::ALL
        .into_iter()
        .map(|engine| (engine, engine.default_engine_config()))
        .collect()
}

/// Model selection and engine connection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// Model identifier used by the chat command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_model: Option<String>,
    /// Model identifier used by the plan command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_model: Option<String>,
    /// Model identifier used by the code command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_model: Option<String>,
    /// Fallback identifier for any mode without an override
    pub default_model: String,
    /// Legacy single-engine host, kept for v1 files
    pub ollama_host: String,
    /// Per-engine connection parameters
    pub engines: BTreeMap<EngineName, EngineConfig>,
    /// Global request timeout in seconds
    pub timeout: u64,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            chat_model: None,
            plan_model: None,
            code_model: None,
            default_model: DEFAULT_MODEL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            engines: default_engines(),
            timeout: DEFAULT_TIMEOUT_SECS,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl ModelConfig {
    /// Model identifier for a mode, falling back to `default_model`
    pub fn get_model_for_mode(&self, mode: Mode) -> &str {
        let configured = match mode {
            Mode::Chat => self.chat_model.as_deref(),
            Mode::Plan => self.plan_model.as_deref(),
            Mode::Code => self.code_model.as_deref(),
        };
        configured
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(&self.default_model)
    }

    /// Explicitly configured parameters for an engine
    pub fn get_engine_config(&self, engine: EngineName) -> Option<&EngineConfig> {
        self.engines.get(&engine)
    }

    /// Parameters for an engine, synthesised from legacy fields when absent
    pub fn engine_config(&self, engine: EngineName) -> EngineConfig {
        if let Some(config) = self.engines.get(&engine) {
            return config.clone();
        }
        match engine {
            EngineName::Ollama => {
                EngineConfig::new(self.ollama_host.clone()).with_timeout(self.timeout)
            }
            EngineName::Mlx => engine.default_engine_config(),
        }
    }
}

/// Root configuration object, one per project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LadaConfig {
    /// Schema version of the persisted file
    pub version: u32,
    pub model: ModelConfig,
    pub session_dir: PathBuf,
    pub plan_dir: PathBuf,
    pub backup_dir: PathBuf,
    pub auto_save: bool,
    /// Auto-save interval in seconds
    pub auto_save_interval: u64,
}

impl Default for LadaConfig {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            model: ModelConfig::default(),
            session_dir: PathBuf::from(".lada/sessions"),
            plan_dir: PathBuf::from(".lada/plans"),
            backup_dir: PathBuf::from(".lada/backups"),
            auto_save: true,
            auto_save_interval: 300,
        }
    }
}

impl LadaConfig {
    /// Check every value that the registry and clients rely on
    pub fn validate(&self) -> Result<()> {
        if self.model.default_model.trim().is_empty() {
            return Err(ConfigError::invalid(
                "model.default_model",
                "default model cannot be empty",
            ));
        }
        if self.model.timeout == 0 {
            return Err(ConfigError::invalid(
                "model.timeout",
                "timeout must be greater than 0 seconds",
            ));
        }
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::invalid(
                "model.temperature",
                format!("temperature {} is outside 0.0..=2.0", self.model.temperature),
            ));
        }
        validate_host("model.ollama_host", &self.model.ollama_host)?;

        for (engine, config) in &self.model.engines {
            validate_host(&format!("model.engines.{}.host", engine), &config.host)?;
            if config.timeout == 0 {
                return Err(ConfigError::invalid(
                    format!("model.engines.{}.timeout", engine),
                    "timeout must be greater than 0 seconds",
                ));
            }
        }

        if self.auto_save && self.auto_save_interval == 0 {
            return Err(ConfigError::invalid(
                "auto_save_interval",
                "auto-save interval must be greater than 0 seconds",
            ));
        }
        Ok(())
    }
}

fn validate_host(key: &str, host: &str) -> Result<()> {
    let parsed = url::Url::parse(host)
        .map_err(|e| ConfigError::invalid(key, format!("'{}' is not a valid URL: {}", host, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ConfigError::invalid(
            key,
            format!("unsupported scheme '{}', expected http or https", scheme),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LadaConfig::default();
        assert_eq!(config.version, CURRENT_VERSION);
        assert_eq!(config.model.default_model, "codellama:7b");
        assert_eq!(config.model.engines.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_mode_fallback_to_default_model() {
        let config = ModelConfig {
            default_model: "llama2:7b".to_string(),
            ..Default::default()
        };
        for mode in Mode::ALL {
            assert_eq!(config.get_model_for_mode(mode), "llama2:7b");
        }
    }

    #[test]
    fn test_per_mode_overrides() {
        let config = ModelConfig {
            chat_model: Some("codellama:7b".to_string()),
            plan_model: Some("mlx:GLM-4.5-Air".to_string()),
            code_model: Some("deepseek-coder:6.7b".to_string()),
            ..Default::default()
        };
        assert_eq!(config.get_model_for_mode(Mode::Chat), "codellama:7b");
        assert_eq!(config.get_model_for_mode(Mode::Plan), "mlx:GLM-4.5-Air");
        assert_eq!(config.get_model_for_mode(Mode::Code), "deepseek-coder:6.7b");
    }

    #[test]
    fn test_blank_override_falls_back() {
        let config = ModelConfig {
            chat_model: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.get_model_for_mode(Mode::Chat), DEFAULT_MODEL);
    }

    #[test]
    fn test_engine_name_parsing_is_exact() {
        assert_eq!("mlx".parse::<EngineName>().unwrap(), EngineName::Mlx);
        assert_eq!("ollama".parse::<EngineName>().unwrap(), EngineName::Ollama);
        assert!("MLX".parse::<EngineName>().is_err());
        assert!("".parse::<EngineName>().is_err());
    }

    #[test]
    fn test_engine_config_synthesised_from_legacy_fields() {
        let config = ModelConfig {
            ollama_host: "http://gpu-box:11434".to_string(),
            timeout: 45,
            engines: BTreeMap::new(),
            ..Default::default()
        };
        let ollama = config.engine_config(EngineName::Ollama);
        assert_eq!(ollama.host, "http://gpu-box:11434");
        assert_eq!(ollama.timeout, 45);
        assert_eq!(config.engine_config(EngineName::Mlx).host, DEFAULT_MLX_HOST);
    }

    #[test]
    fn test_validate_rejects_bad_engine_host() {
        let mut config = LadaConfig::default();
        config
            .model
            .engines
            .insert(EngineName::Mlx, EngineConfig::new("localhost:8000"));
        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("model.engines.mlx.host"));
    }

    #[test]
    fn test_validate_rejects_empty_default_model() {
        let mut config = LadaConfig::default();
        config.model.default_model = String::new();
        let err = config.validate().unwrap_err();
        assert_eq!(err.key(), Some("model.default_model"));
    }

    #[test]
    fn test_engine_config_yaml_defaults() {
        let config: EngineConfig = serde_yaml::from_str("host: http://localhost:8000\n").unwrap();
        assert_eq!(config.timeout, 120);
        assert_eq!(config.max_retries, 3);
        assert!(config.extra_params.is_empty());
    }
}
