//! Error types shared by every backend client

use lada_config::{ConfigError, EngineName};
use thiserror::Error;

/// Result alias for client operations
pub type Result<T> = std::result::Result<T, LlmError>;

/// Failures a caller of the registry or a backend client can observe
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LlmError {
    /// Transport could not reach the backend
    #[error("Cannot connect to {engine} at {host}: {message}")]
    Connection {
        engine: EngineName,
        host: String,
        message: String,
    },

    /// Request exceeded the configured timeout
    #[error("Request to {engine} timed out after {timeout_secs}s")]
    Timeout { engine: EngineName, timeout_secs: u64 },

    /// Requested model is not in the engine's catalogue
    #[error("Model '{model}' not found on {engine}")]
    ModelNotFound {
        engine: EngineName,
        model: String,
        available: Vec<String>,
        suggestions: Vec<String>,
    },

    /// Backend rejected the prompt as too long
    #[error("Context length exceeded: {0}")]
    ContextLengthExceeded(String),

    /// Backend replied with malformed or empty content
    #[error("Invalid response: {0}")]
    Response(String),

    /// Engine-specific failure, such as a runtime model load error
    #[error("{engine} engine error: {message}")]
    Engine {
        engine: EngineName,
        message: String,
        details: Option<String>,
    },

    /// Invalid configuration value
    #[error("Configuration error: {message}")]
    Configuration { key: Option<String>, message: String },
}

impl LlmError {
    /// Engine the failure originated from, when known
    pub fn engine(&self) -> Option<EngineName> {
        match self {
            LlmError::Connection { engine, .. }
            | LlmError::Timeout { engine, .. }
            | LlmError::ModelNotFound { engine, .. }
            | LlmError::Engine { engine, .. } => Some(*engine),
            _ => None,
        }
    }

    /// What the user can do about it
    pub fn remediation(&self) -> Option<String> {
        match self {
            LlmError::Connection { engine, .. } => Some(match engine {
                EngineName::Ollama => {
                    "Ollama is not running. Please start it with 'ollama serve'".to_string()
                }
                EngineName::Mlx => {
                    "The runtime server is not running. Please start it with 'lada-server'"
                        .to_string()
                }
            }),
            LlmError::Timeout { .. } => Some(
                "The model may still be loading; retry or raise the engine timeout".to_string(),
            ),
            LlmError::ModelNotFound {
                engine,
                model,
                available,
                suggestions,
            } => {
                let mut hint = String::new();
                if !suggestions.is_empty() {
                    hint.push_str(&format!("Did you mean: {}? ", suggestions.join(", ")));
                }
                if available.is_empty() {
                    hint.push_str("No models are available");
                } else {
                    hint.push_str(&format!("Available models: {}", available.join(", ")));
                }
                if *engine == EngineName::Ollama {
                    hint.push_str(&format!(". Pull it with 'ollama pull {}'", model));
                }
                Some(hint)
            }
            LlmError::ContextLengthExceeded(_) => {
                Some("Shorten the prompt or choose a model with a larger context".to_string())
            }
            LlmError::Configuration { key: Some(key), .. } => {
                Some(format!("Check '{}' in .lada_config.yml", key))
            }
            _ => None,
        }
    }

    /// Whether this error means the requested model does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, LlmError::ModelNotFound { .. })
    }
}

impl From<ConfigError> for LlmError {
    fn from(err: ConfigError) -> Self {
        LlmError::Configuration {
            key: err.key().map(str::to_string),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Response(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_remediation_names_the_engine() {
        let err = LlmError::Connection {
            engine: EngineName::Ollama,
            host: "http://localhost:11434".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.remediation().unwrap().contains("ollama serve"));

        let err = LlmError::Connection {
            engine: EngineName::Mlx,
            host: "http://localhost:8000".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(err.remediation().unwrap().contains("lada-server"));
    }

    #[test]
    fn test_model_not_found_lists_suggestions_and_models() {
        let err = LlmError::ModelNotFound {
            engine: EngineName::Ollama,
            model: "cdellama:7b".to_string(),
            available: vec!["codellama:7b".to_string(), "mistral".to_string()],
            suggestions: vec!["codellama:7b".to_string()],
        };
        let hint = err.remediation().unwrap();
        assert!(hint.starts_with("Did you mean: codellama:7b?"));
        assert!(hint.contains("Available models: codellama:7b, mistral"));
        assert!(err.is_not_found());
        assert_eq!(err.engine(), Some(EngineName::Ollama));
    }

    #[test]
    fn test_config_error_keeps_key_path() {
        let config_err: ConfigError = "model.nope".parse::<lada_config::ConfigKey>().unwrap_err();
        let err = LlmError::from(config_err);
        match &err {
            LlmError::Configuration { key, .. } => assert_eq!(key.as_deref(), Some("model.nope")),
            other => panic!("unexpected {:?}", other),
        }
        assert!(err.remediation().unwrap().contains("model.nope"));
    }
}
