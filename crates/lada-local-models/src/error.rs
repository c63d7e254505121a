//! Error types for local model operations

use lada_config::EngineName;
use lada_providers::LlmError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Errors that can occur while loading or running a local model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Model '{name}' not found. Available models: {}", .available.join(", "))]
    UnknownModel { name: String, available: Vec<String> },

    #[error("Failed to load model '{name}': {message}")]
    LoadFailed { name: String, message: String },

    #[error("No model loaded. Load a model first.")]
    NoModelLoaded,

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Runtime task failed: {0}")]
    Task(String),
}

impl RuntimeError {
    /// Unknown names and failed loads are reported as a missing model
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            RuntimeError::UnknownModel { .. } | RuntimeError::LoadFailed { .. }
        )
    }
}

impl From<tokio::task::JoinError> for RuntimeError {
    fn from(err: tokio::task::JoinError) -> Self {
        RuntimeError::Task(err.to_string())
    }
}

impl From<RuntimeError> for LlmError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::UnknownModel { name, available } => {
                let suggestions = lada_providers::suggest_models(&name, &available);
                LlmError::ModelNotFound {
                    engine: EngineName::Mlx,
                    model: name,
                    available,
                    suggestions,
                }
            }
            other => LlmError::Engine {
                engine: EngineName::Mlx,
                message: other.to_string(),
                details: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_model_message_lists_catalogue() {
        let err = RuntimeError::UnknownModel {
            name: "Nope".to_string(),
            available: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(err.to_string(), "Model 'Nope' not found. Available models: A, B");
        assert!(err.is_not_found());
        assert!(!RuntimeError::NoModelLoaded.is_not_found());
    }

    #[test]
    fn test_conversion_to_client_error() {
        let err: LlmError = RuntimeError::UnknownModel {
            name: "Qwen2.5-3B-Instrct".to_string(),
            available: vec!["Qwen2.5-3B-Instruct".to_string()],
        }
        .into();
        match err {
            LlmError::ModelNotFound { suggestions, .. } => {
                assert_eq!(suggestions, vec!["Qwen2.5-3B-Instruct".to_string()])
            }
            other => panic!("unexpected {:?}", other),
        }

        let err: LlmError = RuntimeError::NoModelLoaded.into();
        assert!(matches!(err, LlmError::Engine { engine: EngineName::Mlx, .. }));
    }
}
