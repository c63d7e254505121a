//! LADA backend clients
//!
//! Routes model identifiers such as `codellama:7b` or `mlx:Qwen2.5-3B-Instruct`
//! to the engine that serves them and exposes every engine through the
//! [`LlmClient`] trait.

pub mod error;
pub mod models;
pub mod preflight;
pub mod provider;
pub mod providers;
pub mod registry;
pub mod wire;

pub use error::{LlmError, Result};
pub use models::{GenerationConfig, LlmResponse, ResponseMetadata};
pub use preflight::{ensure_model_available, suggest_models};
pub use provider::LlmClient;
pub use providers::{MlxClient, OllamaClient};
pub use registry::{ClientOverrides, ModelRegistry};
