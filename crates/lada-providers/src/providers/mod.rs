//! Concrete backend clients

mod http;
pub mod mlx;
pub mod ollama;

pub use mlx::MlxClient;
pub use ollama::OllamaClient;
