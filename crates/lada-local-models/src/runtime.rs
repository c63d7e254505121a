//! Seam between the lifecycle wrapper and an inference backend

use std::path::Path;

use lada_providers::GenerationConfig;

use crate::{catalog::CatalogEntry, error::Result};

/// Loads catalogue entries into memory
///
/// Calls are blocking and may download weights; the wrapper runs them on the
/// blocking thread pool.
pub trait ModelRuntime: Send + Sync {
    fn load(&self, entry: &CatalogEntry, cache_dir: &Path) -> Result<Box<dyn LoadedModel>>;
}

/// A resident model and its tokenizer; dropping it releases both
pub trait LoadedModel: Send {
    /// Raw completion text; some backends echo the prompt in front of it
    fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String>;

    /// Token count of `text` under this model's tokenizer
    fn count_tokens(&self, text: &str) -> Result<usize>;
}
