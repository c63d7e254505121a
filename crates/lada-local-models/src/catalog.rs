//! Static catalogue of models the runtime can serve

use std::{
    env,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Model family, which decides how GGUF weights are interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    Llama,
    Qwen2,
    /// Full-precision safetensors shards; `weights_file` is the shard index
    Glm4,
}

/// One servable model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Friendly name clients request
    pub name: String,
    /// Hugging Face repository holding the weights
    pub model_id: String,
    /// GGUF file inside `model_id`
    pub weights_file: String,
    /// Repository the `tokenizer.json` is fetched from
    pub tokenizer_repo: String,
    pub architecture: Architecture,
}

impl CatalogEntry {
    pub fn new(
        name: &str,
        model_id: &str,
        weights_file: &str,
        tokenizer_repo: &str,
        architecture: Architecture,
    ) -> Self {
        Self {
            name: name.to_string(),
            model_id: model_id.to_string(),
            weights_file: weights_file.to_string(),
            tokenizer_repo: tokenizer_repo.to_string(),
            architecture,
        }
    }
}

/// Ordered mapping from friendly names to backend identifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Instruct models known to run on the candle backend
    pub fn builtin() -> Self {
        use Architecture::*;
        Self::new(vec![
            CatalogEntry::new(
                "Qwen2.5-0.5B-Instruct",
                "Qwen/Qwen2.5-0.5B-Instruct-GGUF",
                "qwen2.5-0.5b-instruct-q4_k_m.gguf",
                "Qwen/Qwen2.5-0.5B-Instruct",
                Qwen2,
            ),
            CatalogEntry::new(
                "Qwen2.5-1.5B-Instruct",
                "Qwen/Qwen2.5-1.5B-Instruct-GGUF",
                "qwen2.5-1.5b-instruct-q4_k_m.gguf",
                "Qwen/Qwen2.5-1.5B-Instruct",
                Qwen2,
            ),
            CatalogEntry::new(
                "Qwen2.5-3B-Instruct",
                "Qwen/Qwen2.5-3B-Instruct-GGUF",
                "qwen2.5-3b-instruct-q4_k_m.gguf",
                "Qwen/Qwen2.5-3B-Instruct",
                Qwen2,
            ),
            CatalogEntry::new(
                "Llama-3.2-1B-Instruct",
                "bartowski/Llama-3.2-1B-Instruct-GGUF",
                "Llama-3.2-1B-Instruct-Q4_K_M.gguf",
                "unsloth/Llama-3.2-1B-Instruct",
                Llama,
            ),
            CatalogEntry::new(
                "Llama-3.2-3B-Instruct",
                "bartowski/Llama-3.2-3B-Instruct-GGUF",
                "Llama-3.2-3B-Instruct-Q4_K_M.gguf",
                "unsloth/Llama-3.2-3B-Instruct",
                Llama,
            ),
            // Served by GLM-4 9B until a smaller Air checkpoint runs on candle
            CatalogEntry::new(
                "GLM-4.5-Air",
                "THUDM/glm-4-9b-chat",
                "model.safetensors.index.json",
                "THUDM/glm-4-9b-chat-hf",
                Glm4,
            ),
        ])
    }

    pub fn get(&self, name: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Friendly names in catalogue order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.name.clone()).collect()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parameter-count markers in match order, with label and byte estimate
const SIZE_BUCKETS: &[(&[&str], &str, u64)] = &[
    (&["0.5B"], "~400MB", 400_000_000),
    (&["1B"], "~800MB", 800_000_000),
    (&["1.5B"], "~1.2GB", 1_200_000_000),
    (&["3B"], "~2.4GB", 2_400_000_000),
    (&["9B", "9b"], "~7GB", 7_000_000_000),
];

fn size_bucket(name: &str) -> Option<(&'static str, u64)> {
    SIZE_BUCKETS
        .iter()
        .find(|(markers, _, _)| markers.iter().any(|marker| name.contains(marker)))
        .map(|(_, label, bytes)| (*label, *bytes))
}

/// Approximate on-disk size, e.g. `~2.4GB`, or `Unknown`
pub fn size_label(name: &str) -> &'static str {
    size_bucket(name).map(|(label, _)| label).unwrap_or("Unknown")
}

/// Byte estimate behind [`size_label`]; 0 when unknown
pub fn size_bytes(name: &str) -> u64 {
    size_bucket(name).map(|(_, bytes)| bytes).unwrap_or(0)
}

/// Directory name the Hugging Face cache uses for a repository
pub fn cache_dir_name(model_id: &str) -> String {
    format!("models--{}", model_id.replace('/', "--"))
}

/// Whether the repository has a directory in the cache
pub fn is_downloaded(cache_root: &Path, model_id: &str) -> bool {
    cache_root.join(cache_dir_name(model_id)).exists()
}

/// Hugging Face hub cache: `HF_HUB_CACHE`, then `HF_HOME/hub`, then
/// `~/.cache/huggingface/hub`
pub fn default_cache_root() -> PathBuf {
    if let Some(dir) = env::var_os("HF_HUB_CACHE") {
        return PathBuf::from(dir);
    }
    if let Some(home) = env::var_os("HF_HOME") {
        return PathBuf::from(home).join("hub");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cache")
        .join("huggingface")
        .join("hub")
}
