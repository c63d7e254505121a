//! Single-slot model lifecycle
//!
//! At most one model is resident. `load`, `unload` and `generate` all take
//! the same lock, and [`RuntimeWrapper::generate_with_model`] holds it across
//! load-if-needed and generation so a concurrent load cannot evict the model
//! mid-request.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use lada_providers::{GenerationConfig, LlmResponse, ResponseMetadata};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info};

use crate::{
    catalog::{default_cache_root, is_downloaded, size_label, Catalog},
    error::{Result, RuntimeError},
    runtime::{LoadedModel, ModelRuntime},
};

/// Catalogue entry as reported to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub model_id: String,
    pub is_loaded: bool,
    pub is_downloaded: bool,
    /// Bucketed estimate such as `~2.4GB`
    pub size: String,
}

/// Result of a successful `load`
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    AlreadyLoaded(String),
    Loaded { name: String, seconds: f64 },
}

impl LoadOutcome {
    pub fn message(&self) -> String {
        match self {
            LoadOutcome::AlreadyLoaded(name) => format!("Model '{}' already loaded", name),
            LoadOutcome::Loaded { name, seconds } => {
                format!("Model '{}' loaded successfully in {:.1}s", name, seconds)
            }
        }
    }
}

enum Slot {
    Unloaded,
    Loaded {
        name: String,
        model: Box<dyn LoadedModel>,
    },
}

impl Slot {
    fn name(&self) -> Option<&str> {
        match self {
            Slot::Unloaded => None,
            Slot::Loaded { name, .. } => Some(name),
        }
    }
}

/// Owns the runtime slot; clones share it
///
/// ```
/// use std::sync::Arc;
/// use lada_local_models::{EchoRuntime, RuntimeWrapper};
///
/// # tokio_test::block_on(async {
/// let wrapper = RuntimeWrapper::new(Arc::new(EchoRuntime::new()));
/// wrapper.load("Qwen2.5-0.5B-Instruct").await.unwrap();
/// assert_eq!(
///     wrapper.current_model().await.as_deref(),
///     Some("Qwen2.5-0.5B-Instruct")
/// );
/// # });
/// ```
#[derive(Clone)]
pub struct RuntimeWrapper {
    catalog: Arc<Catalog>,
    runtime: Arc<dyn ModelRuntime>,
    cache_dir: PathBuf,
    slot: Arc<Mutex<Slot>>,
}

impl std::fmt::Debug for RuntimeWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeWrapper")
            .field("models", &self.catalog.len())
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl RuntimeWrapper {
    /// Wrapper over the built-in catalogue and the default Hugging Face cache
    pub fn new(runtime: Arc<dyn ModelRuntime>) -> Self {
        Self {
            catalog: Arc::new(Catalog::builtin()),
            runtime,
            cache_dir: default_cache_root(),
            slot: Arc::new(Mutex::new(Slot::Unloaded)),
        }
    }

    pub fn with_catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Friendly names of every servable model
    pub fn list_models(&self) -> Vec<String> {
        self.catalog.names()
    }

    /// Name of the resident model
    pub async fn current_model(&self) -> Option<String> {
        self.slot.lock().await.name().map(str::to_string)
    }

    /// Catalogue details for `name`; `None` for unknown names
    pub async fn model_info(&self, name: &str) -> Option<ModelInfo> {
        let entry = self.catalog.get(name)?;
        let is_loaded = self.slot.lock().await.name() == Some(name);
        Some(ModelInfo {
            name: entry.name.clone(),
            model_id: entry.model_id.clone(),
            is_loaded,
            is_downloaded: is_downloaded(&self.cache_dir, &entry.model_id),
            size: size_label(&entry.name).to_string(),
        })
    }

    /// Make `name` the resident model, evicting any other
    pub async fn load(&self, name: &str) -> Result<LoadOutcome> {
        let mut slot = self.slot.lock().await;
        self.load_into(&mut slot, name).await
    }

    /// Release the resident model; returns its name
    pub async fn unload(&self) -> Option<String> {
        let mut slot = self.slot.lock().await;
        let previous = std::mem::replace(&mut *slot, Slot::Unloaded);
        let name = previous.name().map(str::to_string);
        match &name {
            Some(name) => info!("Unloading model: {}", name),
            None => debug!("Unload requested with no model loaded"),
        }
        name
    }

    /// Generate with whatever model is resident
    pub async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<LlmResponse> {
        let slot = self.slot.clone().lock_owned().await;
        generate_locked(slot, prompt.to_string(), config.clone()).await
    }

    /// Load `model` if it is not resident, then generate, under one lock
    pub async fn generate_with_model(
        &self,
        model: &str,
        prompt: &str,
        config: &GenerationConfig,
    ) -> Result<LlmResponse> {
        let mut slot = self.slot.clone().lock_owned().await;
        if slot.name() != Some(model) {
            let outcome = self.load_into(&mut slot, model).await?;
            info!("{}", outcome.message());
        }
        generate_locked(slot, prompt.to_string(), config.clone()).await
    }

    async fn load_into(&self, slot: &mut Slot, name: &str) -> Result<LoadOutcome> {
        let entry = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownModel {
                name: name.to_string(),
                available: self.catalog.names(),
            })?;

        if slot.name() == Some(name) {
            return Ok(LoadOutcome::AlreadyLoaded(name.to_string()));
        }

        let previous = std::mem::replace(slot, Slot::Unloaded);
        if let Some(previous_name) = previous.name() {
            info!("Unloading current model: {}", previous_name);
        }
        drop(previous);

        info!("Loading model: {} ({})", name, entry.model_id);
        let runtime = self.runtime.clone();
        let cache_dir = self.cache_dir.clone();
        let started = Instant::now();
        let loaded = tokio::task::spawn_blocking(move || runtime.load(&entry, &cache_dir)).await?;

        match loaded {
            Ok(model) => {
                let seconds = started.elapsed().as_secs_f64();
                *slot = Slot::Loaded {
                    name: name.to_string(),
                    model,
                };
                info!("Model loaded successfully in {:.1}s", seconds);
                Ok(LoadOutcome::Loaded {
                    name: name.to_string(),
                    seconds,
                })
            }
            Err(e) => {
                error!("Failed to load model '{}': {}", name, e);
                Err(match e {
                    RuntimeError::LoadFailed { .. } => e,
                    other => RuntimeError::LoadFailed {
                        name: name.to_string(),
                        message: other.to_string(),
                    },
                })
            }
        }
    }
}

async fn generate_locked(
    mut slot: OwnedMutexGuard<Slot>,
    prompt: String,
    config: GenerationConfig,
) -> Result<LlmResponse> {
    tokio::task::spawn_blocking(move || match &mut *slot {
        Slot::Unloaded => Err(RuntimeError::NoModelLoaded),
        Slot::Loaded { name, model } => run_generation(name, model.as_mut(), &prompt, &config),
    })
    .await?
}

fn run_generation(
    name: &str,
    model: &mut dyn LoadedModel,
    prompt: &str,
    config: &GenerationConfig,
) -> Result<LlmResponse> {
    let started = Instant::now();
    let raw = model.generate(prompt, config).map_err(|e| match e {
        RuntimeError::Generation(_) => e,
        other => RuntimeError::Generation(other.to_string()),
    })?;
    let generation_time_secs = started.elapsed().as_secs_f64();

    let prompt_tokens = model.count_tokens(prompt)? as u64;
    let raw_tokens = model.count_tokens(&raw)? as u64;

    // Backends that echo the prompt count it in their output
    let stripped = raw
        .strip_prefix(prompt)
        .filter(|_| !prompt.is_empty())
        .map(|rest| rest.trim().to_string());
    let (content, completion_tokens) = match stripped {
        Some(rest) => (rest, raw_tokens.saturating_sub(prompt_tokens)),
        None => (raw, raw_tokens),
    };

    debug!(
        "Generated {} tokens with '{}' in {:.2}s",
        completion_tokens, name, generation_time_secs
    );
    Ok(LlmResponse {
        content,
        metadata: ResponseMetadata {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
            generation_time_secs,
            model_name: name.to_string(),
        },
    })
}
