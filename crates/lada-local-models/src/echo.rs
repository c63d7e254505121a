//! Offline runtime that needs no weights
//!
//! Output is the prompt followed by a fixed number of filler words, the same
//! shape as backends that echo their prompt. Tokens are whitespace-separated
//! words. Useful for smoke-testing `lada-server` and for tests.

use std::{
    collections::HashSet,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use lada_providers::GenerationConfig;

use crate::{
    catalog::CatalogEntry,
    error::{Result, RuntimeError},
    runtime::{LoadedModel, ModelRuntime},
};

/// Deterministic [`ModelRuntime`] with observable load and release counts
#[derive(Debug, Clone, Default)]
pub struct EchoRuntime {
    loads: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl EchoRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every load of `name` fail
    pub fn fail_on(self, name: &str) -> Self {
        if let Ok(mut failing) = self.failing.lock() {
            failing.insert(name.to_string());
        }
        self
    }

    /// Successful loads so far
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Models loaded and not yet dropped
    pub fn live_models(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Token count this runtime reports for `text`
    pub fn tokens(text: &str) -> usize {
        text.split_whitespace().count()
    }
}

impl ModelRuntime for EchoRuntime {
    fn load(&self, entry: &CatalogEntry, _cache_dir: &Path) -> Result<Box<dyn LoadedModel>> {
        let should_fail = self
            .failing
            .lock()
            .map(|failing| failing.contains(&entry.name))
            .unwrap_or(false);
        if should_fail {
            return Err(RuntimeError::LoadFailed {
                name: entry.name.clone(),
                message: "weights are corrupt".to_string(),
            });
        }

        self.loads.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(EchoModel {
            name: entry.name.clone(),
            live: self.live.clone(),
        }))
    }
}

struct EchoModel {
    name: String,
    live: Arc<AtomicUsize>,
}

impl LoadedModel for EchoModel {
    fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let words = config.max_tokens.min(8) as usize;
        let filler = vec![self.name.as_str(); words].join(" ");
        if prompt.is_empty() {
            return Ok(filler);
        }
        Ok(format!("{} {}", prompt, filler))
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        Ok(EchoRuntime::tokens(text))
    }
}

impl Drop for EchoModel {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}
