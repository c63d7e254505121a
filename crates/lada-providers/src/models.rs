//! Request and response types shared by every client

use serde::{Deserialize, Serialize};

use crate::wire::GenerateOptions;

/// Sampling parameters for one generation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub repetition_penalty: f32,
    pub seed: Option<u64>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: 2048,
            temperature: 0.7,
            top_p: 0.95,
            repetition_penalty: 1.1,
            seed: None,
        }
    }
}

impl GenerationConfig {
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Fill unset wire options from the defaults
    ///
    /// A non-positive `num_predict` means "no limit" and falls back to the
    /// default budget; a negative `seed` means "random".
    pub fn from_options(options: Option<&GenerateOptions>) -> Self {
        let defaults = Self::default();
        let Some(options) = options else {
            return defaults;
        };
        Self {
            max_tokens: options
                .num_predict
                .filter(|n| *n > 0)
                .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
                .unwrap_or(defaults.max_tokens),
            temperature: options.temperature.unwrap_or(defaults.temperature),
            top_p: options.top_p.unwrap_or(defaults.top_p),
            repetition_penalty: options
                .repetition_penalty
                .unwrap_or(defaults.repetition_penalty),
            seed: options.seed.and_then(|seed| u64::try_from(seed).ok()),
        }
    }

    /// Wire options carrying every field of this config
    pub fn to_options(&self) -> GenerateOptions {
        GenerateOptions {
            num_predict: Some(i64::from(self.max_tokens)),
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            repetition_penalty: Some(self.repetition_penalty),
            seed: self.seed.and_then(|seed| i64::try_from(seed).ok()),
        }
    }
}

/// Token accounting and timing for a generation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub generation_time_secs: f64,
    pub model_name: String,
}

/// Text produced by a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub content: String,
    pub metadata: ResponseMetadata,
}
