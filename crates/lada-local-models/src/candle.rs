//! Local inference with candle
//!
//! Llama and Qwen2 models run from quantized GGUF files; GLM-4 runs from
//! sharded safetensors listed in the repository's index. Weights and
//! tokenizers are fetched through the Hugging Face hub cache, so a model
//! counts as downloaded once its repository directory exists.

use std::{
    collections::{BTreeSet, HashSet},
    fs::{self, File},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use candle_core::{quantized::gguf_file, DType, Device, Tensor};
use candle_transformers::{
    generation::LogitsProcessor,
    models::{glm4, quantized_llama, quantized_qwen2},
};
use candle_nn::VarBuilder;
use hf_hub::api::sync::{ApiBuilder, ApiRepo};
use lada_providers::GenerationConfig;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::{
    catalog::{Architecture, CatalogEntry},
    error::{Result, RuntimeError},
    runtime::{LoadedModel, ModelRuntime},
};

/// Tokens considered by the repetition penalty
const REPEAT_LAST_N: usize = 64;

const EOS_CANDIDATES: &[&str] = &[
    "<|im_end|>",
    "<|eot_id|>",
    "<|endoftext|>",
    "<|user|>",
    "<|observation|>",
    "</s>",
];

/// Start-of-sequence tokens that seed generation from an empty prompt
const BOS_CANDIDATES: &[&str] = &["<|begin_of_text|>", "<s>", "[gMASK]", "<|endoftext|>"];

/// Device preference for [`CandleRuntime`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DevicePreference {
    /// Metal, then CUDA, then CPU
    #[default]
    Auto,
    Cpu,
}

/// Runtime backed by candle's quantized llama and qwen2 models
#[derive(Debug, Clone, Default)]
pub struct CandleRuntime {
    device: DevicePreference,
}

impl CandleRuntime {
    pub fn new(device: DevicePreference) -> Self {
        Self { device }
    }

    fn select_device(&self) -> Device {
        if self.device == DevicePreference::Auto {
            match Device::new_metal(0) {
                Ok(device) => {
                    info!("Candle: using Metal device");
                    return device;
                }
                Err(e) => debug!("Metal unavailable: {}", e),
            }
            match Device::new_cuda(0) {
                Ok(device) => {
                    info!("Candle: using CUDA device 0");
                    return device;
                }
                Err(e) => debug!("CUDA unavailable: {}", e),
            }
        }
        info!("Candle: using CPU");
        Device::Cpu
    }
}

impl ModelRuntime for CandleRuntime {
    fn load(&self, entry: &CatalogEntry, cache_dir: &Path) -> Result<Box<dyn LoadedModel>> {
        let api = ApiBuilder::new()
            .with_cache_dir(cache_dir.to_path_buf())
            .with_progress(false)
            .build()
            .map_err(|e| RuntimeError::Download(e.to_string()))?;

        debug!("Fetching {}/{}", entry.model_id, entry.weights_file);
        let repo = api.model(entry.model_id.clone());
        let fetch = |file: &str| {
            repo.get(file)
                .map_err(|e| RuntimeError::Download(format!("{}: {}", entry.model_id, e)))
        };
        let weights_path = fetch(entry.weights_file.as_str())?;
        let tokenizer_path = api
            .model(entry.tokenizer_repo.clone())
            .get("tokenizer.json")
            .map_err(|e| RuntimeError::Download(format!("{}: {}", entry.tokenizer_repo, e)))?;

        let load_failed = |message: String| RuntimeError::LoadFailed {
            name: entry.name.clone(),
            message,
        };

        let device = self.select_device();
        let weights = match entry.architecture {
            Architecture::Llama | Architecture::Qwen2 => {
                load_gguf(entry.architecture, &weights_path, &device).map_err(load_failed)?
            }
            Architecture::Glm4 => {
                let index = fs::read_to_string(&weights_path)
                    .map_err(|e| load_failed(format!("Failed to read weight index: {}", e)))?;
                let shards = shard_files(&index).map_err(load_failed)?;
                let paths = shards
                    .iter()
                    .map(|shard| fetch(shard.as_str()))
                    .collect::<Result<Vec<PathBuf>>>()?;
                load_glm4(&paths, &device).map_err(load_failed)?
            }
        };

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| load_failed(format!("Failed to load tokenizer: {}", e)))?;
        let eos_tokens: HashSet<u32> = EOS_CANDIDATES
            .iter()
            .filter_map(|token| tokenizer.token_to_id(token))
            .collect();
        if eos_tokens.is_empty() {
            warn!("No end-of-sequence token found for {}", entry.name);
        }
        let bos_token = BOS_CANDIDATES
            .iter()
            .find_map(|token| tokenizer.token_to_id(token));

        Ok(Box::new(CandleModel {
            weights,
            tokenizer,
            device,
            eos_tokens,
            bos_token,
        }))
    }
}

fn load_gguf(
    architecture: Architecture,
    path: &Path,
    device: &Device,
) -> std::result::Result<Weights, String> {
    let mut file =
        File::open(path).map_err(|e| format!("Failed to open GGUF file: {}", e))?;
    let content = gguf_file::Content::read(&mut file)
        .map_err(|e| format!("Failed to parse GGUF file: {}", e))?;
    let weights = match architecture {
        Architecture::Llama => quantized_llama::ModelWeights::from_gguf(content, &mut file, device)
            .map(Weights::Llama),
        Architecture::Qwen2 => {
            quantized_qwen2::ModelWeights::from_gguf(content, &mut file, device).map(Weights::Qwen2)
        }
        Architecture::Glm4 => return Err("GLM-4 weights are not distributed as GGUF".to_string()),
    };
    weights.map_err(|e| format!("Failed to load model weights: {}", e))
}

fn load_glm4(paths: &[PathBuf], device: &Device) -> std::result::Result<Weights, String> {
    let dtype = if device.is_cpu() { DType::F32 } else { DType::BF16 };
    // SAFETY: the shards live in the hub cache and are not modified while mapped
    let vb = unsafe { VarBuilder::from_mmaped_safetensors(paths, dtype, device) }
        .map_err(|e| format!("Failed to map safetensors: {}", e))?;
    glm4::Model::new(&glm4::Config::glm4(), vb)
        .map(|model| Weights::Glm4(Box::new(model)))
        .map_err(|e| format!("Failed to load model weights: {}", e))
}

/// Shard files named by a `model.safetensors.index.json`, deduplicated and sorted
fn shard_files(index: &str) -> std::result::Result<Vec<String>, String> {
    let index: serde_json::Value =
        serde_json::from_str(index).map_err(|e| format!("Invalid weight index: {}", e))?;
    let weight_map = index
        .get("weight_map")
        .and_then(|map| map.as_object())
        .ok_or_else(|| "Weight index has no weight_map".to_string())?;
    let shards: BTreeSet<String> = weight_map
        .values()
        .filter_map(|file| file.as_str().map(str::to_string))
        .collect();
    if shards.is_empty() {
        return Err("Weight index lists no shards".to_string());
    }
    Ok(shards.into_iter().collect())
}

enum Weights {
    Llama(quantized_llama::ModelWeights),
    Qwen2(quantized_qwen2::ModelWeights),
    Glm4(Box<glm4::Model>),
}

impl Weights {
    fn forward(&mut self, input: &Tensor, position: usize) -> candle_core::Result<Tensor> {
        match self {
            Weights::Llama(model) => model.forward(input, position),
            Weights::Qwen2(model) => model.forward(input, position),
            Weights::Glm4(model) => model.forward(input),
        }
    }

    /// Drop cached keys and values; the quantized models do this at position 0
    fn reset(&mut self) {
        if let Weights::Glm4(model) = self {
            model.reset_kv_cache();
        }
    }
}

struct CandleModel {
    weights: Weights,
    tokenizer: Tokenizer,
    device: Device,
    eos_tokens: HashSet<u32>,
    bos_token: Option<u32>,
}

/// Tokens fed to the first forward pass
///
/// An empty prompt is seeded with the start-of-sequence token.
fn seed_tokens(prompt_tokens: Vec<u32>, bos_token: Option<u32>) -> Result<Vec<u32>> {
    if !prompt_tokens.is_empty() {
        return Ok(prompt_tokens);
    }
    bos_token.map(|bos| vec![bos]).ok_or_else(|| {
        RuntimeError::Generation("prompt is empty and the tokenizer has no start token".to_string())
    })
}

impl CandleModel {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        self.tokenizer
            .encode(text, true)
            .map(|encoding| encoding.get_ids().to_vec())
            .map_err(|e| RuntimeError::Generation(format!("Tokenization failed: {}", e)))
    }

    fn next_token(
        &mut self,
        input: &[u32],
        position: usize,
        history: &[u32],
        sampler: &mut LogitsProcessor,
        repetition_penalty: f32,
    ) -> candle_core::Result<u32> {
        let input = Tensor::new(input, &self.device)?.unsqueeze(0)?;
        let logits = self
            .weights
            .forward(&input, position)?
            .squeeze(0)?
            .to_dtype(DType::F32)?;
        let logits = if (repetition_penalty - 1.0).abs() > f32::EPSILON {
            let start = history.len().saturating_sub(REPEAT_LAST_N);
            candle_transformers::utils::apply_repeat_penalty(
                &logits,
                repetition_penalty,
                &history[start..],
            )?
        } else {
            logits
        };
        sampler.sample(&logits)
    }
}

impl LoadedModel for CandleModel {
    fn generate(&mut self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let prompt_tokens = seed_tokens(self.encode(prompt)?, self.bos_token)?;
        self.weights.reset();

        let seed = config.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or(299_792_458)
        });
        let mut sampler = LogitsProcessor::new(
            seed,
            Some(f64::from(config.temperature)),
            Some(f64::from(config.top_p)),
        );
        let sampling_failed =
            |e: candle_core::Error| RuntimeError::Generation(format!("Sampling failed: {}", e));

        // The whole prompt goes through one forward pass, then one token at a time
        let mut history = prompt_tokens.clone();
        let mut generated: Vec<u32> = Vec::new();
        let mut next = self
            .next_token(
                &prompt_tokens,
                0,
                &history,
                &mut sampler,
                config.repetition_penalty,
            )
            .map_err(sampling_failed)?;

        while generated.len() < config.max_tokens as usize {
            if self.eos_tokens.contains(&next) {
                break;
            }
            generated.push(next);
            history.push(next);
            if generated.len() == config.max_tokens as usize {
                break;
            }
            let position = prompt_tokens.len() + generated.len() - 1;
            next = self
                .next_token(
                    &[next],
                    position,
                    &history,
                    &mut sampler,
                    config.repetition_penalty,
                )
                .map_err(sampling_failed)?;
        }

        self.tokenizer
            .decode(&generated, true)
            .map_err(|e| RuntimeError::Generation(format!("Decoding failed: {}", e)))
    }

    fn count_tokens(&self, text: &str) -> Result<usize> {
        self.tokenizer
            .encode(text, false)
            .map(|encoding| encoding.len())
            .map_err(|e| RuntimeError::Generation(format!("Tokenization failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_prompt_is_seeded_with_start_token() {
        assert_eq!(seed_tokens(vec![], Some(1)).unwrap(), vec![1]);
        assert_eq!(seed_tokens(vec![5, 6], Some(1)).unwrap(), vec![5, 6]);
        assert!(matches!(
            seed_tokens(vec![], None),
            Err(RuntimeError::Generation(_))
        ));
    }

    #[test]
    fn test_shard_files_are_deduplicated() {
        let index = r#"{
            "metadata": {"total_size": 18799902784},
            "weight_map": {
                "transformer.embedding.word_embeddings.weight": "model-00001-of-00002.safetensors",
                "transformer.encoder.layers.0.mlp.dense_4h_to_h.weight": "model-00001-of-00002.safetensors",
                "transformer.output_layer.weight": "model-00002-of-00002.safetensors"
            }
        }"#;
        assert_eq!(
            shard_files(index).unwrap(),
            vec![
                "model-00001-of-00002.safetensors".to_string(),
                "model-00002-of-00002.safetensors".to_string(),
            ]
        );
    }

    #[test]
    fn test_shard_index_without_weight_map_is_rejected() {
        assert!(shard_files(r#"{"metadata": {}}"#).is_err());
        assert!(shard_files(r#"{"weight_map": {}}"#).is_err());
        assert!(shard_files("not json").is_err());
    }
}
