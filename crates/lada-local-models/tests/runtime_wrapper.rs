//! Lifecycle of the single-model runtime slot

use std::sync::Arc;

use lada_local_models::*;
use lada_providers::GenerationConfig;
use tempfile::TempDir;

const QWEN: &str = "Qwen2.5-0.5B-Instruct";
const LLAMA: &str = "Llama-3.2-1B-Instruct";

fn wrapper(runtime: &EchoRuntime, cache: &TempDir) -> RuntimeWrapper {
    RuntimeWrapper::new(Arc::new(runtime.clone())).with_cache_dir(cache.path())
}

#[tokio::test]
async fn test_repeat_load_is_a_no_op() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);

    let first = wrapper.load(QWEN).await.unwrap();
    assert!(first.message().starts_with("Model 'Qwen2.5-0.5B-Instruct' loaded successfully in"));
    let second = wrapper.load(QWEN).await.unwrap();
    assert_eq!(second, LoadOutcome::AlreadyLoaded(QWEN.to_string()));
    assert_eq!(second.message(), "Model 'Qwen2.5-0.5B-Instruct' already loaded");
    assert_eq!(runtime.load_count(), 1);
}

#[tokio::test]
async fn test_loading_another_model_releases_the_first() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);

    wrapper.load(QWEN).await.unwrap();
    wrapper.load(LLAMA).await.unwrap();

    assert_eq!(wrapper.current_model().await.as_deref(), Some(LLAMA));
    assert_eq!(runtime.load_count(), 2);
    assert_eq!(runtime.live_models(), 1);
}

#[tokio::test]
async fn test_failed_load_leaves_slot_empty() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new().fail_on(LLAMA);
    let wrapper = wrapper(&runtime, &cache);

    wrapper.load(QWEN).await.unwrap();
    let err = wrapper.load(LLAMA).await.unwrap_err();
    assert!(matches!(err, RuntimeError::LoadFailed { .. }));
    assert!(err.to_string().contains("weights are corrupt"));

    assert_eq!(wrapper.current_model().await, None);
    assert_eq!(runtime.live_models(), 0);
}

#[tokio::test]
async fn test_unknown_model_does_not_touch_the_slot() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);

    wrapper.load(QWEN).await.unwrap();
    let err = wrapper.load("GPT-5").await.unwrap_err();
    assert!(err
        .to_string()
        .starts_with("Model 'GPT-5' not found. Available models: Qwen2.5-0.5B-Instruct, "));
    assert_eq!(wrapper.current_model().await.as_deref(), Some(QWEN));
}

#[tokio::test]
async fn test_generate_requires_a_loaded_model() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);
    let config = GenerationConfig::default();

    assert_eq!(
        wrapper.generate("hello", &config).await.unwrap_err(),
        RuntimeError::NoModelLoaded
    );

    wrapper.load(QWEN).await.unwrap();
    assert!(wrapper.generate("hello", &config).await.is_ok());

    assert_eq!(wrapper.unload().await.as_deref(), Some(QWEN));
    assert_eq!(wrapper.unload().await, None);
    assert_eq!(runtime.live_models(), 0);
    assert_eq!(
        wrapper.generate("hello", &config).await.unwrap_err(),
        RuntimeError::NoModelLoaded
    );
}

#[tokio::test]
async fn test_generate_strips_echoed_prompt_and_counts_tokens() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);
    wrapper.load(QWEN).await.unwrap();

    let config = GenerationConfig::default().with_max_tokens(3);
    let response = wrapper.generate("write a haiku", &config).await.unwrap();

    assert_eq!(response.content, format!("{} {} {}", QWEN, QWEN, QWEN));
    assert_eq!(response.metadata.prompt_tokens, 3);
    assert_eq!(response.metadata.completion_tokens, 3);
    assert_eq!(response.metadata.total_tokens, 6);
    assert_eq!(response.metadata.model_name, QWEN);
}

#[tokio::test]
async fn test_generate_with_model_loads_on_demand() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);

    let config = GenerationConfig::default();
    let response = wrapper.generate_with_model(LLAMA, "hi", &config).await.unwrap();
    assert_eq!(response.metadata.model_name, LLAMA);
    wrapper.generate_with_model(LLAMA, "again", &config).await.unwrap();
    assert_eq!(runtime.load_count(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_load_cannot_evict_an_inflight_generation() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);
    wrapper.load(QWEN).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..16 {
        let wrapper = wrapper.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                let response = wrapper
                    .generate_with_model(QWEN, "ping", &GenerationConfig::default())
                    .await
                    .unwrap();
                assert_eq!(response.metadata.model_name, QWEN);
                assert!(response.content.starts_with(QWEN));
            } else {
                wrapper.load(LLAMA).await.unwrap();
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(runtime.live_models(), 1);
}

#[tokio::test]
async fn test_model_info() {
    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let wrapper = wrapper(&runtime, &cache);

    let info = wrapper.model_info("Qwen2.5-3B-Instruct").await.unwrap();
    assert_eq!(info.model_id, "Qwen/Qwen2.5-3B-Instruct-GGUF");
    assert_eq!(info.size, "~2.4GB");
    assert!(!info.is_loaded);
    assert!(!info.is_downloaded);

    std::fs::create_dir(cache.path().join("models--Qwen--Qwen2.5-3B-Instruct-GGUF")).unwrap();
    wrapper.load("Qwen2.5-3B-Instruct").await.unwrap();
    let info = wrapper.model_info("Qwen2.5-3B-Instruct").await.unwrap();
    assert!(info.is_loaded);
    assert!(info.is_downloaded);

    assert!(wrapper.model_info("nope").await.is_none());
}

#[tokio::test]
async fn test_local_client_contract() {
    use lada_providers::{LlmClient, LlmError};

    let cache = TempDir::new().unwrap();
    let runtime = EchoRuntime::new();
    let client = LocalClient::new(wrapper(&runtime, &cache), QWEN);

    assert!(client.is_available().await);
    assert_eq!(client.list_models().await.unwrap().len(), 6);
    let response = client
        .generate("hello there", &GenerationConfig::default())
        .await
        .unwrap();
    assert_eq!(response.metadata.prompt_tokens, 2);

    let missing = LocalClient::new(client.wrapper().clone(), "Qwen2.5-3B-Instrct");
    match missing
        .generate("hello", &GenerationConfig::default())
        .await
        .unwrap_err()
    {
        LlmError::ModelNotFound { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("Qwen2.5-3B-Instruct"))
        }
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
}
