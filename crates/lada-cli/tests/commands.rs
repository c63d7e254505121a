//! Command handlers against temporary config files and mock engines

use std::{fs, sync::Arc};

use lada_cli::{
    commands::{AskCommand, Command, ConfigAction, ConfigCommand, InitCommand},
    CliError,
};
use lada_config::{ConfigManager, Mode};
use lada_local_models::EchoRuntime;
use lada_providers::LlmError;
use tempfile::TempDir;

fn tags_body(names: &[&str]) -> String {
    let models: Vec<_> = names
        .iter()
        .map(|name| serde_json::json!({"name": name, "size": 1, "digest": "abc"}))
        .collect();
    serde_json::json!({ "models": models }).to_string()
}

#[tokio::test]
async fn test_init_writes_defaults_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested/.lada_config.yml");

    assert!(InitCommand::new(Some(path.clone())).run().unwrap());
    let manager = ConfigManager::with_path(&path).unwrap();
    assert_eq!(manager.config().model.default_model, "codellama:7b");

    fs::write(&path, "version: 2\nmodel:\n  default_model: mistral\n").unwrap();
    assert!(!InitCommand::new(Some(path.clone())).run().unwrap());
    assert!(fs::read_to_string(&path).unwrap().contains("mistral"));

    assert!(InitCommand::new(Some(path.clone()))
        .with_force(true)
        .run()
        .unwrap());
    assert!(!fs::read_to_string(&path).unwrap().contains("mistral"));
}

#[tokio::test]
async fn test_config_set_persists_and_validates() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(".lada_config.yml");

    ConfigCommand::new(
        Some(path.clone()),
        ConfigAction::Set("model.code_model".to_string(), "mlx:Qwen2.5-3B-Instruct".to_string()),
    )
    .execute()
    .await
    .unwrap();

    let manager = ConfigManager::with_path(&path).unwrap();
    assert_eq!(
        manager.config().model.get_model_for_mode(Mode::Code),
        "mlx:Qwen2.5-3B-Instruct"
    );

    let err = ConfigCommand::new(
        Some(path.clone()),
        ConfigAction::Set("model.engines.ollama.host".to_string(), "localhost".to_string()),
    )
    .execute()
    .await
    .unwrap_err();
    assert!(err.user_message().contains("model.engines.ollama.host"));

    let err = ConfigCommand::new(Some(path), ConfigAction::Get("model.colour".to_string()))
        .execute()
        .await
        .unwrap_err();
    assert!(matches!(err, CliError::Config(_)));
}

#[tokio::test]
async fn test_ask_generates_through_the_daemon() {
    let mut server = mockito::Server::new_async().await;
    let tags = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(tags_body(&["codellama:7b"]))
        .expect_at_least(2)
        .create_async()
        .await;
    let generate = server
        .mock("POST", "/api/generate")
        .with_status(200)
        .with_body(r#"{"model":"codellama:7b","response":"fn main() {}","done":true,"prompt_eval_count":4,"eval_count":5}"#)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let response = AskCommand::new(Some(dir.path().join("missing.yml")), "write main")
        .with_host(Some(server.url()))
        .run()
        .await
        .unwrap();

    assert_eq!(response.content, "fn main() {}");
    assert_eq!(response.metadata.completion_tokens, 5);
    tags.assert_async().await;
    generate.assert_async().await;
}

#[tokio::test]
async fn test_ask_reports_near_miss_models() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(tags_body(&["codellama:7b", "mistral:latest"]))
        .expect_at_least(1)
        .create_async()
        .await;

    let dir = TempDir::new().unwrap();
    let err = AskCommand::new(Some(dir.path().join("missing.yml")), "hi")
        .with_model(Some("cdellama:7b".to_string()))
        .with_host(Some(server.url()))
        .run()
        .await
        .unwrap_err();

    match &err {
        CliError::Llm(LlmError::ModelNotFound { suggestions, .. }) => {
            assert_eq!(suggestions.first().map(String::as_str), Some("codellama:7b"))
        }
        other => panic!("expected ModelNotFound, got {:?}", other),
    }
    assert!(err.user_message().contains("Did you mean"));
}

#[tokio::test]
async fn test_ask_in_process_uses_the_runtime() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join(".lada_config.yml");
    fs::write(
        &config_path,
        "version: 2\nmodel:\n  default_model: mlx:Qwen2.5-0.5B-Instruct\n  max_tokens: 2\n",
    )
    .unwrap();

    let runtime = EchoRuntime::new();
    let response = AskCommand::new(Some(config_path), "say hi")
        .with_in_process(true)
        .with_runtime(Arc::new(runtime.clone()))
        .with_cache_dir(dir.path().join("hub"))
        .run()
        .await
        .unwrap();

    assert_eq!(response.content, "Qwen2.5-0.5B-Instruct Qwen2.5-0.5B-Instruct");
    assert_eq!(response.metadata.prompt_tokens, 2);
    assert_eq!(runtime.load_count(), 1);
}

#[tokio::test]
async fn test_ask_against_stopped_daemon_hints_at_ollama_serve() {
    let dir = TempDir::new().unwrap();
    let err = AskCommand::new(Some(dir.path().join("missing.yml")), "hi")
        .with_host(Some("http://127.0.0.1:9".to_string()))
        .with_timeout(Some(2))
        .run()
        .await
        .unwrap_err();

    assert!(matches!(err, CliError::Llm(LlmError::Connection { .. })));
    assert!(err.user_message().contains("ollama serve"));
}
