//! Checks run before a generation: backend reachable, model present

use tracing::{debug, warn};

use crate::{
    error::{LlmError, Result},
    provider::LlmClient,
};

/// Most suggestions offered for a mistyped model name
const MAX_SUGGESTIONS: usize = 3;

/// Minimum normalized similarity for a name to be suggested
const SUGGESTION_CUTOFF: f64 = 0.6;

/// Closest names to `requested`, best first
pub fn suggest_models(requested: &str, available: &[String]) -> Vec<String> {
    let mut scored: Vec<(f64, &String)> = available
        .iter()
        .map(|name| (strsim::normalized_levenshtein(requested, name), name))
        .filter(|(score, _)| *score >= SUGGESTION_CUTOFF)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, name)| name.clone())
        .collect()
}

/// Confirm the client's backend is up and serves the client's model
///
/// ```no_run
/// use lada_providers::{ensure_model_available, ClientOverrides, ModelRegistry};
///
/// # tokio_test::block_on(async {
/// let client = ModelRegistry::new()
///     .get_client("codellama:7b", &ClientOverrides::default())
///     .unwrap();
/// if let Err(e) = ensure_model_available(client.as_ref()).await {
///     eprintln!("{}", e);
/// }
/// # });
/// ```
pub async fn ensure_model_available(client: &dyn LlmClient) -> Result<()> {
    if !client.is_available().await {
        return Err(LlmError::Connection {
            engine: client.engine(),
            host: client.host().to_string(),
            message: "backend is not responding".to_string(),
        });
    }

    let available = client.list_models().await?;
    if available.iter().any(|name| name == client.model()) {
        debug!("Model '{}' is available on {}", client.model(), client.engine());
        return Ok(());
    }

    let suggestions = suggest_models(client.model(), &available);
    warn!(
        "Model '{}' not found on {} ({} models available)",
        client.model(),
        client.engine(),
        available.len()
    );
    Err(LlmError::ModelNotFound {
        engine: client.engine(),
        model: client.model().to_string(),
        available,
        suggestions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_typo_suggests_closest() {
        let available = names(&["codellama:7b", "mistral", "llama2:13b"]);
        let suggestions = suggest_models("cdellama:7b", &available);
        assert_eq!(suggestions.first().map(String::as_str), Some("codellama:7b"));
    }

    #[test]
    fn test_unrelated_name_gets_no_suggestions() {
        let available = names(&["codellama:7b", "mistral"]);
        assert!(suggest_models("zzz", &available).is_empty());
    }

    #[test]
    fn test_at_most_three_suggestions() {
        let available = names(&["qwen:1b", "qwen:2b", "qwen:3b", "qwen:4b", "qwen:5b"]);
        assert_eq!(suggest_models("qwen:9b", &available).len(), 3);
    }
}
