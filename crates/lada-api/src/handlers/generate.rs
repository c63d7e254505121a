//! Text generation

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use chrono::Utc;
use lada_providers::{
    wire::{GenerateRequest, GenerateResponse},
    GenerationConfig,
};
use tracing::debug;

use crate::{error::ApiResult, state::AppState};

/// `POST /api/generate`
///
/// Loads `model` first when another one is resident. Streaming requests get
/// the same single complete reply.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult<Json<GenerateResponse>> {
    let Json(request) = payload?;
    if request.stream {
        debug!("Streaming requested for '{}'; replying with one response", request.model);
    }
    if request.template.is_some() {
        debug!("Ignoring prompt template for '{}'", request.model);
    }

    let config = GenerationConfig::from_options(request.options.as_ref());
    let prompt = request.full_prompt();
    let response = state
        .wrapper
        .generate_with_model(&request.model, &prompt, &config)
        .await?;

    let nanos = (response.metadata.generation_time_secs * 1e9) as u64;
    Ok(Json(GenerateResponse {
        model: request.model,
        created_at: Utc::now().to_rfc3339(),
        response: response.content,
        done: true,
        total_duration: nanos,
        load_duration: 0,
        prompt_eval_count: response.metadata.prompt_tokens,
        eval_count: response.metadata.completion_tokens,
        eval_duration: nanos,
    }))
}
