//! Explicit model load and unload

use axum::{
    extract::{Query, State},
    Json,
};
use lada_providers::wire::{LoadParams, StatusResponse};
use serde::Deserialize;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Query string of `POST /api/load`
#[derive(Debug, Default, Deserialize)]
pub struct LoadQuery {
    /// Catalogue name to load
    pub model_name: Option<String>,
}

/// `POST /api/load`, taking `model_name` from the query string or a JSON body
pub async fn load_model(
    State(state): State<AppState>,
    Query(query): Query<LoadQuery>,
    body: Option<Json<LoadParams>>,
) -> ApiResult<Json<StatusResponse>> {
    let model_name = query
        .model_name
        .or_else(|| body.map(|Json(params)| params.model_name))
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("model_name is required".to_string()))?;

    let outcome = state.wrapper.load(&model_name).await?;
    Ok(Json(StatusResponse::success(outcome.message())))
}

/// `POST /api/unload`
pub async fn unload_model(State(state): State<AppState>) -> Json<StatusResponse> {
    let message = match state.wrapper.unload().await {
        Some(name) => {
            info!("Unloaded model: {}", name);
            format!("Model '{}' unloaded", name)
        }
        None => "No model loaded".to_string(),
    };
    Json(StatusResponse::success(message))
}
