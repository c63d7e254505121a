//! Health check endpoint

use axum::{extract::State, Json};
use lada_providers::wire::HealthResponse;

use crate::state::AppState;

/// `GET /health`
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        current_model: state.wrapper.current_model().await,
        available_models: state.wrapper.catalog().len(),
    })
}
