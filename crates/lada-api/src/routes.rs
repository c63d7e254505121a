//! API route definitions

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{generate, health, lifecycle, tags},
    middleware::logging_middleware,
    state::AppState,
};

/// Ollama-compatible routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/tags", get(tags::list_tags))
        .route("/api/generate", post(generate::generate))
        .route("/api/load", post(lifecycle::load_model))
        .route("/api/unload", post(lifecycle::unload_model))
        .layer(CorsLayer::permissive())
}

/// Routes with logging and tracing layers, bound to `state`
pub fn app(state: AppState) -> Router {
    api_routes()
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
