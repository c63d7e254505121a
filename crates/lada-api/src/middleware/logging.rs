//! Request logging middleware

use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::state::AppState;

/// Requests slower than this are logged as warnings, unless they hit the model
const SLOW_REQUEST: Duration = Duration::from_millis(100);

/// Log each request and response with its latency
pub async fn logging_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let method = request.method().clone();
    let uri = request.uri().clone();

    tracing::info!("Request: {} {}", method, uri);

    let start = Instant::now();
    let response = next.run(request).await;
    let duration = start.elapsed();

    let inference = matches!(uri.path(), "/api/generate" | "/api/load");
    if duration > SLOW_REQUEST && !inference {
        tracing::warn!("Slow request: {} {} took {:?}", method, uri, duration);
    }

    tracing::info!(
        "Response: {} {} - {} in {}ms (uptime {}s)",
        method,
        uri,
        response.status(),
        duration.as_millis(),
        state.uptime_seconds()
    );

    Ok(response)
}
