//! Application state for the adaptation server

use std::time::Instant;

use lada_local_models::RuntimeWrapper;

/// State shared across all handlers
///
/// The wrapper owns the single loaded-model slot; cloning the state shares it.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Runtime serving every request
    pub wrapper: RuntimeWrapper,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Create state around a runtime wrapper
    pub fn new(wrapper: RuntimeWrapper) -> Self {
        Self {
            wrapper,
            start_time: Instant::now(),
        }
    }

    /// Server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
