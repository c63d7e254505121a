#![warn(missing_docs)]

//! LADA adaptation server
//!
//! Serves the in-process model runtime through the Ollama HTTP surface
//! (`/api/tags`, `/api/generate`, `/health`, `/api/load`, `/api/unload`) so
//! daemon clients can talk to it unmodified.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use routes::app;
pub use server::ApiServer;
pub use state::AppState;
