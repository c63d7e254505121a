//! Local model runtime for LADA
//!
//! Keeps at most one model resident, loads catalogue models on demand and
//! runs generation on the blocking thread pool. The candle backend is the
//! default [`ModelRuntime`]; tests plug in their own.

pub mod candle;
pub mod catalog;
pub mod client;
pub mod echo;
pub mod error;
pub mod runtime;
pub mod wrapper;

pub use candle::{CandleRuntime, DevicePreference};
pub use catalog::{
    cache_dir_name, default_cache_root, is_downloaded, size_bytes, size_label, Architecture,
    Catalog, CatalogEntry,
};
pub use client::LocalClient;
pub use echo::EchoRuntime;
pub use error::{Result, RuntimeError};
pub use runtime::{LoadedModel, ModelRuntime};
pub use wrapper::{LoadOutcome, ModelInfo, RuntimeWrapper};
