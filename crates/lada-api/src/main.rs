// LADA adaptation server entry point

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::Context;
use clap::{Parser, ValueEnum};
use lada_api::{ApiServer, AppState};
use lada_local_models::{
    default_cache_root, CandleRuntime, DevicePreference, EchoRuntime, ModelRuntime, RuntimeWrapper,
};
use tracing_subscriber::EnvFilter;

/// Serve local models through the Ollama HTTP API
#[derive(Parser, Debug)]
#[command(name = "lada-server", version, about)]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to bind
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Catalogue model to load before serving
    #[arg(long, value_name = "NAME")]
    load_model: Option<String>,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Hugging Face hub cache directory
    #[arg(long, env = "HF_HUB_CACHE")]
    cache_dir: Option<PathBuf>,

    /// Inference backend
    #[arg(long, value_enum, default_value_t = Backend::Candle)]
    runtime: Backend,

    /// Run candle on the CPU even when a GPU is available
    #[arg(long)]
    cpu: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Quantized GGUF weights through candle
    Candle,
    /// Offline runtime that echoes the prompt
    Echo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .context("invalid --log-level")?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let runtime: Arc<dyn ModelRuntime> = match args.runtime {
        Backend::Candle if args.cpu => Arc::new(CandleRuntime::new(DevicePreference::Cpu)),
        Backend::Candle => Arc::new(CandleRuntime::new(DevicePreference::Auto)),
        Backend::Echo => Arc::new(EchoRuntime::new()),
    };
    let cache_dir = args.cache_dir.unwrap_or_else(default_cache_root);
    let wrapper = RuntimeWrapper::new(runtime).with_cache_dir(cache_dir);

    if let Some(name) = args.load_model.as_deref() {
        let outcome = wrapper
            .load(name)
            .await
            .with_context(|| format!("failed to pre-load '{}'", name))?;
        tracing::info!("{}", outcome.message());
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", args.host, args.port))?;
    ApiServer::new(addr, AppState::new(wrapper))
        .run()
        .await
        .context("server error")
}
