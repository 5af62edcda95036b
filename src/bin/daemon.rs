//! Synthesis daemon: keeps one voice loaded and serves clients over a Unix socket.
//!
//! The model is loaded before the async runtime starts, so no connection is
//! accepted until it is resident. A failed load exits non-zero without
//! binding the socket.

use clap::Parser;
use parley::ParleyConfig;
use parley::daemon::{DaemonContext, DaemonServer};
use parley::render::Renderer;
use parley::transcode::Transcoder;
use parley::tts::{ModelLoader, PiperLoader};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Persistent Piper synthesis daemon.
#[derive(Parser)]
#[command(name = "parley-daemon", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("parley=info,ort=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ParleyConfig::load_or_default(cli.config.as_deref())?;

    info!(model = %config.model.path.display(), "loading model");
    let engine = PiperLoader.load(&config.model.path).map_err(|e| {
        tracing::error!(error = %e, "model failed to load");
        anyhow::anyhow!("model failed to load: {e}")
    })?;

    let transcoder = Transcoder::from_config(&config.encoder);
    info!(encoder = %transcoder.binary().display(), "model loaded");
    let context = DaemonContext::new(Renderer::new(engine, transcoder), &config.daemon);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        let server = DaemonServer::bind(&config.daemon.socket_path, context)?;
        info!(socket = %server.socket_path().display(), "ready");

        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("received Ctrl+C, shutting down...");
                on_signal.cancel();
            }
        });

        server.serve_until(shutdown).await?;
        info!("daemon shut down cleanly");
        anyhow::Ok(())
    })
}
