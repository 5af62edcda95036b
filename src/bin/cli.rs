//! Client binary: speak text into an audio file using the best available backend.

use clap::Parser;
use parley::tts::PiperLoader;
use parley::{Orchestrator, ParleyConfig, SynthesisRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output names that mean "write the audio to stdout".
const STDOUT_TARGETS: [&str; 2] = ["-", "/dev/stdout"];

/// Convert text to speech, falling back from the remote service to the local
/// daemon to an in-process voice.
#[derive(Parser)]
#[command(name = "parley", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Text to speak. Read from stdin when omitted.
    text: Option<String>,

    /// Output audio file. Written to stdout when omitted or `-`.
    output: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout may carry audio, so diagnostics go to stderr only.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("parley=info,ort=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = ParleyConfig::load_or_default(cli.config.as_deref())?;

    let text = match cli.text {
        Some(text) => text,
        None => {
            let mut buf = String::new();
            tokio::io::stdin().read_to_string(&mut buf).await?;
            buf
        }
    };

    if text.trim().is_empty() {
        info!("nothing to synthesize");
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(&config, Arc::new(PiperLoader))?;

    let result = match cli.output {
        Some(output) if !STDOUT_TARGETS.contains(&output.as_str()) => {
            orchestrator.run(&SynthesisRequest::new(text, output)).await
        }
        _ => {
            orchestrator
                .run_to_writer(&text, &mut tokio::io::stdout())
                .await
        }
    };
    let done = result.map_err(|e| {
        tracing::error!(error = %e, "synthesis failed");
        anyhow::anyhow!("synthesis failed: {e}")
    })?;

    info!(backend = %done.backend, attempts = done.attempted.len(), "done");
    Ok(())
}
