//! Text → PCM → encoded file, shared by the daemon and the direct backend.

use crate::audio::PcmAudio;
use crate::error::{Result, TtsError};
use crate::transcode::Transcoder;
use crate::tts::SpeechEngine;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// A loaded engine paired with the encoder that finishes its output.
#[derive(Clone)]
pub struct Renderer {
    engine: Arc<dyn SpeechEngine>,
    transcoder: Transcoder,
}

impl Renderer {
    /// Pair `engine` with `transcoder`.
    pub fn new(engine: Arc<dyn SpeechEngine>, transcoder: Transcoder) -> Self {
        Self { engine, transcoder }
    }

    /// Synthesize `text` on a blocking thread, bounded by `timeout`.
    ///
    /// A timed-out inference keeps running on its thread; only the wait is
    /// abandoned.
    ///
    /// # Errors
    ///
    /// Returns the engine's error, [`TtsError::Timeout`], or a synthesis
    /// error if the engine produced no samples.
    pub async fn synthesize(&self, text: &str, timeout: Option<Duration>) -> Result<PcmAudio> {
        let engine = Arc::clone(&self.engine);
        let owned = text.to_owned();
        let task = tokio::task::spawn_blocking(move || engine.synthesize(&owned));

        let joined = match timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                TtsError::Timeout(format!(
                    "synthesis timed out after {} seconds",
                    limit.as_secs()
                ))
            })?,
            None => task.await,
        };
        let pcm = joined.map_err(|e| TtsError::Synthesis(format!("synthesis task failed: {e}")))??;

        if pcm.is_empty() {
            return Err(TtsError::Synthesis("synthesis produced no audio".into()));
        }
        Ok(pcm)
    }

    /// Synthesize `text` and encode it into `output`.
    ///
    /// # Errors
    ///
    /// Returns any synthesis or encoder error.
    pub async fn render(&self, text: &str, output: &Path, timeout: Option<Duration>) -> Result<()> {
        let pcm = self.synthesize(text, timeout).await?;
        self.transcoder.encode(&pcm, output).await?;
        info!(
            output = %output.display(),
            audio_secs = f64::from(pcm.duration_secs()),
            "rendered"
        );
        Ok(())
    }
}

impl std::fmt::Debug for Renderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Renderer")
            .field("transcoder", &self.transcoder)
            .finish_non_exhaustive()
    }
}
