//! Last-resort in-process synthesis: load the model, render, drop it.

use super::{BackendKind, SynthesisBackend};
use crate::error::{Result, TtsError};
use crate::protocol::SynthesisRequest;
use crate::render::Renderer;
use crate::transcode::Transcoder;
use crate::tts::ModelLoader;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Loads a fresh model for every attempt, paying the full load cost.
#[derive(Clone)]
pub struct DirectBackend {
    model_path: PathBuf,
    loader: Arc<dyn ModelLoader>,
    transcoder: Transcoder,
}

impl DirectBackend {
    pub fn new(
        model_path: impl Into<PathBuf>,
        loader: Arc<dyn ModelLoader>,
        transcoder: Transcoder,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            loader,
            transcoder,
        }
    }
}

#[async_trait]
impl SynthesisBackend for DirectBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Direct
    }

    fn is_available(&self) -> bool {
        self.model_path.exists()
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        info!(model = %self.model_path.display(), "loading voice model in-process");
        let loader = Arc::clone(&self.loader);
        let path = self.model_path.clone();
        let engine = tokio::task::spawn_blocking(move || loader.load(&path))
            .await
            .map_err(|e| TtsError::Model(format!("model load task failed: {e}")))??;

        Renderer::new(engine, self.transcoder.clone())
            .render(request.trimmed_text(), Path::new(&request.output), None)
            .await
    }
}

impl std::fmt::Debug for DirectBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectBackend")
            .field("model_path", &self.model_path)
            .field("transcoder", &self.transcoder)
            .finish_non_exhaustive()
    }
}
