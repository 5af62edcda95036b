//! Read-only state shared by every connection handler.

use crate::config::DaemonConfig;
use crate::error::{MAX_ERROR_CHARS, truncate_message};
use crate::protocol::{SynthesisRequest, SynthesisResponse};
use crate::render::Renderer;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Immutable daemon context: the loaded voice, its encoder, and request policy.
#[derive(Debug, Clone)]
pub struct DaemonContext {
    renderer: Renderer,
    max_text_bytes: usize,
    synthesis_timeout: Option<Duration>,
}

impl DaemonContext {
    pub fn new(renderer: Renderer, config: &DaemonConfig) -> Self {
        Self {
            renderer,
            max_text_bytes: config.max_text_bytes,
            synthesis_timeout: (config.synthesis_timeout_secs > 0)
                .then(|| config.synthesis_timeout()),
        }
    }

    /// Handle one decoded request and produce its response.
    ///
    /// Never fails: every error becomes an `ok:false` response with a
    /// message capped at [`MAX_ERROR_CHARS`].
    pub async fn process(&self, request: &SynthesisRequest) -> SynthesisResponse {
        if let Err(e) = request.validate(self.max_text_bytes) {
            warn!(error = %e, "rejected request");
            return SynthesisResponse::failure(validation_message(&e));
        }

        let text = request.trimmed_text();
        let output = Path::new(&request.output);
        match self
            .renderer
            .render(text, output, self.synthesis_timeout)
            .await
        {
            Ok(()) => {
                info!(output = %request.output, chars = text.chars().count(), "request served");
                SynthesisResponse::success()
            }
            Err(e) => {
                warn!(output = %request.output, error = %e, "request failed");
                SynthesisResponse::failure(truncate_message(&e.to_string(), MAX_ERROR_CHARS))
            }
        }
    }
}

/// Strip the `invalid request: ` prefix so clients see only the reason.
fn validation_message(err: &crate::TtsError) -> String {
    match err {
        crate::TtsError::InvalidRequest(reason) => reason.clone(),
        other => truncate_message(&other.to_string(), MAX_ERROR_CHARS),
    }
}
