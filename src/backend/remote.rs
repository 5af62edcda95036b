//! Remote network synthesis service.

use super::{BackendKind, SynthesisBackend};
use crate::config::RemoteConfig;
use crate::error::{MAX_ERROR_CHARS, Result, TtsError, truncate_message};
use crate::protocol::SynthesisRequest;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

/// JSON body sent to the service.
#[derive(Debug, Serialize)]
struct SpeechRequestBody<'a> {
    input: &'a str,
    voice: &'a str,
    rate: &'a str,
    response_format: &'a str,
}

/// HTTP client for a hosted voice. The service returns the encoded audio
/// directly, so no local encoding happens on this path.
#[derive(Debug, Clone)]
pub struct RemoteBackend {
    client: reqwest::Client,
    config: RemoteConfig,
}

impl RemoteBackend {
    /// Build the backend.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::Remote`] if the HTTP client cannot be constructed.
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::Remote(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl SynthesisBackend for RemoteBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Network
    }

    fn is_available(&self) -> bool {
        !self.config.endpoint.trim().is_empty()
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        let body = SpeechRequestBody {
            input: request.trimmed_text(),
            voice: &self.config.voice,
            rate: &self.config.rate,
            response_format: &self.config.response_format,
        };

        let mut http = self.client.post(&self.config.endpoint).json(&body);
        if let Some(ref key) = self.config.api_key {
            http = http.bearer_auth(key);
        }

        debug!(endpoint = %self.config.endpoint, voice = %self.config.voice, "requesting remote synthesis");
        let response = http
            .send()
            .await
            .map_err(|e| TtsError::Remote(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(TtsError::Remote(format!(
                "service returned {status}: {}",
                truncate_message(detail.trim(), MAX_ERROR_CHARS)
            )));
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| TtsError::Remote(format!("failed to read response body: {e}")))?;
        if audio.is_empty() {
            return Err(TtsError::Remote("service returned no audio".into()));
        }

        tokio::fs::write(&request.output, &audio).await?;
        info!(output = %request.output, bytes = audio.len(), "remote synthesis complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn empty_endpoint_is_unavailable() {
        let backend = RemoteBackend::new(RemoteConfig::default()).unwrap();
        assert!(!backend.is_available());
        assert_eq!(backend.kind(), BackendKind::Network);
    }

    #[test]
    fn configured_endpoint_is_available() {
        let backend = RemoteBackend::new(RemoteConfig {
            endpoint: "http://127.0.0.1:1/speech".into(),
            ..RemoteConfig::default()
        })
        .unwrap();
        assert!(backend.is_available());
    }

    #[tokio::test]
    async fn unreachable_service_is_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("out.mp3");
        let backend = RemoteBackend::new(RemoteConfig {
            endpoint: "http://127.0.0.1:1/speech".into(),
            timeout_secs: 2,
            ..RemoteConfig::default()
        })
        .unwrap();

        let err = backend
            .synthesize(&SynthesisRequest::new("hello", output.to_string_lossy()))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Remote(_)));
        assert!(!output.exists());
    }
}
