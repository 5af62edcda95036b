//! PCM → compressed audio via an external `ffmpeg` process.
//!
//! The PCM is packed into an in-memory WAV, streamed to the encoder's stdin,
//! and the encoder writes the final container straight to the output path.
//! A [`Transcoder`] holds only immutable settings, so one instance can be
//! shared across concurrent requests as long as each uses its own output.

use crate::audio::PcmAudio;
use crate::config::EncoderConfig;
use crate::error::{MAX_ERROR_CHARS, Result, TtsError, truncate_message};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Encoder process wrapper.
#[derive(Debug, Clone)]
pub struct Transcoder {
    binary: PathBuf,
    codec: String,
    quality: String,
    format: String,
    timeout: Duration,
}

impl Transcoder {
    /// Build a transcoder from config, resolving the encoder binary.
    pub fn from_config(config: &EncoderConfig) -> Self {
        Self {
            binary: config.resolve_binary(),
            codec: config.codec.clone(),
            quality: config.quality.clone(),
            format: config.format.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Replace the encoder binary.
    #[must_use]
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Encoder binary in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Command-line arguments for encoding into `output`.
    pub fn args(&self, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-f",
            "wav",
            "-i",
            "pipe:0",
            "-codec:a",
            self.codec.as_str(),
            "-q:a",
            self.quality.as_str(),
            "-f",
            self.format.as_str(),
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(output.as_os_str().to_owned());
        args
    }

    /// Encode `pcm` into `output`.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::Encoder`] if the process cannot be spawned or
    /// exits non-zero (carrying its truncated stderr), and
    /// [`TtsError::Timeout`] if it outlives the configured timeout.
    pub async fn encode(&self, pcm: &PcmAudio, output: &Path) -> Result<()> {
        let wav = pcm.to_wav_bytes()?;

        let mut command = Command::new(&self.binary);
        command
            .args(self.args(output))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            TtsError::Encoder(format!(
                "failed to spawn {}: {e}",
                self.binary.display()
            ))
        })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| TtsError::Encoder("failed to open encoder stdin".to_string()))?;

        // Write from a separate task so a full stderr pipe cannot deadlock us.
        let write_task = tokio::spawn(async move {
            let result = stdin.write_all(&wav).await;
            drop(stdin);
            result
        });

        let output_status = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                TtsError::Timeout(format!(
                    "encoder timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| TtsError::Encoder(format!("failed to wait for encoder: {e}")))?;

        if !output_status.status.success() {
            let stderr = String::from_utf8_lossy(&output_status.stderr);
            let detail = truncate_message(stderr.trim(), MAX_ERROR_CHARS);
            return Err(TtsError::Encoder(format!(
                "{} exited with {}: {detail}",
                self.binary
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "encoder".to_owned()),
                output_status.status
            )));
        }

        match write_task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(TtsError::Encoder(format!(
                    "failed to write to encoder stdin: {e}"
                )));
            }
            Err(e) => return Err(TtsError::Encoder(format!("stdin task failed: {e}"))),
        }

        debug!(output = %output.display(), samples = pcm.len(), "encoded audio");
        Ok(())
    }
}
