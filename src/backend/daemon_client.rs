//! Client side of the daemon protocol.

use super::{BackendKind, SynthesisBackend};
use crate::error::{Result, TtsError};
use crate::protocol::{FrameDecoder, SynthesisRequest, SynthesisResponse, encode_frame};
use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

/// Sends one request to a running daemon and waits for its reply.
#[derive(Debug, Clone)]
pub struct DaemonBackend {
    socket_path: PathBuf,
    model_path: PathBuf,
    timeout: Duration,
}

impl DaemonBackend {
    /// `timeout` bounds the connect and, separately, the response read.
    pub fn new(
        socket_path: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Self {
        Self {
            socket_path: socket_path.into(),
            model_path: model_path.into(),
            timeout,
        }
    }

    async fn exchange(&self, request: &SynthesisRequest) -> Result<SynthesisResponse> {
        let socket = self.socket_path.display();
        let mut stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| TtsError::Timeout(format!("connect to {socket} timed out")))?
            .map_err(|e| TtsError::Daemon(format!("failed to connect to {socket}: {e}")))?;

        let frame = encode_frame(request)?;
        tokio::time::timeout(self.timeout, async {
            stream.write_all(&frame).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| {
            TtsError::Timeout(format!(
                "sending request to {socket} timed out after {} seconds",
                self.timeout.as_secs()
            ))
        })??;

        tokio::time::timeout(self.timeout, read_response(&mut stream))
            .await
            .map_err(|_| {
                TtsError::Timeout(format!(
                    "no daemon response within {} seconds",
                    self.timeout.as_secs()
                ))
            })?
    }
}

async fn read_response(stream: &mut UnixStream) -> Result<SynthesisResponse> {
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; 4096];
    loop {
        if let Some(frame) = decoder.next_frame::<SynthesisResponse>() {
            return frame;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Err(TtsError::Daemon(
                "daemon closed the connection before responding".into(),
            ));
        }
        decoder.push(&chunk[..n]);
    }
}

#[async_trait]
impl SynthesisBackend for DaemonBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Daemon
    }

    fn is_available(&self) -> bool {
        self.socket_path.exists() && self.model_path.exists()
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()> {
        let trimmed = SynthesisRequest::new(request.trimmed_text(), request.output.as_str());
        let response = self.exchange(&trimmed).await?;
        debug!(ok = response.is_ok(), "daemon replied");
        response.into_result()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use tokio::net::UnixListener;

    fn backend(dir: &std::path::Path, timeout: Duration) -> (DaemonBackend, PathBuf) {
        let socket = dir.join("d.sock");
        let model = dir.join("voice.onnx");
        std::fs::write(&model, b"model").unwrap();
        (DaemonBackend::new(&socket, &model, timeout), socket)
    }

    #[test]
    fn requires_socket_and_model() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_secs(1));
        assert!(!backend.is_available());

        let _listener = std::os::unix::net::UnixListener::bind(&socket).unwrap();
        assert!(backend.is_available());

        std::fs::remove_file(dir.path().join("voice.onnx")).unwrap();
        assert!(!backend.is_available());
    }

    #[tokio::test]
    async fn silent_daemon_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_millis(100));
        let listener = UnixListener::bind(&socket).unwrap();
        let hold = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(2)).await;
            drop(stream);
        });

        let err = backend
            .synthesize(&SynthesisRequest::new("hello", "/tmp/x.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Timeout(_)));
        hold.abort();
    }

    #[tokio::test]
    async fn daemon_that_never_reads_times_out_on_send() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_millis(200));
        let listener = UnixListener::bind(&socket).unwrap();
        let hold = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        // Far larger than the socket buffer, so the write cannot complete.
        let text = "x".repeat(8 * 1024 * 1024);
        let err = backend
            .synthesize(&SynthesisRequest::new(text, "/tmp/x.mp3"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, TtsError::Timeout(ref msg) if msg.contains("sending request")),
            "got {err:?}"
        );
        hold.abort();
    }

    #[tokio::test]
    async fn ok_false_reply_is_daemon_error() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_secs(2));
        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = stream.read(&mut buf).await.unwrap();
            stream
                .write_all(b"{\"ok\":false,\"error\":\"encoder error: exit 1\"}\n")
                .await
                .unwrap();
        });

        let err = backend
            .synthesize(&SynthesisRequest::new("hello", "/tmp/x.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Daemon(msg) if msg.contains("exit 1")));
    }

    #[tokio::test]
    async fn garbled_reply_is_protocol_error() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_secs(2));
        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 256];
            let _ = stream.read(&mut buf).await.unwrap();
            stream.write_all(b"<html>\n").await.unwrap();
        });

        let err = backend
            .synthesize(&SynthesisRequest::new("hello", "/tmp/x.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Protocol(_)));
    }

    #[tokio::test]
    async fn hangup_before_reply_is_daemon_error() {
        let dir = tempfile::tempdir().unwrap();
        let (backend, socket) = backend(dir.path(), Duration::from_secs(2));
        let listener = UnixListener::bind(&socket).unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let err = backend
            .synthesize(&SynthesisRequest::new("hello", "/tmp/x.mp3"))
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Daemon(_) | TtsError::Io(_)));
    }
}
