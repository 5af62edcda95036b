//! Per-connection request loop.

use crate::daemon::DaemonContext;
use crate::error::{MAX_ERROR_CHARS, Result, truncate_message};
use crate::protocol::{FrameDecoder, SynthesisRequest, SynthesisResponse, encode_frame};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

/// Read buffer size per `read` call.
const READ_CHUNK: usize = 4096;

/// Serve one client until it closes the stream.
///
/// Requests on this connection are processed strictly in arrival order and
/// each gets exactly one response frame. Malformed or invalid requests are
/// answered with an error frame and the loop keeps reading. The write half
/// is shut down on every exit path.
pub async fn handle_connection<S>(stream: S, context: Arc<DaemonContext>)
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    let (mut reader, mut writer) = tokio::io::split(stream);

    match serve(&mut reader, &mut writer, &context).await {
        Ok(served) => debug!(served, "client disconnected"),
        Err(e) => warn!(error = %e, "connection ended with error"),
    }

    if let Err(e) = writer.shutdown().await {
        debug!(error = %e, "failed to shut down connection");
    }
}

async fn serve<R, W>(reader: &mut R, writer: &mut W, context: &DaemonContext) -> Result<usize>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut decoder = FrameDecoder::new();
    let mut chunk = [0u8; READ_CHUNK];
    let mut served = 0usize;

    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            if decoder.pending() > 0 {
                debug!(
                    bytes = decoder.pending(),
                    "discarding unterminated frame at EOF"
                );
            }
            return Ok(served);
        }
        decoder.push(&chunk[..n]);

        while let Some(frame) = decoder.next_frame::<SynthesisRequest>() {
            let response = match frame {
                Ok(request) => context.process(&request).await,
                Err(e) => {
                    warn!(error = %e, "malformed request frame");
                    SynthesisResponse::failure(truncate_message(
                        &format!("malformed request: {e}"),
                        MAX_ERROR_CHARS,
                    ))
                }
            };
            writer.write_all(&encode_frame(&response)?).await?;
            writer.flush().await?;
            served += 1;
        }
    }
}
