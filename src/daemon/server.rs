//! Unix socket listener for the synthesis daemon.

use super::{DaemonContext, handle_connection};
use crate::error::{Result, TtsError};
use std::os::unix::fs::{FileTypeExt, PermissionsExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Socket permission bits: owner read/write only.
const SOCKET_MODE: u32 = 0o600;

/// Bound daemon listener.
#[derive(Debug)]
pub struct DaemonServer {
    listener: UnixListener,
    socket_path: PathBuf,
    context: Arc<DaemonContext>,
}

impl DaemonServer {
    /// Bind `socket_path`, replacing a stale socket left by a previous run.
    ///
    /// The socket is bound inside a private (0700) staging directory next to
    /// the final path, restricted to 0600, and then renamed into place, so it
    /// is never reachable with looser permissions.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-socket file occupies the path, or if
    /// binding, setting permissions, or moving the socket fails.
    pub fn bind(socket_path: impl Into<PathBuf>, context: DaemonContext) -> Result<Self> {
        let socket_path = socket_path.into();
        remove_stale_socket(&socket_path)?;

        let parent = match socket_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent)?;

        let staging = tempfile::Builder::new()
            .prefix(".parley-bind-")
            .tempdir_in(&parent)?;
        let staged = staging.path().join("sock");

        let listener = UnixListener::bind(&staged).map_err(|e| {
            TtsError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to bind {}: {e}", socket_path.display()),
            ))
        })?;
        std::fs::set_permissions(&staged, std::fs::Permissions::from_mode(SOCKET_MODE))?;
        std::fs::rename(&staged, &socket_path)?;
        drop(staging);

        info!(socket = %socket_path.display(), "listening");
        Ok(Self {
            listener,
            socket_path,
            context: Arc::new(context),
        })
    }

    /// Path the server is bound to.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Accept connections until `shutdown` is cancelled.
    ///
    /// Each accepted client runs on its own task. Accept errors are logged
    /// and do not stop the loop. The socket file is removed on return.
    pub async fn serve_until(self, shutdown: CancellationToken) -> Result<()> {
        loop {
            tokio::select! {
                () = shutdown.cancelled() => {
                    info!("shutdown requested; closing listener");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, _addr)) => {
                        debug!("accepted connection");
                        tokio::spawn(handle_connection(stream, Arc::clone(&self.context)));
                    }
                    Err(e) => {
                        error!(error = %e, "accept failed");
                    }
                },
            }
        }

        if let Err(e) = std::fs::remove_file(&self.socket_path) {
            warn!(socket = %self.socket_path.display(), error = %e, "failed to remove socket");
        }
        Ok(())
    }

    /// Accept connections forever.
    pub async fn serve(self) -> Result<()> {
        self.serve_until(CancellationToken::new()).await
    }
}

/// Unlink `path` if it is a leftover socket. Anything else is left alone.
fn remove_stale_socket(path: &Path) -> Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_socket() => {
            info!(socket = %path.display(), "removing stale socket");
            std::fs::remove_file(path)?;
            Ok(())
        }
        Ok(_) => Err(TtsError::Config(format!(
            "refusing to replace non-socket file at {}",
            path.display()
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
