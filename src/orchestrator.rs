//! Backend fallback as an explicit state machine.
//!
//! The orchestrator walks the fixed priority list one backend at a time:
//!
//! | state   | success              | failure | unavailable |
//! |---------|----------------------|---------|-------------|
//! | Network | Succeeded(Network)   | Daemon  | Daemon      |
//! | Daemon  | Succeeded(Daemon)    | Direct  | Direct      |
//! | Direct  | Succeeded(Direct)    | Failed  | Failed      |
//!
//! The first success ends the run; later backends are never touched. An
//! unavailable backend (no endpoint, no socket, no model) is skipped without
//! an attempt.
//!
//! # Example
//!
//! ```rust
//! use parley::orchestrator::{AttemptOutcome, State, transition};
//! use parley::backend::BackendKind;
//!
//! let state = transition(State::Network, AttemptOutcome::Failure);
//! assert_eq!(state, State::Daemon);
//! let state = transition(state, AttemptOutcome::Success);
//! assert_eq!(state, State::Succeeded(BackendKind::Daemon));
//! ```

use crate::backend::{BackendKind, DaemonBackend, DirectBackend, RemoteBackend, SynthesisBackend};
use crate::config::ParleyConfig;
use crate::error::{Result, TtsError};
use crate::protocol::SynthesisRequest;
use crate::transcode::Transcoder;
use crate::tts::ModelLoader;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

/// File name backends write to when the caller wants a stream.
const STAGED_FILE: &str = "speech";

/// Orchestration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Network,
    Daemon,
    Direct,
    Succeeded(BackendKind),
    Failed,
}

impl State {
    /// Backend attempted in this state, or `None` for terminal states.
    #[must_use]
    pub fn backend(self) -> Option<BackendKind> {
        match self {
            Self::Network => Some(BackendKind::Network),
            Self::Daemon => Some(BackendKind::Daemon),
            Self::Direct => Some(BackendKind::Direct),
            Self::Succeeded(_) | Self::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.backend().is_none()
    }
}

/// Result of visiting one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success,
    Failure,
    Unavailable,
}

/// Transition table. Terminal states are absorbing.
#[must_use]
pub fn transition(state: State, outcome: AttemptOutcome) -> State {
    use AttemptOutcome::{Failure, Success, Unavailable};
    match (state, outcome) {
        (State::Network, Success) => State::Succeeded(BackendKind::Network),
        (State::Network, Failure | Unavailable) => State::Daemon,
        (State::Daemon, Success) => State::Succeeded(BackendKind::Daemon),
        (State::Daemon, Failure | Unavailable) => State::Direct,
        (State::Direct, Success) => State::Succeeded(BackendKind::Direct),
        (State::Direct, Failure | Unavailable) => State::Failed,
        (terminal @ (State::Succeeded(_) | State::Failed), _) => terminal,
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synthesized {
    /// Backend that produced the file.
    pub backend: BackendKind,
    /// Backends actually attempted, in order (skipped ones excluded).
    pub attempted: Vec<BackendKind>,
}

/// Runs the fallback chain over three backends.
pub struct Orchestrator {
    network: Box<dyn SynthesisBackend>,
    daemon: Box<dyn SynthesisBackend>,
    direct: Box<dyn SynthesisBackend>,
}

impl Orchestrator {
    pub fn new(
        network: Box<dyn SynthesisBackend>,
        daemon: Box<dyn SynthesisBackend>,
        direct: Box<dyn SynthesisBackend>,
    ) -> Self {
        Self {
            network,
            daemon,
            direct,
        }
    }

    /// Build the standard chain from config.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote HTTP client cannot be constructed.
    pub fn from_config(config: &ParleyConfig, loader: Arc<dyn ModelLoader>) -> Result<Self> {
        let network = RemoteBackend::new(config.remote.clone())?;
        let daemon = DaemonBackend::new(
            &config.daemon.socket_path,
            &config.model.path,
            config.client.daemon_timeout(),
        );
        let direct = DirectBackend::new(
            &config.model.path,
            loader,
            Transcoder::from_config(&config.encoder),
        );
        Ok(Self::new(
            Box::new(network),
            Box::new(daemon),
            Box::new(direct),
        ))
    }

    fn backend(&self, kind: BackendKind) -> &dyn SynthesisBackend {
        match kind {
            BackendKind::Network => self.network.as_ref(),
            BackendKind::Daemon => self.daemon.as_ref(),
            BackendKind::Direct => self.direct.as_ref(),
        }
    }

    /// Produce `request.output` using the first backend that succeeds.
    ///
    /// A relative output path is resolved against this process's working
    /// directory before any backend sees it, since the daemon resolves
    /// paths against its own.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::InvalidRequest`] before any backend runs if the
    /// request is empty, or [`TtsError::AllBackendsFailed`] once the chain
    /// reaches the failed state.
    pub async fn run(&self, request: &SynthesisRequest) -> Result<Synthesized> {
        request.validate(usize::MAX)?;
        let output = std::path::absolute(&request.output).map_err(|e| {
            TtsError::InvalidRequest(format!("cannot resolve output {}: {e}", request.output))
        })?;
        let request = &SynthesisRequest::new(request.text.as_str(), output.to_string_lossy());

        let mut state = State::Network;
        let mut attempted = Vec::new();
        let mut last_error: Option<String> = None;

        loop {
            let Some(kind) = state.backend() else {
                return match state {
                    State::Succeeded(backend) => {
                        info!(%backend, "synthesis complete");
                        Ok(Synthesized { backend, attempted })
                    }
                    _ => Err(TtsError::AllBackendsFailed {
                        last_error: last_error
                            .unwrap_or_else(|| "no backend was available".to_owned()),
                    }),
                };
            };

            let backend = self.backend(kind);
            let outcome = if backend.is_available() {
                attempted.push(kind);
                match backend.synthesize(request).await {
                    Ok(()) => AttemptOutcome::Success,
                    Err(e) => {
                        warn!(backend = %kind, error = %e, "backend failed; falling back");
                        last_error = Some(format!("{kind}: {e}"));
                        AttemptOutcome::Failure
                    }
                }
            } else {
                info!(backend = %kind, "backend unavailable; skipping");
                AttemptOutcome::Unavailable
            };

            state = transition(state, outcome);
        }
    }

    /// Synthesize `text` and copy the finished audio into `sink`.
    ///
    /// Backends only write to paths, and neither the daemon's encoder nor an
    /// in-process encoder shares the caller's stdout. The audio is rendered
    /// into a private temporary directory first and streamed out afterwards.
    /// Nothing is written to `sink` unless a backend succeeds.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`Orchestrator::run`], or [`TtsError::Io`] if
    /// the temporary file cannot be created, read, or copied.
    pub async fn run_to_writer<W>(&self, text: &str, sink: &mut W) -> Result<Synthesized>
    where
        W: AsyncWrite + Unpin,
    {
        let scratch = tempfile::Builder::new().prefix("parley-").tempdir()?;
        let staged = scratch.path().join(STAGED_FILE);
        let request = SynthesisRequest::new(text, staged.to_string_lossy());

        let done = self.run(&request).await?;

        let mut audio = tokio::fs::File::open(&staged).await?;
        let bytes = tokio::io::copy(&mut audio, sink).await?;
        sink.flush().await?;
        debug!(bytes, backend = %done.backend, "streamed audio to writer");
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn success_is_terminal_from_every_active_state() {
        assert_eq!(
            transition(State::Network, AttemptOutcome::Success),
            State::Succeeded(BackendKind::Network)
        );
        assert_eq!(
            transition(State::Daemon, AttemptOutcome::Success),
            State::Succeeded(BackendKind::Daemon)
        );
        assert_eq!(
            transition(State::Direct, AttemptOutcome::Success),
            State::Succeeded(BackendKind::Direct)
        );
    }

    #[test]
    fn failures_follow_priority_order() {
        let mut state = State::Network;
        let mut visited = Vec::new();
        while let Some(kind) = state.backend() {
            visited.push(kind);
            state = transition(state, AttemptOutcome::Failure);
        }
        assert_eq!(visited, crate::backend::PRIORITY.to_vec());
        assert_eq!(state, State::Failed);
    }

    #[test]
    fn unavailable_moves_like_failure() {
        assert_eq!(
            transition(State::Network, AttemptOutcome::Unavailable),
            State::Daemon
        );
        assert_eq!(
            transition(State::Direct, AttemptOutcome::Unavailable),
            State::Failed
        );
    }

    #[test]
    fn terminal_states_absorb() {
        let done = State::Succeeded(BackendKind::Daemon);
        assert_eq!(transition(done, AttemptOutcome::Failure), done);
        assert_eq!(transition(State::Failed, AttemptOutcome::Success), State::Failed);
        assert!(done.is_terminal());
        assert!(!State::Direct.is_terminal());
    }
}
