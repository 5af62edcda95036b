//! Synthesis backends tried by the orchestrator.
//!
//! Each backend turns a [`SynthesisRequest`] into an audio file at the
//! request's output path. Backends report eligibility separately from
//! failure: [`SynthesisBackend::is_available`] is a cheap precondition check
//! (endpoint configured, socket and model present) made before any attempt.

mod daemon_client;
mod direct;
mod remote;

pub use daemon_client::DaemonBackend;
pub use direct::DirectBackend;
pub use remote::RemoteBackend;

use crate::error::Result;
use crate::protocol::SynthesisRequest;
use async_trait::async_trait;

/// Backend identity, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Remote network synthesis service.
    Network,
    /// Local daemon with a resident model.
    Daemon,
    /// In-process model load.
    Direct,
}

/// Fixed attempt order: best quality first, slowest local path last.
pub const PRIORITY: [BackendKind; 3] = [
    BackendKind::Network,
    BackendKind::Daemon,
    BackendKind::Direct,
];

impl BackendKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Daemon => "daemon",
            Self::Direct => "direct",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One strategy for producing an audio file from text.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> BackendKind;

    /// Whether the backend's preconditions hold right now.
    fn is_available(&self) -> bool;

    /// Synthesize `request.text` into `request.output`.
    ///
    /// # Errors
    ///
    /// Returns the backend-specific failure.
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<()>;
}
