//! Error types for parley.

/// Top-level error type for synthesis, transport, and orchestration.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// Request was rejected before any synthesis work began.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A wire frame could not be decoded or encoded.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Voice model loading error.
    #[error("model error: {0}")]
    Model(String),

    /// Text-to-PCM synthesis error.
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// External encoder process error.
    #[error("encoder error: {0}")]
    Encoder(String),

    /// Remote synthesis service error.
    #[error("remote error: {0}")]
    Remote(String),

    /// Local daemon client error (connection, `ok:false` reply).
    #[error("daemon error: {0}")]
    Daemon(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// A bounded wait expired.
    #[error("timed out: {0}")]
    Timeout(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every eligible backend was tried and none succeeded.
    #[error("all backends failed: {last_error}")]
    AllBackendsFailed {
        /// Error reported by the last backend that was attempted, if any.
        last_error: String,
    },
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, TtsError>;

/// Maximum length of an error message placed on the wire.
pub const MAX_ERROR_CHARS: usize = 200;

/// Truncate `message` to at most `max_chars` characters.
///
/// Cuts on a char boundary so multi-byte text never splits.
#[must_use]
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => message[..idx].to_owned(),
        None => message.to_owned(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn short_message_is_unchanged() {
        assert_eq!(truncate_message("boom", 200), "boom");
    }

    #[test]
    fn long_message_is_capped() {
        let long = "x".repeat(500);
        assert_eq!(truncate_message(&long, MAX_ERROR_CHARS).len(), 200);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        let cut = truncate_message(&text, 3);
        assert_eq!(cut, "ééé");
    }

    #[test]
    fn all_backends_failed_names_last_error() {
        let err = TtsError::AllBackendsFailed {
            last_error: "encoder error: exit 1".into(),
        };
        assert!(err.to_string().contains("exit 1"));
    }
}
