//! Request and response records carried in protocol frames.

use crate::error::{Result, TtsError};
use serde::{Deserialize, Serialize};

/// Validation message for an empty or missing field.
pub const MISSING_FIELDS: &str = "missing text or output";

/// A synthesis request from client -> daemon.
///
/// Absent fields decode as empty strings so that validation, not parsing,
/// rejects them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub output: String,
}

impl SynthesisRequest {
    /// Build a request.
    #[must_use]
    pub fn new(text: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            output: output.into(),
        }
    }

    /// Text with surrounding whitespace removed.
    #[must_use]
    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Check both fields are present and the text fits `max_text_bytes`.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::InvalidRequest`] describing the first problem found.
    pub fn validate(&self, max_text_bytes: usize) -> Result<()> {
        if self.trimmed_text().is_empty() || self.output.is_empty() {
            return Err(TtsError::InvalidRequest(MISSING_FIELDS.to_owned()));
        }
        let len = self.trimmed_text().len();
        if len > max_text_bytes {
            return Err(TtsError::InvalidRequest(format!(
                "text exceeds maximum size: {len} bytes (limit: {max_text_bytes} bytes)"
            )));
        }
        Ok(())
    }
}

/// A response from daemon -> client. `error` is present iff `ok` is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisResponse {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl SynthesisResponse {
    /// Build a successful response.
    #[must_use]
    pub fn success() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    /// Build an error response. An empty message is replaced so the error
    /// field is never blank.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            ok: false,
            error: Some(if message.trim().is_empty() {
                "unknown error".to_owned()
            } else {
                message
            }),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Convert into a `Result`, treating `ok:false` as a daemon error.
    ///
    /// # Errors
    ///
    /// Returns [`TtsError::Daemon`] carrying the reported message.
    pub fn into_result(self) -> Result<()> {
        if self.ok {
            Ok(())
        } else {
            Err(TtsError::Daemon(
                self.error.unwrap_or_else(|| "daemon error".to_owned()),
            ))
        }
    }
}
