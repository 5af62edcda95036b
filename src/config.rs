//! Configuration types for the synthesis client and daemon.

use crate::parley_dirs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Daemon socket and request policy.
    pub daemon: DaemonConfig,
    /// Local voice model location.
    pub model: ModelConfig,
    /// External encoder settings.
    pub encoder: EncoderConfig,
    /// Remote synthesis service settings.
    pub remote: RemoteConfig,
    /// Client-side daemon connection settings.
    pub client: ClientConfig,
}

/// Daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Unix socket the daemon listens on and the client connects to.
    pub socket_path: PathBuf,
    /// Largest accepted request text in bytes.
    pub max_text_bytes: usize,
    /// Per-request synthesis timeout in seconds.
    pub synthesis_timeout_secs: u64,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(parley_dirs::DEFAULT_SOCKET_PATH),
            max_text_bytes: 64 * 1024,
            synthesis_timeout_secs: 120,
        }
    }
}

impl DaemonConfig {
    /// Synthesis timeout as a [`Duration`].
    #[must_use]
    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

/// Voice model configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the Piper `.onnx` voice. The `.onnx.json` sits next to it.
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: parley_dirs::default_model_path(),
        }
    }
}

/// Encoder (`ffmpeg`) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Explicit encoder binary. `None` searches `PATH`, then `~/.local/bin`.
    pub binary: Option<PathBuf>,
    /// Audio codec passed to `-codec:a`.
    pub codec: String,
    /// VBR quality passed to `-q:a`.
    pub quality: String,
    /// Output container passed to `-f`.
    pub format: String,
    /// Encoder process timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            binary: None,
            codec: "libmp3lame".to_owned(),
            quality: "4".to_owned(),
            format: "mp3".to_owned(),
            timeout_secs: 60,
        }
    }
}

impl EncoderConfig {
    /// Resolve the encoder binary.
    #[must_use]
    pub fn resolve_binary(&self) -> PathBuf {
        if let Some(ref binary) = self.binary {
            return binary.clone();
        }
        which::which("ffmpeg").unwrap_or_else(|_| parley_dirs::user_local_ffmpeg())
    }
}

/// Remote synthesis service configuration.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Service URL accepting speech requests. Empty disables the backend.
    pub endpoint: String,
    /// Voice name requested from the service.
    pub voice: String,
    /// Speaking rate adjustment, e.g. `+35%`.
    pub rate: String,
    /// Audio container requested from the service.
    pub response_format: String,
    /// Optional bearer token.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            voice: "en-US-GuyNeural".to_owned(),
            rate: "+35%".to_owned(),
            response_format: "mp3".to_owned(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("endpoint", &self.endpoint)
            .field("voice", &self.voice)
            .field("rate", &self.rate)
            .field("response_format", &self.response_format)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Client-side settings for talking to the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Bounded wait for both connect and response read, in seconds.
    pub daemon_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            daemon_timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    /// Daemon wait as a [`Duration`].
    #[must_use]
    pub fn daemon_timeout(&self) -> Duration {
        Duration::from_secs(self.daemon_timeout_secs)
    }
}

impl ParleyConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| crate::error::TtsError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &std::path::Path) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::TtsError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load `path` (or the default config path) if it exists, else defaults,
    /// then apply environment overrides.
    ///
    /// An explicitly given path must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load_or_default(path: Option<&std::path::Path>) -> crate::error::Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Self::default_config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Apply `PARLEY_*` overrides using `lookup` to read variables.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(socket) = lookup("PARLEY_SOCKET") {
            self.daemon.socket_path = PathBuf::from(socket);
        }
        if let Some(model) = lookup("PARLEY_MODEL") {
            self.model.path = PathBuf::from(model);
        }
        if let Some(endpoint) = lookup("PARLEY_REMOTE_ENDPOINT") {
            self.remote.endpoint = endpoint;
        }
        if let Some(key) = lookup("PARLEY_REMOTE_API_KEY") {
            self.remote.api_key = Some(key);
        }
    }

    /// Returns the default config file path: `<config_dir>/config.toml`.
    pub fn default_config_path() -> PathBuf {
        parley_dirs::config_dir().join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = ParleyConfig::default();
        assert!(config.daemon.max_text_bytes > 0);
        assert!(config.daemon.synthesis_timeout_secs > 0);
        assert_eq!(config.client.daemon_timeout_secs, 30);
        assert_eq!(config.encoder.codec, "libmp3lame");
        assert!(config.remote.endpoint.is_empty());
        assert!(config.model.path.to_string_lossy().ends_with(".onnx"));
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ParleyConfig::default();
        config.daemon.socket_path = PathBuf::from("/run/user/1000/parley.sock");
        config.remote.endpoint = "https://tts.example.com/v1/speech".to_owned();
        config.encoder.quality = "2".to_owned();

        config.save_to_file(&path).unwrap();
        let loaded = ParleyConfig::from_file(&path).unwrap();
        assert_eq!(
            loaded.daemon.socket_path,
            PathBuf::from("/run/user/1000/parley.sock")
        );
        assert_eq!(loaded.remote.endpoint, "https://tts.example.com/v1/speech");
        assert_eq!(loaded.encoder.quality, "2");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[client]\ndaemon_timeout_secs = 5\n").unwrap();

        let loaded = ParleyConfig::from_file(&path).unwrap();
        assert_eq!(loaded.client.daemon_timeout_secs, 5);
        assert_eq!(loaded.remote.voice, "en-US-GuyNeural");
        assert_eq!(loaded.daemon.max_text_bytes, 64 * 1024);
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = ParleyConfig::from_file(&path);
        assert!(matches!(result, Err(crate::TtsError::Config(_))));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result =
            ParleyConfig::load_or_default(Some(std::path::Path::new("/nonexistent/parley.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn overrides_replace_paths_and_remote() {
        let vars: HashMap<&str, &str> = [
            ("PARLEY_SOCKET", "/tmp/override.sock"),
            ("PARLEY_MODEL", "/opt/voices/amy.onnx"),
            ("PARLEY_REMOTE_ENDPOINT", "http://127.0.0.1:9000/speech"),
        ]
        .into_iter()
        .collect();

        let mut config = ParleyConfig::default();
        config.apply_overrides(|key| vars.get(key).map(|v| (*v).to_owned()));

        assert_eq!(config.daemon.socket_path, PathBuf::from("/tmp/override.sock"));
        assert_eq!(config.model.path, PathBuf::from("/opt/voices/amy.onnx"));
        assert_eq!(config.remote.endpoint, "http://127.0.0.1:9000/speech");
        assert!(config.remote.api_key.is_none());
    }

    #[test]
    fn debug_redacts_api_key() {
        let remote = RemoteConfig {
            api_key: Some("sk-secret".to_owned()),
            ..RemoteConfig::default()
        };
        let rendered = format!("{remote:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
