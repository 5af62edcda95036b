//! Application directory paths for parley.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Environment Overrides
//!
//! - `PARLEY_DATA_DIR` overrides [`data_dir`]
//! - `PARLEY_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

/// File name of the default Piper voice.
pub const DEFAULT_VOICE_FILE: &str = "en_US-lessac-high.onnx";

/// Default daemon socket location.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/piper-tts.sock";

/// Application data root directory (`dirs::data_dir()/parley/`).
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PARLEY_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join("parley"))
        .unwrap_or_else(|| PathBuf::from("/tmp/parley-data"))
}

/// Application config directory (`dirs::config_dir()/parley/`).
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("PARLEY_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join("parley"))
        .unwrap_or_else(|| PathBuf::from("/tmp/parley-config"))
}

/// Directory holding Piper voices (`data_dir()/models/piper/`).
#[must_use]
pub fn piper_models_dir() -> PathBuf {
    data_dir().join("models").join("piper")
}

/// Default voice model path.
#[must_use]
pub fn default_model_path() -> PathBuf {
    piper_models_dir().join(DEFAULT_VOICE_FILE)
}

/// Fallback encoder location used when `ffmpeg` is not on `PATH`.
#[must_use]
pub fn user_local_ffmpeg() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".local").join("bin").join("ffmpeg"))
        .unwrap_or_else(|| PathBuf::from("/usr/local/bin/ffmpeg"))
}
