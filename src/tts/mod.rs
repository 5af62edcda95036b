//! Text-to-speech synthesis engines.
//!
//! A [`SpeechEngine`] turns text into [`PcmAudio`] in the fixed
//! mono/16-bit/22050 Hz format. Engines are loaded once and reused; the
//! daemon holds one behind an `Arc` and shares it across every connection.
//! The bundled engine is a Piper VITS voice run through ONNX Runtime.

mod piper;

pub use piper::{PiperLoader, PiperVoice};

use crate::audio::PcmAudio;
use crate::error::Result;
use std::path::Path;
use std::sync::Arc;

/// A loaded voice that can synthesize repeatedly without reloading.
pub trait SpeechEngine: Send + Sync {
    /// Synthesize `text` to PCM.
    ///
    /// Blocking; async callers should run it on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns an error if phonemization or inference fails.
    fn synthesize(&self, text: &str) -> Result<PcmAudio>;
}

/// Loads a voice model from disk.
pub trait ModelLoader: Send + Sync {
    /// Load the model at `path`. Expensive; called once per daemon and once
    /// per direct synthesis.
    ///
    /// # Errors
    ///
    /// Returns an error if the model files are missing or invalid.
    fn load(&self, path: &Path) -> Result<Arc<dyn SpeechEngine>>;
}
