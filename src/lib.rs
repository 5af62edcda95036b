//! parley: text-to-speech with automatic backend fallback.
//!
//! A request `(text, output path)` is served by the first backend that
//! succeeds, in a fixed priority order:
//! Remote service → local daemon → in-process model
//!
//! # Architecture
//!
//! - **tts**: Piper voice model (ONNX) behind the [`tts::SpeechEngine`] trait
//! - **transcode**: `ffmpeg` subprocess turning PCM into the output container
//! - **protocol**: newline-delimited JSON frames between client and daemon
//! - **daemon**: Unix socket server keeping one voice resident for all clients
//! - **backend**: remote, daemon-client, and direct implementations
//! - **orchestrator**: explicit fallback state machine over the backends

pub mod audio;
pub mod backend;
pub mod config;
pub mod daemon;
pub mod error;
pub mod orchestrator;
pub mod parley_dirs;
pub mod protocol;
pub mod render;
pub mod transcode;
pub mod tts;

pub use config::ParleyConfig;
pub use error::{Result, TtsError};
pub use orchestrator::{Orchestrator, Synthesized};
pub use protocol::{SynthesisRequest, SynthesisResponse};
