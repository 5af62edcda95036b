//! Piper VITS voice: misaki G2P phonemization plus single-model ONNX inference.

mod engine;
mod phonemize;

pub use engine::{PiperLoader, PiperVoice};
