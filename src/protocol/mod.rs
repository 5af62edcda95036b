//! Newline-delimited JSON wire protocol between client and daemon.
//!
//! Request:  `{"text": "...", "output": "/tmp/out.mp3"}\n`
//! Response: `{"ok":true}\n` or `{"ok":false,"error":"..."}\n`

pub mod codec;
pub mod contract;

pub use codec::{FrameDecoder, encode_frame};
pub use contract::{SynthesisRequest, SynthesisResponse};
