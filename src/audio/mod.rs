//! Raw PCM audio in the fixed synthesis format.

pub mod pcm;

pub use pcm::{BITS_PER_SAMPLE, CHANNELS, PcmAudio, SAMPLE_RATE};
