//! Mono 16-bit 22050 Hz PCM, the hand-off between engine and encoder.

use crate::error::{Result, TtsError};
use std::io::Cursor;

/// Output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 22_050;

/// Channel count (mono).
pub const CHANNELS: u16 = 1;

/// Sample width in bits.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Peak floor used when normalizing float audio, so near-silence is not
/// amplified into noise.
const MIN_PEAK: f32 = 0.01;

/// Synthesized audio samples.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PcmAudio {
    samples: Vec<i16>,
}

impl PcmAudio {
    /// Wrap already-quantized samples.
    #[must_use]
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    /// Quantize float samples, scaling so the loudest sample hits full range.
    #[must_use]
    pub fn from_f32_normalized(samples: &[f32]) -> Self {
        let peak = samples
            .iter()
            .filter(|s| s.is_finite())
            .map(|s| s.abs())
            .fold(0.0f32, f32::max)
            .max(MIN_PEAK);
        let scale = f32::from(i16::MAX) / peak;
        let samples = samples
            .iter()
            .map(|&s| {
                let s = if s.is_finite() { s } else { 0.0 };
                (s * scale).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
            })
            .collect();
        Self { samples }
    }

    /// Borrow the samples.
    #[must_use]
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// `true` if there is no audio.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds at [`SAMPLE_RATE`].
    #[must_use]
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }

    /// Raw little-endian bytes (`s16le`).
    #[must_use]
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.samples.iter().flat_map(|s| s.to_le_bytes()).collect()
    }

    /// Pack the samples into an in-memory WAV container.
    ///
    /// # Errors
    ///
    /// Returns an error if the WAV writer fails.
    pub fn to_wav_bytes(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: CHANNELS,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: BITS_PER_SAMPLE,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::with_capacity(44 + self.samples.len() * 2));
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)
                .map_err(|e| TtsError::Encoder(format!("failed to create wav writer: {e}")))?;
            for &s in &self.samples {
                writer
                    .write_sample(s)
                    .map_err(|e| TtsError::Encoder(format!("failed to write wav sample: {e}")))?;
            }
            writer
                .finalize()
                .map_err(|e| TtsError::Encoder(format!("failed to finalize wav: {e}")))?;
        }
        Ok(cursor.into_inner())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn normalization_scales_peak_to_full_range() {
        let pcm = PcmAudio::from_f32_normalized(&[0.0, 0.5, -0.25]);
        assert_eq!(pcm.samples()[0], 0);
        assert_eq!(pcm.samples()[1], i16::MAX);
        assert_eq!(pcm.samples()[2], -(i16::MAX / 2));
    }

    #[test]
    fn near_silence_is_not_amplified() {
        let pcm = PcmAudio::from_f32_normalized(&[0.001, -0.001]);
        assert!(pcm.samples().iter().all(|s| s.abs() < 4000));
    }

    #[test]
    fn non_finite_samples_become_zero() {
        let pcm = PcmAudio::from_f32_normalized(&[f32::NAN, 1.0, f32::INFINITY]);
        assert_eq!(pcm.samples(), &[0, i16::MAX, 0]);
    }

    #[test]
    fn wav_header_describes_fixed_format() {
        let pcm = PcmAudio::new(vec![0, 100, -100, 2000]);
        let wav = pcm.to_wav_bytes().unwrap();

        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 22_050);
        assert_eq!(spec.bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![0, 100, -100, 2000]);
    }

    #[test]
    fn duration_uses_sample_rate() {
        let pcm = PcmAudio::new(vec![0; 22_050]);
        assert!((pcm.duration_secs() - 1.0).abs() < f32::EPSILON);
        assert_eq!(pcm.to_le_bytes().len(), 44_100);
    }
}
