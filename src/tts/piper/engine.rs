//! Piper ONNX inference engine.
//!
//! normalize → split sentences → phonemize → ids → ONNX inference → 22.05 kHz audio.

use super::phonemize::{Phonemizer, normalize_text, phoneme_ids, split_sentences};
use crate::audio::{PcmAudio, SAMPLE_RATE};
use crate::error::{Result, TtsError};
use crate::tts::{ModelLoader, SpeechEngine};
use ort::session::Session;
use ort::value::Tensor;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Silence inserted between sentences, in samples (0.2 s).
const SENTENCE_GAP_SAMPLES: usize = SAMPLE_RATE as usize / 5;

/// Voice configuration stored next to the model as `<model>.onnx.json`.
#[derive(Debug, Clone, Deserialize)]
struct VoiceConfig {
    audio: AudioSection,
    #[serde(default)]
    inference: InferenceSection,
    #[serde(default)]
    num_speakers: u32,
    phoneme_id_map: HashMap<String, Vec<i64>>,
}

#[derive(Debug, Clone, Deserialize)]
struct AudioSection {
    sample_rate: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct InferenceSection {
    noise_scale: f32,
    length_scale: f32,
    noise_w: f32,
}

impl Default for InferenceSection {
    fn default() -> Self {
        Self {
            noise_scale: 0.667,
            length_scale: 1.0,
            noise_w: 0.8,
        }
    }
}

/// State touched by inference. The ort session needs exclusive access per
/// run, so it lives behind the voice's mutex with the phonemizer.
struct Runtime {
    session: Session,
    phonemizer: Phonemizer,
}

/// A Piper voice held in memory.
///
/// Synthesis calls from multiple threads are serialized on an internal
/// mutex; callers can still overlap I/O and encoding around them.
pub struct PiperVoice {
    runtime: Mutex<Runtime>,
    config: VoiceConfig,
}

impl PiperVoice {
    /// Load a voice from `<path>` and `<path>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or invalid, or if the
    /// voice does not output 22050 Hz audio.
    pub fn load(model_path: &Path) -> Result<Self> {
        if !model_path.exists() {
            return Err(TtsError::Model(format!(
                "model file not found: {}",
                model_path.display()
            )));
        }
        let config_path = voice_config_path(model_path);
        let config = load_voice_config(&config_path)?;

        if config.audio.sample_rate != SAMPLE_RATE {
            return Err(TtsError::Model(format!(
                "voice outputs {} Hz, expected {SAMPLE_RATE} Hz",
                config.audio.sample_rate
            )));
        }

        info!(model = %model_path.display(), "loading Piper ONNX model");
        let session = Session::builder()
            .and_then(|b| Ok(b.with_intra_threads(4)?))
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| TtsError::Model(format!("failed to load Piper ONNX model: {e}")))?;

        info!(
            phonemes = config.phoneme_id_map.len(),
            speakers = config.num_speakers,
            "Piper voice ready"
        );

        Ok(Self {
            runtime: Mutex::new(Runtime {
                session,
                phonemizer: Phonemizer::new(),
            }),
            config,
        })
    }

    fn synthesize_sentence(&self, runtime: &mut Runtime, sentence: &str) -> Result<Vec<f32>> {
        let ipa = runtime.phonemizer.phonemize(sentence)?;
        let (ids, skipped) = phoneme_ids(&ipa, &self.config.phoneme_id_map)?;
        if skipped > 0 {
            warn!(skipped, "dropped phonemes missing from the voice's id map");
        }
        debug!(ipa = %ipa, ids = ids.len(), "phonemized sentence");
        self.run_inference(&mut runtime.session, &ids)
    }

    /// Run a single ONNX inference call.
    fn run_inference(&self, session: &mut Session, ids: &[i64]) -> Result<Vec<f32>> {
        use ort::session::{SessionInputValue, SessionInputs};

        let seq_len = ids.len();
        let scales = &self.config.inference;

        // input: shape [1, seq_len]
        let input = Tensor::from_array(([1_usize, seq_len], ids.to_vec()))
            .map_err(|e| TtsError::Synthesis(format!("failed to create input tensor: {e}")))?;

        // input_lengths: shape [1]
        let lengths = Tensor::from_array(([1_usize], vec![seq_len as i64]))
            .map_err(|e| TtsError::Synthesis(format!("failed to create lengths tensor: {e}")))?;

        // scales: shape [3]
        let scales = Tensor::from_array((
            [3_usize],
            vec![scales.noise_scale, scales.length_scale, scales.noise_w],
        ))
        .map_err(|e| TtsError::Synthesis(format!("failed to create scales tensor: {e}")))?;

        let mut feed: HashMap<String, SessionInputValue> = HashMap::new();
        feed.insert("input".to_string(), input.into());
        feed.insert("input_lengths".to_string(), lengths.into());
        feed.insert("scales".to_string(), scales.into());

        if self.config.num_speakers > 1 {
            let sid = Tensor::from_array(([1_usize], vec![0_i64]))
                .map_err(|e| TtsError::Synthesis(format!("failed to create sid tensor: {e}")))?;
            feed.insert("sid".to_string(), sid.into());
        }

        let outputs = session
            .run(SessionInputs::from(feed))
            .map_err(|e| TtsError::Synthesis(format!("ONNX inference failed: {e}")))?;

        // Output: shape [1, 1, 1, num_samples]
        let (_shape, data) = outputs[0_usize]
            .try_extract_tensor::<f32>()
            .map_err(|e| TtsError::Synthesis(format!("failed to extract output tensor: {e}")))?;

        Ok(data.to_vec())
    }
}

impl SpeechEngine for PiperVoice {
    fn synthesize(&self, text: &str) -> Result<PcmAudio> {
        let normalized = normalize_text(text);
        let sentences = split_sentences(&normalized);
        if sentences.is_empty() {
            return Err(TtsError::Synthesis("nothing to synthesize".into()));
        }

        let start = std::time::Instant::now();
        let mut runtime = self
            .runtime
            .lock()
            .map_err(|_| TtsError::Synthesis("voice runtime lock poisoned".into()))?;

        let mut samples: Vec<f32> = Vec::new();
        for (i, sentence) in sentences.iter().enumerate() {
            if i > 0 {
                samples.extend(std::iter::repeat_n(0.0, SENTENCE_GAP_SAMPLES));
            }
            samples.extend(self.synthesize_sentence(&mut runtime, sentence)?);
        }
        drop(runtime);

        let pcm = PcmAudio::from_f32_normalized(&samples);
        info!(
            sentences = sentences.len(),
            audio_secs = f64::from(pcm.duration_secs()),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "synthesized"
        );
        Ok(pcm)
    }
}

/// [`ModelLoader`] for [`PiperVoice`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PiperLoader;

impl ModelLoader for PiperLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn SpeechEngine>> {
        Ok(Arc::new(PiperVoice::load(path)?))
    }
}

/// `<model>.onnx` → `<model>.onnx.json`.
fn voice_config_path(model_path: &Path) -> PathBuf {
    let mut name = model_path.as_os_str().to_owned();
    name.push(".json");
    PathBuf::from(name)
}

fn load_voice_config(path: &Path) -> Result<VoiceConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        TtsError::Model(format!(
            "failed to read voice config {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| TtsError::Model(format!("failed to parse voice config: {e}")))
}
