//! Shared fakes for integration tests: a counting speech engine, a counting
//! model loader, and a shell-script encoder that copies its stdin to the
//! output path.

#![allow(dead_code)]

use parley::audio::PcmAudio;
use parley::config::{DaemonConfig, EncoderConfig};
use parley::daemon::{DaemonContext, DaemonServer};
use parley::render::Renderer;
use parley::transcode::Transcoder;
use parley::tts::{ModelLoader, SpeechEngine};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Engine returning a short tone and recording every text it was asked for.
#[derive(Default)]
pub struct CountingEngine {
    pub calls: AtomicUsize,
    pub texts: Mutex<Vec<String>>,
    pub delay: Option<Duration>,
    pub fail: bool,
}

impl CountingEngine {
    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().expect("lock text records").clone()
    }
}

impl SpeechEngine for CountingEngine {
    fn synthesize(&self, text: &str) -> parley::Result<PcmAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts
            .lock()
            .expect("lock text records")
            .push(text.to_owned());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(parley::TtsError::Synthesis("engine exploded".into()));
        }
        Ok(PcmAudio::new(vec![1000; 2205]))
    }
}

/// Loader handing out one shared engine and counting how often it is asked.
#[derive(Default)]
pub struct CountingLoader {
    pub loads: AtomicUsize,
    pub engine: Arc<CountingEngine>,
    pub fail: bool,
}

impl CountingLoader {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

impl ModelLoader for CountingLoader {
    fn load(&self, path: &Path) -> parley::Result<Arc<dyn SpeechEngine>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(parley::TtsError::Model(format!(
                "cannot load {}",
                path.display()
            )));
        }
        Ok(Arc::clone(&self.engine) as Arc<dyn SpeechEngine>)
    }
}

/// Write an executable `/bin/sh` script.
pub fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("chmod script");
    path
}

/// Encoder stand-in: the last argument is the output path, stdin is the WAV.
/// Written once per directory.
pub fn copy_encoder(dir: &Path) -> PathBuf {
    let existing = dir.join("fake-ffmpeg");
    if existing.exists() {
        return existing;
    }
    script(dir, "fake-ffmpeg", "for last; do :; done\ncat > \"$last\"")
}

pub fn encoder_config(binary: PathBuf) -> EncoderConfig {
    EncoderConfig {
        binary: Some(binary),
        timeout_secs: 10,
        ..EncoderConfig::default()
    }
}

/// A daemon running on a real Unix socket inside a test directory.
pub struct RunningDaemon {
    pub socket: PathBuf,
    pub shutdown: CancellationToken,
    pub task: JoinHandle<parley::Result<()>>,
}

impl RunningDaemon {
    pub async fn stop(self) {
        self.shutdown.cancel();
        self.task
            .await
            .expect("join daemon task")
            .expect("daemon exits cleanly");
    }
}

/// Bind and serve a daemon whose engine is `engine`.
pub fn start_daemon(dir: &Path, engine: Arc<CountingEngine>) -> RunningDaemon {
    let encoder = copy_encoder(dir);
    let transcoder = Transcoder::from_config(&encoder_config(encoder));
    let context = DaemonContext::new(
        Renderer::new(engine as Arc<dyn SpeechEngine>, transcoder),
        &DaemonConfig::default(),
    );

    let socket = dir.join("run").join("piper-tts.sock");
    let server = DaemonServer::bind(&socket, context).expect("bind daemon");
    let shutdown = CancellationToken::new();
    let task = tokio::spawn(server.serve_until(shutdown.clone()));

    RunningDaemon {
        socket,
        shutdown,
        task,
    }
}

pub fn request_line(text: &str, output: &Path) -> String {
    let mut line = serde_json::json!({ "text": text, "output": output }).to_string();
    line.push('\n');
    line
}
