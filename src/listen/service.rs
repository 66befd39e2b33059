//! Utterance capture: record one phrase and turn it into text.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::audio::{AudioFrameSource, MicrophoneFrameSource};
use crate::config::AudioConfig;
use crate::listen::recorder::{record_utterance, RecorderSettings, UtteranceRecorder};
use crate::stt::{clean_transcript, SttEngine, SttError, MAX_AUDIO_SAMPLES, MIN_AUDIO_SAMPLES};

// ---------------------------------------------------------------------------
// CaptureFailure
// ---------------------------------------------------------------------------

/// Why a capture produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    /// Silence, a timeout, or a transcript with no words in it.
    #[error("no speech understood")]
    NoSpeechUnderstood,

    /// The recognizer or the device failed.
    #[error("speech service unavailable: {0}")]
    ServiceUnavailable(String),
}

// ---------------------------------------------------------------------------
// SpeechCaptureService trait
// ---------------------------------------------------------------------------

/// Blocking "listen once" interface.
///
/// Implementations own their device sessions; the caller only sees text or a
/// [`CaptureFailure`].  Call from a blocking context (`spawn_blocking` or a
/// dedicated thread).
pub trait SpeechCaptureService: Send + Sync {
    fn capture_utterance(&self) -> Result<String, CaptureFailure>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SpeechCaptureService>) {}
};

/// Transcribe a recorded utterance.
///
/// Short recordings are padded with silence up to the engine minimum and long
/// ones are truncated to the maximum.
pub fn transcribe_utterance(stt: &dyn SttEngine, mut audio: Vec<f32>) -> Result<String, CaptureFailure> {
    if audio.is_empty() {
        return Err(CaptureFailure::NoSpeechUnderstood);
    }
    if audio.len() < MIN_AUDIO_SAMPLES {
        audio.resize(MIN_AUDIO_SAMPLES, 0.0);
    }
    audio.truncate(MAX_AUDIO_SAMPLES);

    match stt.transcribe(&audio) {
        Ok(raw) => {
            let text = clean_transcript(&raw);
            if text.is_empty() {
                Err(CaptureFailure::NoSpeechUnderstood)
            } else {
                Ok(text)
            }
        }
        Err(SttError::AudioTooShort | SttError::AudioTooLong) => {
            Err(CaptureFailure::NoSpeechUnderstood)
        }
        Err(e) => Err(CaptureFailure::ServiceUnavailable(e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// MicrophoneListener
// ---------------------------------------------------------------------------

/// [`SpeechCaptureService`] backed by the configured microphone and an
/// [`SttEngine`].  Every capture opens its own device session.
pub struct MicrophoneListener {
    stt: Arc<dyn SttEngine>,
    settings: RecorderSettings,
    device: Option<String>,
    frame_length: usize,
    read_timeout: Duration,
}

impl MicrophoneListener {
    pub fn new(stt: Arc<dyn SttEngine>, settings: RecorderSettings, audio: &AudioConfig) -> Self {
        Self {
            stt,
            settings,
            device: audio.device.clone(),
            frame_length: audio.frame_length,
            read_timeout: audio.read_timeout(),
        }
    }

    /// Record and transcribe one utterance from `source`.
    pub fn listen_with<S: AudioFrameSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<String, CaptureFailure> {
        let mut recorder = UtteranceRecorder::new(&self.settings);
        let audio = match record_utterance(source, &mut recorder) {
            Ok(Some(audio)) => audio,
            Ok(None) => return Err(CaptureFailure::NoSpeechUnderstood),
            Err(e) => return Err(CaptureFailure::ServiceUnavailable(e.to_string())),
        };

        log::debug!(
            "listen: recorded {:.2} s",
            audio.len() as f32 / source.sample_rate() as f32
        );
        transcribe_utterance(self.stt.as_ref(), audio)
    }
}

impl SpeechCaptureService for MicrophoneListener {
    fn capture_utterance(&self) -> Result<String, CaptureFailure> {
        let mut source =
            MicrophoneFrameSource::open(self.device.as_deref(), self.frame_length, self.read_timeout)
                .map_err(|e| CaptureFailure::ServiceUnavailable(e.to_string()))?;
        self.listen_with(&mut source)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
