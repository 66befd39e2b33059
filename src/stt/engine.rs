//! Core STT engine trait and implementations.
//!
//! [`SttEngine`] is the interface used by the wake detector, the command
//! listener and the interrupt monitor.  It is object-safe and `Send + Sync`
//! so a single loaded model can be shared behind an `Arc<dyn SttEngine>`.
//!
//! [`WhisperEngine`] is the production implementation that wraps a
//! `whisper_rs::WhisperContext`.
//!
//! [`MockSttEngine`] (available under `#[cfg(test)]`) replays pre-configured
//! responses without a GGML model file.

use std::path::Path;

use thiserror::Error;
use whisper_rs::{FullParams, WhisperContext, WhisperContextParameters};

use crate::stt::transcribe::{
    clean_transcript, SamplingStrategy, Segment, TranscribeParams, TranscriptionResult,
};

// ---------------------------------------------------------------------------
// SttError
// ---------------------------------------------------------------------------

/// All errors that can arise from the STT subsystem.
#[derive(Debug, Clone, Error)]
pub enum SttError {
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Whisper context initialisation failed: {0}")]
    ContextInit(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    /// Shorter than 0.5 s (8 000 samples at 16 kHz).
    #[error("Audio too short: minimum 0.5 s (8 000 samples at 16 kHz)")]
    AudioTooShort,

    /// Longer than 60 s (960 000 samples at 16 kHz).
    #[error("Audio too long: maximum 60 s (960 000 samples at 16 kHz)")]
    AudioTooLong,
}

// ---------------------------------------------------------------------------
// SttEngine trait
// ---------------------------------------------------------------------------

/// Object-safe, thread-safe interface for speech-to-text engines.
///
/// # Contract
///
/// - `audio` must be **16 kHz, mono, f32** PCM samples.
/// - Returns `Err(SttError::AudioTooShort)` when `audio.len() < 8_000`.
/// - Returns `Err(SttError::AudioTooLong)` when `audio.len() > 960_000`.
/// - The returned text has non-speech annotations removed; it may be empty.
pub trait SttEngine: Send + Sync {
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn SttEngine>) {}
};

/// Minimum audio length: 0.5 s × 16 000 Hz.
pub const MIN_AUDIO_SAMPLES: usize = 8_000;
/// Maximum audio length: 60 s × 16 000 Hz.
pub const MAX_AUDIO_SAMPLES: usize = 960_000;

// ---------------------------------------------------------------------------
// WhisperEngine
// ---------------------------------------------------------------------------

/// Production STT engine that wraps a `whisper_rs::WhisperContext`.
///
/// A new `WhisperState` is created for every call, so the wake listener and
/// the interrupt monitor can transcribe concurrently from one loaded model.
pub struct WhisperEngine {
    ctx: WhisperContext,
    params: TranscribeParams,
}

impl std::fmt::Debug for WhisperEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperEngine")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

// SAFETY: WhisperContext is Send+Sync as declared by whisper-rs; the model
// weights are read-only after loading.
unsafe impl Send for WhisperEngine {}
unsafe impl Sync for WhisperEngine {}

impl WhisperEngine {
    /// Load a GGML model from `model_path` and prepare it for inference.
    ///
    /// # Errors
    ///
    /// - [`SttError::ModelNotFound`]: `model_path` does not exist.
    /// - [`SttError::ContextInit`]: whisper-rs failed to load the file.
    pub fn load(model_path: impl AsRef<Path>, params: TranscribeParams) -> Result<Self, SttError> {
        let path = model_path.as_ref();

        if !path.exists() {
            return Err(SttError::ModelNotFound(path.display().to_string()));
        }

        let path_str = path.to_str().ok_or_else(|| {
            SttError::ModelNotFound(format!(
                "model path contains non-UTF-8 characters: {}",
                path.display()
            ))
        })?;

        let mut ctx_params = WhisperContextParameters::default();
        ctx_params.use_gpu(params.use_gpu);
        let ctx = WhisperContext::new_with_params(path_str, ctx_params)
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        Ok(Self { ctx, params })
    }

    /// Transcribe `audio` and return a [`TranscriptionResult`] with
    /// per-segment timing information.
    pub fn transcribe_full(&self, audio: &[f32]) -> Result<TranscriptionResult, SttError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(SttError::AudioTooLong);
        }

        use whisper_rs::SamplingStrategy as WS;
        let ws = match self.params.strategy {
            SamplingStrategy::Greedy { best_of } => WS::Greedy { best_of },
            SamplingStrategy::BeamSearch { beam_size, patience } => {
                WS::BeamSearch { beam_size, patience }
            }
        };

        let mut fp = FullParams::new(ws);

        let lang: Option<&str> = if self.params.language == "auto" {
            None
        } else {
            Some(self.params.language.as_str())
        };
        fp.set_language(lang);
        fp.set_n_threads(self.params.n_threads);
        // Commands are independent; never condition on the previous one.
        fp.set_no_context(true);
        fp.set_print_special(false);

        if self.params.suppress_progress {
            fp.set_print_progress(false);
            fp.set_print_realtime(false);
        }

        let mut state = self
            .ctx
            .create_state()
            .map_err(|e| SttError::ContextInit(e.to_string()))?;

        let wall_start = std::time::Instant::now();

        state
            .full(fp, audio)
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let n_segments = state
            .full_n_segments()
            .map_err(|e| SttError::Transcription(e.to_string()))?;

        let mut text = String::new();
        let mut segments: Vec<Segment> = Vec::with_capacity(n_segments.max(0) as usize);

        for i in 0..n_segments {
            let seg_text = state
                .full_get_segment_text(i)
                .map_err(|e| SttError::Transcription(format!("segment {i}: {e}")))?;

            // Centiseconds → milliseconds.
            let t0 = state.full_get_segment_t0(i).unwrap_or(0).max(0) as u64 * 10;
            let t1 = state.full_get_segment_t1(i).unwrap_or(0).max(0) as u64 * 10;

            text.push_str(&seg_text);
            text.push(' ');
            segments.push(Segment {
                text: seg_text,
                start_ms: t0,
                end_ms: t1,
            });
        }

        Ok(TranscriptionResult {
            text: clean_transcript(&text),
            segments,
            duration_ms: wall_start.elapsed().as_millis(),
        })
    }
}

impl SttEngine for WhisperEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError> {
        let result = self.transcribe_full(audio)?;
        log::debug!(
            "stt: {} segment(s) in {} ms",
            result.segments.len(),
            result.duration_ms
        );
        Ok(result.text)
    }
}

// ---------------------------------------------------------------------------
// MockSttEngine  (test-only)
// ---------------------------------------------------------------------------

/// A test double that replays pre-configured responses in order.  The last
/// response repeats once the script is exhausted.
#[cfg(test)]
pub struct MockSttEngine {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String, SttError>>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl MockSttEngine {
    /// Always returns `Ok(text)`.
    pub fn ok(text: impl Into<String>) -> Self {
        Self::script(vec![Ok(text.into())])
    }

    /// Always returns `Err(error)`.
    pub fn err(error: SttError) -> Self {
        Self::script(vec![Err(error)])
    }

    /// Returns each response in turn.
    pub fn script(responses: Vec<Result<String, SttError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Number of successful-length transcribe calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl SttEngine for MockSttEngine {
    fn transcribe(&self, audio: &[f32]) -> Result<String, SttError> {
        if audio.len() < MIN_AUDIO_SAMPLES {
            return Err(SttError::AudioTooShort);
        }
        if audio.len() > MAX_AUDIO_SAMPLES {
            return Err(SttError::AudioTooLong);
        }
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut responses = self.responses.lock().unwrap();
        if responses.len() > 1 {
            responses.pop_front().unwrap()
        } else {
            responses
                .front()
                .cloned()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_ok_returns_configured_text() {
        let engine = MockSttEngine::ok("hey rusty");
        let audio = vec![0.0f32; MIN_AUDIO_SAMPLES];
        assert_eq!(engine.transcribe(&audio).unwrap(), "hey rusty");
        assert_eq!(engine.calls(), 1);
    }

    #[test]
    fn mock_script_replays_in_order_then_repeats_last() {
        let engine = MockSttEngine::script(vec![
            Ok("one".into()),
            Err(SttError::Transcription("boom".into())),
            Ok("three".into()),
        ]);
        let audio = vec![0.0f32; MIN_AUDIO_SAMPLES];
        assert_eq!(engine.transcribe(&audio).unwrap(), "one");
        assert!(engine.transcribe(&audio).is_err());
        assert_eq!(engine.transcribe(&audio).unwrap(), "three");
        assert_eq!(engine.transcribe(&audio).unwrap(), "three");
    }

    #[test]
    fn mock_short_audio_returns_audio_too_short() {
        let engine = MockSttEngine::ok("text");
        let short = vec![0.0f32; MIN_AUDIO_SAMPLES - 1];
        assert!(matches!(
            engine.transcribe(&short).unwrap_err(),
            SttError::AudioTooShort
        ));
        assert_eq!(engine.calls(), 0);
    }

    #[test]
    fn mock_long_audio_returns_audio_too_long() {
        let engine = MockSttEngine::ok("text");
        let long = vec![0.0f32; MAX_AUDIO_SAMPLES + 1];
        assert!(matches!(
            engine.transcribe(&long).unwrap_err(),
            SttError::AudioTooLong
        ));
    }

    #[test]
    fn load_missing_model_returns_model_not_found() {
        let result = WhisperEngine::load("/nonexistent/model.bin", TranscribeParams::default());
        assert!(
            matches!(result, Err(SttError::ModelNotFound(_))),
            "expected ModelNotFound, got: {result:?}"
        );
    }

    #[test]
    fn box_dyn_stt_engine_compiles() {
        let engine: Box<dyn SttEngine> = Box::new(MockSttEngine::ok("ok"));
        let _ = engine.transcribe(&vec![0.0f32; MIN_AUDIO_SAMPLES]);
    }

    #[test]
    fn stt_error_display_model_not_found() {
        let e = SttError::ModelNotFound("/some/path.bin".into());
        assert!(e.to_string().contains("/some/path.bin"));
    }
}
