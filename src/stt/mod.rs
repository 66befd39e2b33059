//! STT (Speech-to-Text) engine module.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use voice_assistant::stt::{SttEngine, TranscribeParams, WhisperEngine};
//!
//! let engine = WhisperEngine::load("models/ggml-base.en.bin", TranscribeParams::default())
//!     .expect("model not found");
//!
//! // audio: 16 kHz, mono, f32 PCM from the audio module
//! let audio: Vec<f32> = vec![0.0; 16_000];
//! let text = engine.transcribe(&audio).unwrap();
//! println!("{text}");
//! ```

pub mod engine;
pub mod transcribe;

pub use engine::{SttEngine, SttError, WhisperEngine, MAX_AUDIO_SAMPLES, MIN_AUDIO_SAMPLES};
pub use transcribe::{
    clean_transcript, SamplingStrategy, Segment, TranscribeParams, TranscriptionResult,
};

#[cfg(test)]
pub use engine::MockSttEngine;
