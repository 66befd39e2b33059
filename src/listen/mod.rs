//! Listening for one spoken phrase.
//!
//! ```text
//! AudioFrameSource ─▶ UtteranceRecorder ─▶ SttEngine ─▶ clean_transcript
//!                     (calibrate, wait,     (Whisper)    (drop annotations)
//!                      record, endpoint)
//! ```
//!
//! The same machinery serves the command listener (long phrases, several
//! seconds of patience) and the interrupt monitor (two-second phrases).

pub mod recorder;
pub mod service;

pub use recorder::{record_utterance, RecorderSettings, RecorderStatus, UtteranceRecorder};
pub use service::{transcribe_utterance, CaptureFailure, MicrophoneListener, SpeechCaptureService};
