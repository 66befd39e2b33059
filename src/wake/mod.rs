//! Wake-word detection.

pub mod detector;
pub mod listener;

pub use detector::{normalize_phrase, TranscriptWakeDetector, WakeWordDetector};
pub use listener::{wait_for_wake, MicrophoneWakeListener, WakeError, WakeListener};
