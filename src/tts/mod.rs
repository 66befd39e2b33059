//! Text-to-speech output.
//!
//! ```text
//! ResponseSpeaker::speak(text)
//!     flag.clear() → SpeechSynthesizer::start(text) → SpeechSession
//!     every poll_interval:
//!         session finished   → Finished
//!         flag raised        → session.terminate() → Interrupted
//! ```

pub mod session;
pub mod speaker;

pub use session::{
    sanitize_text, CommandSynthesizer, ProcessSession, SpeakError, SpeechSession,
    SpeechSynthesizer, TEXT_PLACEHOLDER,
};
pub use speaker::{ResponseSpeaker, SpeakOutcome};
