//! A wake-word voice assistant.
//!
//! Say the wake phrase, ask a question, and the answer is spoken back.  News
//! and weather questions go to their own providers; everything else goes to
//! a chat model.  Saying "stop" at any time cuts the current answer short.

pub mod audio;
pub mod config;
pub mod interrupt;
pub mod listen;
pub mod pipeline;
pub mod providers;
pub mod router;
pub mod stt;
pub mod tts;
pub mod wake;
