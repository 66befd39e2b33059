//! Transcription parameter types, result types and transcript cleanup.
//!
//! [`TranscribeParams`] carries all settings that control a single Whisper
//! inference run.  [`TranscriptionResult`] is returned by
//! [`WhisperEngine::transcribe_full`](crate::stt::WhisperEngine::transcribe_full).

use std::sync::OnceLock;

use regex::Regex;

// ---------------------------------------------------------------------------
// SamplingStrategy
// ---------------------------------------------------------------------------

/// Mirrors `whisper_rs::SamplingStrategy` but is owned and `Clone`.
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingStrategy {
    /// Greedy (single-pass) decoding.
    Greedy {
        /// Number of candidate tokens evaluated per step.  1 is fastest.
        best_of: i32,
    },
    /// Beam-search decoding.
    BeamSearch {
        beam_size: i32,
        patience: f32,
    },
}

impl Default for SamplingStrategy {
    fn default() -> Self {
        Self::Greedy { best_of: 1 }
    }
}

// ---------------------------------------------------------------------------
// TranscribeParams
// ---------------------------------------------------------------------------

/// All parameters for a Whisper engine.
///
/// ```
/// use voice_assistant::stt::TranscribeParams;
///
/// let params = TranscribeParams {
///     language: "auto".into(),
///     ..TranscribeParams::default()
/// };
/// assert!(params.n_threads >= 1);
/// ```
#[derive(Debug, Clone)]
pub struct TranscribeParams {
    /// ISO-639-1 language code (e.g. `"en"`), or `"auto"` to let Whisper
    /// detect the language automatically.
    pub language: String,

    /// Decoding strategy.
    pub strategy: SamplingStrategy,

    /// Number of CPU threads handed to Whisper, capped at 8.
    pub n_threads: i32,

    /// Suppress Whisper's progress output to stderr.
    pub suppress_progress: bool,

    /// Request GPU inference when the model is loaded.
    pub use_gpu: bool,
}

impl Default for TranscribeParams {
    fn default() -> Self {
        Self {
            language: "en".into(),
            strategy: SamplingStrategy::default(),
            n_threads: optimal_threads(),
            suppress_progress: true,
            use_gpu: false,
        }
    }
}

/// Returns the number of CPU threads to use for inference, capped at 8.
pub(crate) fn optimal_threads() -> i32 {
    std::thread::available_parallelism()
        .map(|n| n.get().min(8) as i32)
        .unwrap_or(4)
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// The output of a successful transcription.
#[derive(Debug, Clone)]
pub struct TranscriptionResult {
    /// Full transcript with non-speech annotations removed.
    pub text: String,

    /// Individual time-aligned segments produced by Whisper (raw text).
    pub segments: Vec<Segment>,

    /// Wall-clock time the inference took, in milliseconds.
    pub duration_ms: u128,
}

/// A single time-aligned text chunk produced by Whisper.
#[derive(Debug, Clone)]
pub struct Segment {
    pub text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

// ---------------------------------------------------------------------------
// clean_transcript
// ---------------------------------------------------------------------------

fn annotation_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\[[^\]]*\]|\([^)]*\)|\*[^*]*\*").expect("annotation pattern is valid")
    })
}

/// Strip Whisper's non-speech annotations (`[BLANK_AUDIO]`, `(music)`,
/// `*coughs*`) and collapse whitespace.
///
/// An empty result means nothing intelligible was said.
///
/// ```
/// use voice_assistant::stt::clean_transcript;
///
/// assert_eq!(clean_transcript(" [BLANK_AUDIO] "), "");
/// assert_eq!(clean_transcript("(wind) Tell me  the news."), "Tell me the news.");
/// ```
pub fn clean_transcript(raw: &str) -> String {
    annotation_pattern()
        .replace_all(raw, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_markers_become_empty() {
        assert_eq!(clean_transcript("[BLANK_AUDIO]"), "");
        assert_eq!(clean_transcript("  (silence)  *music* "), "");
    }

    #[test]
    fn speech_is_kept_and_whitespace_collapsed() {
        assert_eq!(
            clean_transcript("  What's the weather   in Austin? "),
            "What's the weather in Austin?"
        );
    }

    #[test]
    fn annotations_inside_speech_are_removed() {
        assert_eq!(clean_transcript("stop [inaudible] talking"), "stop talking");
    }

    #[test]
    fn default_params_are_english() {
        let params = TranscribeParams::default();
        assert_eq!(params.language, "en");
        assert_eq!(params.strategy, SamplingStrategy::Greedy { best_of: 1 });
        assert!(params.n_threads >= 1 && params.n_threads <= 8);
    }
}
