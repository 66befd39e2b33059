//! Frame-level wake-word detection.
//!
//! [`TranscriptWakeDetector`] gates on energy first: frames are segmented
//! into short phrases by an [`UtteranceRecorder`], and only completed
//! segments are sent to the STT engine.  A segment whose transcript contains
//! one of the configured wake phrases counts as a detection.

use std::sync::Arc;

use crate::listen::{transcribe_utterance, CaptureFailure, RecorderSettings, RecorderStatus, UtteranceRecorder};
use crate::stt::SttEngine;

/// Consumes audio frames and reports when the wake word has been heard.
pub trait WakeWordDetector {
    /// Returns `true` on the frame that completes a detection.
    fn process_frame(&mut self, frame: &[f32]) -> bool;

    /// Forget any partially heard audio.
    fn reset(&mut self) {}
}

/// Lowercase, drop punctuation and collapse whitespace.
///
/// ```
/// use voice_assistant::wake::normalize_phrase;
///
/// assert_eq!(normalize_phrase("  Hey, Rusty! "), "hey rusty");
/// ```
pub fn normalize_phrase(text: &str) -> String {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .filter(|c| !matches!(c, '\'' | '\u{2019}'))
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub struct TranscriptWakeDetector {
    stt: Arc<dyn SttEngine>,
    recorder: UtteranceRecorder,
    phrases: Vec<String>,
}

impl TranscriptWakeDetector {
    pub fn new(stt: Arc<dyn SttEngine>, phrases: &[String], settings: &RecorderSettings) -> Self {
        let phrases = phrases
            .iter()
            .map(|p| normalize_phrase(p))
            .filter(|p| !p.is_empty())
            .collect();

        Self {
            stt,
            recorder: UtteranceRecorder::new(settings),
            phrases,
        }
    }

    /// Whether `transcript` contains a wake phrase as whole words.
    pub fn matches(&self, transcript: &str) -> bool {
        let padded = format!(" {} ", normalize_phrase(transcript));
        self.phrases
            .iter()
            .any(|phrase| padded.contains(&format!(" {phrase} ")))
    }
}

impl WakeWordDetector for TranscriptWakeDetector {
    fn process_frame(&mut self, frame: &[f32]) -> bool {
        match self.recorder.push(frame) {
            RecorderStatus::Complete => {
                let audio = self.recorder.take_audio();
                self.recorder.reset();

                match transcribe_utterance(self.stt.as_ref(), audio) {
                    Ok(text) => {
                        let detected = self.matches(&text);
                        log::debug!("wake: heard {text:?} (detected: {detected})");
                        detected
                    }
                    Err(CaptureFailure::NoSpeechUnderstood) => false,
                    Err(CaptureFailure::ServiceUnavailable(e)) => {
                        log::warn!("wake: transcription failed: {e}");
                        false
                    }
                }
            }
            RecorderStatus::TimedOut => {
                self.recorder.reset();
                false
            }
            _ => false,
        }
    }

    fn reset(&mut self) {
        self.recorder.reset();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::audio::MemoryFrameSource;
    use crate::stt::MockSttEngine;

    const FRAME: usize = 160;

    fn settings() -> RecorderSettings {
        RecorderSettings {
            vad_threshold: 0.01,
            calibration: Duration::ZERO,
            pause: Duration::from_millis(50),
            pre_roll: Duration::ZERO,
            listen_timeout: None,
            phrase_limit: Duration::from_millis(2500),
        }
    }

    fn phrases() -> Vec<String> {
        vec!["hey rusty".into(), "Hey Rust".into()]
    }

    fn segment() -> Vec<Vec<f32>> {
        let mut frames = MemoryFrameSource::constant(0.3, FRAME, 3);
        frames.extend(MemoryFrameSource::constant(0.0, FRAME, 5));
        frames
    }

    #[test]
    fn normalization_strips_punctuation_and_case() {
        assert_eq!(normalize_phrase("HEY   rusty..."), "hey rusty");
        assert_eq!(normalize_phrase("what's up"), "whats up");
        assert_eq!(normalize_phrase("!!!"), "");
    }

    #[test]
    fn matches_whole_words_only() {
        let detector =
            TranscriptWakeDetector::new(Arc::new(MockSttEngine::ok("")), &phrases(), &settings());
        assert!(detector.matches("Hey, Rusty! What's the time?"));
        assert!(detector.matches("hey rust"));
        assert!(!detector.matches("they rusted"));
        assert!(!detector.matches("good morning"));
    }

    #[test]
    fn detection_fires_on_matching_segment_only() {
        let stt = Arc::new(MockSttEngine::script(vec![
            Ok("good morning".into()),
            Ok("Hey, Rusty!".into()),
        ]));
        let mut detector = TranscriptWakeDetector::new(stt.clone(), &phrases(), &settings());

        let first: Vec<bool> = segment().iter().map(|f| detector.process_frame(f)).collect();
        assert!(first.iter().all(|d| !d));

        let second: Vec<bool> = segment().iter().map(|f| detector.process_frame(f)).collect();
        assert_eq!(second.last(), Some(&true));
        assert_eq!(stt.calls(), 2);
    }

    #[test]
    fn silence_never_reaches_the_engine() {
        let stt = Arc::new(MockSttEngine::ok("hey rusty"));
        let mut detector = TranscriptWakeDetector::new(stt.clone(), &phrases(), &settings());
        for frame in MemoryFrameSource::constant(0.0, FRAME, 500) {
            assert!(!detector.process_frame(&frame));
        }
        assert_eq!(stt.calls(), 0);
    }

    #[test]
    fn engine_errors_are_not_detections() {
        let stt = Arc::new(MockSttEngine::err(crate::stt::SttError::Transcription(
            "boom".into(),
        )));
        let mut detector = TranscriptWakeDetector::new(stt, &phrases(), &settings());
        assert!(!segment().iter().any(|f| detector.process_frame(f)));
    }
}
