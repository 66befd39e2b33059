//! Cancellable spoken responses.

use std::sync::Arc;
use std::time::Duration;

use crate::interrupt::CancellationFlag;
use crate::tts::session::{sanitize_text, SpeakError, SpeechSynthesizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// The engine played the whole text (or exited on its own).
    Finished,
    /// The cancellation flag was raised and the session was killed.
    Interrupted,
    /// Nothing to say.
    Skipped,
}

/// Speaks one response at a time and stops as soon as the
/// [`CancellationFlag`] is raised.
pub struct ResponseSpeaker {
    synth: Arc<dyn SpeechSynthesizer>,
    flag: CancellationFlag,
    poll_interval: Duration,
}

impl ResponseSpeaker {
    pub fn new(
        synth: Arc<dyn SpeechSynthesizer>,
        flag: CancellationFlag,
        poll_interval: Duration,
    ) -> Self {
        Self {
            synth,
            flag,
            poll_interval,
        }
    }

    pub fn flag(&self) -> &CancellationFlag {
        &self.flag
    }

    /// Raise the cancellation flag.
    pub fn cancel(&self) {
        self.flag.raise();
    }

    /// Speak `text` until it finishes or the flag is raised.
    ///
    /// The flag is cleared before the session starts, so a stop heard
    /// earlier never cancels this response.  Cancellation is noticed within
    /// one poll interval.
    ///
    /// # Errors
    ///
    /// [`SpeakError::Launch`] if the engine cannot be started.
    pub async fn speak(&self, text: &str) -> Result<SpeakOutcome, SpeakError> {
        let text = sanitize_text(text);
        if text.trim().is_empty() {
            return Ok(SpeakOutcome::Skipped);
        }

        self.flag.clear();
        let mut session = self.synth.start(&text)?;
        log::info!("tts: speaking {:?}", text);

        loop {
            if session.has_finished() {
                return Ok(SpeakOutcome::Finished);
            }
            if self.flag.is_raised() {
                session.terminate();
                log::info!("tts: speech interrupted");
                return Ok(SpeakOutcome::Interrupted);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    use super::*;
    use crate::tts::session::SpeechSession;

    /// Session that finishes after a fixed number of polls.
    struct FakeSession {
        polls_left: usize,
        terminated: Arc<AtomicBool>,
    }

    impl SpeechSession for FakeSession {
        fn has_finished(&mut self) -> bool {
            if self.terminated.load(Ordering::SeqCst) || self.polls_left == 0 {
                return true;
            }
            self.polls_left -= 1;
            false
        }

        fn terminate(&mut self) {
            self.terminated.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeSynth {
        polls: usize,
        spoken: Mutex<Vec<String>>,
        terminated: Arc<AtomicBool>,
        flag_at_start: Mutex<Vec<bool>>,
        watched_flag: Option<CancellationFlag>,
        starts: AtomicUsize,
    }

    impl SpeechSynthesizer for FakeSynth {
        fn start(&self, text: &str) -> Result<Box<dyn SpeechSession>, SpeakError> {
            self.starts.fetch_add(1, Ordering::SeqCst);
            self.spoken.lock().unwrap().push(text.to_owned());
            if let Some(flag) = &self.watched_flag {
                self.flag_at_start.lock().unwrap().push(flag.is_raised());
            }
            Ok(Box::new(FakeSession {
                polls_left: self.polls,
                terminated: Arc::clone(&self.terminated),
            }))
        }
    }

    fn speaker(synth: Arc<FakeSynth>, flag: &CancellationFlag) -> ResponseSpeaker {
        ResponseSpeaker::new(synth, flag.clone(), Duration::from_millis(10))
    }

    #[tokio::test]
    async fn finished_session_returns_finished() {
        let flag = CancellationFlag::new();
        let synth = Arc::new(FakeSynth {
            polls: 3,
            ..Default::default()
        });
        let outcome = speaker(synth.clone(), &flag).speak("Hello there.").await.unwrap();
        assert_eq!(outcome, SpeakOutcome::Finished);
        assert_eq!(*synth.spoken.lock().unwrap(), vec!["Hello there."]);
        assert!(!synth.terminated.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn flag_is_cleared_before_session_starts() {
        let flag = CancellationFlag::new();
        flag.raise();
        let synth = Arc::new(FakeSynth {
            polls: 1,
            watched_flag: Some(flag.clone()),
            ..Default::default()
        });

        let outcome = speaker(synth.clone(), &flag).speak("fresh response").await.unwrap();
        assert_eq!(outcome, SpeakOutcome::Finished);
        assert_eq!(*synth.flag_at_start.lock().unwrap(), vec![false]);
    }

    #[tokio::test]
    async fn raised_flag_interrupts_within_one_poll() {
        let flag = CancellationFlag::new();
        let synth = Arc::new(FakeSynth {
            polls: usize::MAX,
            ..Default::default()
        });
        let speaker = speaker(synth.clone(), &flag);

        let remote = flag.clone();
        let raised_at = Arc::new(Mutex::new(None));
        let raised_at_clone = Arc::clone(&raised_at);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            *raised_at_clone.lock().unwrap() = Some(Instant::now());
            remote.raise();
        });

        let outcome = speaker.speak("a very long story").await.unwrap();
        let returned = Instant::now();

        assert_eq!(outcome, SpeakOutcome::Interrupted);
        assert!(synth.terminated.load(Ordering::SeqCst));
        let raised = raised_at.lock().unwrap().unwrap();
        assert!(returned.duration_since(raised) < Duration::from_millis(200));
    }

    #[tokio::test]
    async fn cancel_raises_the_shared_flag() {
        let flag = CancellationFlag::new();
        let speaker = speaker(Arc::new(FakeSynth::default()), &flag);
        speaker.cancel();
        assert!(flag.is_raised());
        assert!(speaker.flag().is_raised());
    }

    #[tokio::test]
    async fn blank_text_is_skipped() {
        let flag = CancellationFlag::new();
        let synth = Arc::new(FakeSynth::default());
        let speaker = speaker(synth.clone(), &flag);

        assert_eq!(speaker.speak("   ").await.unwrap(), SpeakOutcome::Skipped);
        assert_eq!(speaker.speak("\u{7}\u{0}").await.unwrap(), SpeakOutcome::Skipped);
        assert_eq!(synth.starts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn control_characters_never_reach_the_engine() {
        let flag = CancellationFlag::new();
        let synth = Arc::new(FakeSynth::default());
        speaker(synth.clone(), &flag)
            .speak("ding\u{7} dong\r")
            .await
            .unwrap();
        assert_eq!(*synth.spoken.lock().unwrap(), vec!["ding dong"]);
    }
}
