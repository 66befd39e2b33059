//! Utterance endpointing over a stream of fixed-size frames.
//!
//! [`UtteranceRecorder`] is a small state machine fed one frame at a time:
//!
//! ```text
//! Calibrating ──calibration window elapsed──▶ Waiting
//! Waiting     ──voiced frame──────────────────▶ Recording   (pre-roll kept)
//! Waiting     ──listen timeout────────────────▶ TimedOut
//! Recording   ──pause of silence / phrase limit──▶ Complete
//! ```
//!
//! It holds no device and no clock; durations are counted in samples, so the
//! same logic runs against a live microphone or a canned frame list.

use std::collections::VecDeque;
use std::time::Duration;

use crate::audio::{rms, AudioFrameSource, CaptureError, VadDetector, TARGET_SAMPLE_RATE};
use crate::config::{AudioConfig, InterruptConfig};

fn samples_in(duration: Duration) -> usize {
    (duration.as_secs_f64() * TARGET_SAMPLE_RATE as f64).round() as usize
}

// ---------------------------------------------------------------------------
// RecorderSettings
// ---------------------------------------------------------------------------

/// Endpointing parameters for one kind of listening.
#[derive(Debug, Clone, PartialEq)]
pub struct RecorderSettings {
    /// RMS floor for voice frames.
    pub vad_threshold: f32,
    /// Ambient measurement window at the start of a session.
    pub calibration: Duration,
    /// Trailing silence that ends an utterance.
    pub pause: Duration,
    /// Audio kept from before the first voiced frame.
    pub pre_roll: Duration,
    /// Give up if nobody starts speaking within this time.
    pub listen_timeout: Option<Duration>,
    /// Longest utterance recorded.
    pub phrase_limit: Duration,
}

impl RecorderSettings {
    /// Settings for the command spoken after the wake word.
    pub fn for_command(audio: &AudioConfig) -> Self {
        Self {
            vad_threshold: audio.vad_threshold,
            calibration: audio.calibration(),
            pause: audio.pause(),
            pre_roll: audio.pre_roll(),
            listen_timeout: Some(audio.command_timeout()),
            phrase_limit: audio.max_command(),
        }
    }

    /// Short windows used by the interrupt monitor.
    pub fn for_interrupt(audio: &AudioConfig, interrupt: &InterruptConfig) -> Self {
        Self {
            vad_threshold: audio.vad_threshold,
            calibration: audio.calibration(),
            pause: audio.pause(),
            pre_roll: audio.pre_roll(),
            listen_timeout: Some(interrupt.listen_timeout()),
            phrase_limit: interrupt.phrase_time_limit(),
        }
    }

    /// Segments checked for the wake phrase; waits indefinitely.
    pub fn for_wake(audio: &AudioConfig) -> Self {
        Self {
            vad_threshold: audio.vad_threshold,
            calibration: audio.calibration(),
            pause: audio.pause(),
            pre_roll: audio.pre_roll(),
            listen_timeout: None,
            phrase_limit: audio.wake_phrase(),
        }
    }
}

// ---------------------------------------------------------------------------
// RecorderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    /// Measuring ambient noise.
    Calibrating,
    /// Listening for speech onset.
    Waiting,
    /// Speech in progress.
    Recording,
    /// An utterance is ready in [`UtteranceRecorder::take_audio`].
    Complete,
    /// Nobody spoke within the listen timeout.
    TimedOut,
}

// ---------------------------------------------------------------------------
// UtteranceRecorder
// ---------------------------------------------------------------------------

pub struct UtteranceRecorder {
    vad: VadDetector,
    status: RecorderStatus,

    calibration_samples: usize,
    calibrated_samples: usize,
    ambient_energy: f64,

    timeout_samples: Option<usize>,
    waited_samples: usize,

    pre_roll: VecDeque<f32>,
    pre_roll_samples: usize,

    recorded: Vec<f32>,
    silence_run: usize,
    pause_samples: usize,
    phrase_limit_samples: usize,
}

impl UtteranceRecorder {
    pub fn new(settings: &RecorderSettings) -> Self {
        let calibration_samples = samples_in(settings.calibration);
        let pre_roll_samples = samples_in(settings.pre_roll);

        Self {
            vad: VadDetector::new(settings.vad_threshold),
            status: if calibration_samples == 0 {
                RecorderStatus::Waiting
            } else {
                RecorderStatus::Calibrating
            },
            calibration_samples,
            calibrated_samples: 0,
            ambient_energy: 0.0,
            timeout_samples: settings.listen_timeout.map(samples_in),
            waited_samples: 0,
            pre_roll: VecDeque::with_capacity(pre_roll_samples),
            pre_roll_samples,
            recorded: Vec::new(),
            silence_run: 0,
            pause_samples: samples_in(settings.pause).max(1),
            phrase_limit_samples: samples_in(settings.phrase_limit).max(1),
        }
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    /// Voice threshold currently applied (after calibration).
    pub fn threshold(&self) -> f32 {
        self.vad.threshold()
    }

    /// Feed one frame and return the resulting status.
    ///
    /// Frames pushed after `Complete` or `TimedOut` are ignored until
    /// [`reset`](Self::reset).
    pub fn push(&mut self, frame: &[f32]) -> RecorderStatus {
        match self.status {
            RecorderStatus::Complete | RecorderStatus::TimedOut => {}

            RecorderStatus::Calibrating => {
                let level = rms(frame) as f64;
                self.ambient_energy += level * level * frame.len() as f64;
                self.calibrated_samples += frame.len();
                if self.calibrated_samples >= self.calibration_samples {
                    let ambient =
                        (self.ambient_energy / self.calibrated_samples.max(1) as f64).sqrt();
                    self.vad.calibrate(ambient as f32);
                    self.status = RecorderStatus::Waiting;
                }
            }

            RecorderStatus::Waiting => {
                if self.vad.is_voice_frame(frame) {
                    self.recorded.clear();
                    self.recorded.extend(self.pre_roll.drain(..));
                    self.recorded.extend_from_slice(frame);
                    self.silence_run = 0;
                    self.status = RecorderStatus::Recording;
                    self.check_phrase_limit();
                } else {
                    self.remember_pre_roll(frame);
                    self.waited_samples += frame.len();
                    if let Some(limit) = self.timeout_samples {
                        if self.waited_samples >= limit {
                            self.status = RecorderStatus::TimedOut;
                        }
                    }
                }
            }

            RecorderStatus::Recording => {
                self.recorded.extend_from_slice(frame);
                if self.vad.is_voice_frame(frame) {
                    self.silence_run = 0;
                } else {
                    self.silence_run += frame.len();
                }
                if self.silence_run >= self.pause_samples {
                    self.status = RecorderStatus::Complete;
                } else {
                    self.check_phrase_limit();
                }
            }
        }

        self.status
    }

    /// Take the recorded utterance, leaving the buffer empty.
    pub fn take_audio(&mut self) -> Vec<f32> {
        std::mem::take(&mut self.recorded)
    }

    /// Start listening for the next utterance.  Calibration is kept.
    pub fn reset(&mut self) {
        self.recorded.clear();
        self.pre_roll.clear();
        self.silence_run = 0;
        self.waited_samples = 0;
        if self.status != RecorderStatus::Calibrating {
            self.status = RecorderStatus::Waiting;
        }
    }

    fn check_phrase_limit(&mut self) {
        if self.recorded.len() >= self.phrase_limit_samples {
            self.status = RecorderStatus::Complete;
        }
    }

    fn remember_pre_roll(&mut self, frame: &[f32]) {
        if self.pre_roll_samples == 0 {
            return;
        }
        self.pre_roll.extend(frame.iter().copied());
        while self.pre_roll.len() > self.pre_roll_samples {
            self.pre_roll.pop_front();
        }
    }
}

/// Pull frames from `source` until the recorder completes or times out.
///
/// Returns `Ok(None)` on timeout.
pub fn record_utterance<S: AudioFrameSource + ?Sized>(
    source: &mut S,
    recorder: &mut UtteranceRecorder,
) -> Result<Option<Vec<f32>>, CaptureError> {
    loop {
        let frame = source.next_frame()?;
        match recorder.push(&frame) {
            RecorderStatus::Complete => return Ok(Some(recorder.take_audio())),
            RecorderStatus::TimedOut => return Ok(None),
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryFrameSource;

    const FRAME: usize = 160; // 10 ms

    fn settings() -> RecorderSettings {
        RecorderSettings {
            vad_threshold: 0.01,
            calibration: Duration::ZERO,
            pause: Duration::from_millis(50),
            pre_roll: Duration::from_millis(20),
            listen_timeout: Some(Duration::from_millis(100)),
            phrase_limit: Duration::from_secs(1),
        }
    }

    fn silence(n: usize) -> Vec<Vec<f32>> {
        MemoryFrameSource::constant(0.0, FRAME, n)
    }

    fn voice(n: usize) -> Vec<Vec<f32>> {
        MemoryFrameSource::constant(0.3, FRAME, n)
    }

    #[test]
    fn speech_followed_by_pause_completes_with_pre_roll() {
        let mut frames = silence(3);
        frames.extend(voice(4));
        frames.extend(silence(5));
        let mut source = MemoryFrameSource::new(frames);
        let mut recorder = UtteranceRecorder::new(&settings());

        let audio = record_utterance(&mut source, &mut recorder).unwrap().unwrap();
        // 2 frames pre-roll + 4 voice + 5 silence (50 ms pause).
        assert_eq!(audio.len(), 11 * FRAME);
        assert_eq!(recorder.status(), RecorderStatus::Complete);
    }

    #[test]
    fn silence_only_times_out() {
        let mut source = MemoryFrameSource::new(silence(20));
        let mut recorder = UtteranceRecorder::new(&settings());
        assert!(record_utterance(&mut source, &mut recorder).unwrap().is_none());
        assert_eq!(recorder.status(), RecorderStatus::TimedOut);
    }

    #[test]
    fn phrase_limit_cuts_long_speech() {
        let mut s = settings();
        s.phrase_limit = Duration::from_millis(80);
        let mut source = MemoryFrameSource::new(voice(50));
        let mut recorder = UtteranceRecorder::new(&s);

        let audio = record_utterance(&mut source, &mut recorder).unwrap().unwrap();
        assert_eq!(audio.len(), 8 * FRAME);
    }

    #[test]
    fn short_pauses_inside_speech_do_not_end_it() {
        let mut frames = voice(3);
        frames.extend(silence(2)); // 20 ms < 50 ms pause
        frames.extend(voice(3));
        frames.extend(silence(5));
        let mut source = MemoryFrameSource::new(frames);
        let mut recorder = UtteranceRecorder::new(&settings());

        let audio = record_utterance(&mut source, &mut recorder).unwrap().unwrap();
        assert_eq!(audio.len(), 13 * FRAME);
    }

    #[test]
    fn calibration_ignores_steady_hum() {
        let mut s = settings();
        s.calibration = Duration::from_millis(50);
        s.listen_timeout = Some(Duration::from_millis(200));

        let mut recorder = UtteranceRecorder::new(&s);
        assert_eq!(recorder.status(), RecorderStatus::Calibrating);

        // 0.05 RMS hum during calibration → threshold 0.075.
        for frame in MemoryFrameSource::constant(0.05, FRAME, 5) {
            recorder.push(&frame);
        }
        assert_eq!(recorder.status(), RecorderStatus::Waiting);
        assert!((recorder.threshold() - 0.075).abs() < 1e-4);

        // The same hum afterwards is not speech.
        assert_eq!(recorder.push(&vec![0.05; FRAME]), RecorderStatus::Waiting);
        assert_eq!(recorder.push(&vec![0.3; FRAME]), RecorderStatus::Recording);
    }

    #[test]
    fn no_timeout_waits_forever() {
        let mut s = settings();
        s.listen_timeout = None;
        let mut recorder = UtteranceRecorder::new(&s);
        for frame in silence(1_000) {
            assert_eq!(recorder.push(&frame), RecorderStatus::Waiting);
        }
    }

    #[test]
    fn reset_allows_a_second_utterance() {
        let mut frames = voice(2);
        frames.extend(silence(5));
        frames.extend(voice(3));
        frames.extend(silence(5));
        let mut source = MemoryFrameSource::new(frames);
        let mut recorder = UtteranceRecorder::new(&settings());

        let first = record_utterance(&mut source, &mut recorder).unwrap().unwrap();
        assert_eq!(first.len(), 7 * FRAME);

        recorder.reset();
        let second = record_utterance(&mut source, &mut recorder).unwrap().unwrap();
        assert_eq!(second.len(), 8 * FRAME);
    }

    #[test]
    fn device_error_is_propagated() {
        let mut source = MemoryFrameSource::new(voice(2));
        let mut recorder = UtteranceRecorder::new(&settings());
        assert!(matches!(
            record_utterance(&mut source, &mut recorder),
            Err(CaptureError::Disconnected)
        ));
    }

    #[test]
    fn interrupt_settings_use_phrase_time_limit() {
        let s = RecorderSettings::for_interrupt(&AudioConfig::default(), &InterruptConfig::default());
        assert_eq!(s.phrase_limit, Duration::from_secs(2));
        assert!(s.listen_timeout.is_some());
        assert!(RecorderSettings::for_wake(&AudioConfig::default())
            .listen_timeout
            .is_none());
    }
}
