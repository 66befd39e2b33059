//! Blocking "wait until the wake phrase is heard".

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::audio::{AudioFrameSource, CaptureError, MicrophoneFrameSource};
use crate::config::{AssistantConfig, AudioConfig};
use crate::listen::RecorderSettings;
use crate::stt::SttEngine;
use crate::wake::detector::{TranscriptWakeDetector, WakeWordDetector};

#[derive(Debug, Error)]
pub enum WakeError {
    #[error("audio device error while waiting for the wake word: {0}")]
    Device(#[from] CaptureError),
}

/// Feed frames from `source` into `detector` until it reports a detection.
pub fn wait_for_wake<S, D>(source: &mut S, detector: &mut D) -> Result<(), CaptureError>
where
    S: AudioFrameSource + ?Sized,
    D: WakeWordDetector + ?Sized,
{
    detector.reset();
    loop {
        let frame = source.next_frame()?;
        if detector.process_frame(&frame) {
            return Ok(());
        }
    }
}

/// Blocks the calling thread until the wake word is heard.
pub trait WakeListener: Send + Sync {
    fn wait_for_wake_word(&self) -> Result<(), WakeError>;
}

const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn WakeListener>) {}
};

/// [`WakeListener`] over the configured microphone and a
/// [`TranscriptWakeDetector`].  Each wait opens its own device session.
pub struct MicrophoneWakeListener {
    stt: Arc<dyn SttEngine>,
    phrases: Vec<String>,
    settings: RecorderSettings,
    device: Option<String>,
    frame_length: usize,
    read_timeout: Duration,
}

impl MicrophoneWakeListener {
    pub fn new(stt: Arc<dyn SttEngine>, assistant: &AssistantConfig, audio: &AudioConfig) -> Self {
        Self {
            stt,
            phrases: assistant.wake_phrases.clone(),
            settings: RecorderSettings::for_wake(audio),
            device: audio.device.clone(),
            frame_length: audio.frame_length,
            read_timeout: audio.read_timeout(),
        }
    }
}

impl WakeListener for MicrophoneWakeListener {
    fn wait_for_wake_word(&self) -> Result<(), WakeError> {
        let mut source = MicrophoneFrameSource::open(
            self.device.as_deref(),
            self.frame_length,
            self.read_timeout,
        )?;
        let mut detector = TranscriptWakeDetector::new(self.stt.clone(), &self.phrases, &self.settings);

        log::info!("wake: listening for {:?}", self.phrases);
        wait_for_wake(&mut source, &mut detector)?;
        log::info!("wake: wake word detected");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemoryFrameSource;

    /// Detects on the n-th frame.
    struct CountingDetector {
        fire_at: usize,
        seen: usize,
        resets: usize,
    }

    impl WakeWordDetector for CountingDetector {
        fn process_frame(&mut self, _frame: &[f32]) -> bool {
            self.seen += 1;
            self.seen == self.fire_at
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn returns_on_first_detection() {
        let mut source = MemoryFrameSource::new(MemoryFrameSource::constant(0.0, 512, 10));
        let mut detector = CountingDetector { fire_at: 4, seen: 0, resets: 0 };

        wait_for_wake(&mut source, &mut detector).unwrap();
        assert_eq!(detector.seen, 4);
        assert_eq!(detector.resets, 1);
    }

    #[test]
    fn device_loss_is_an_error() {
        let mut source = MemoryFrameSource::new(MemoryFrameSource::constant(0.0, 512, 3));
        let mut detector = CountingDetector { fire_at: 100, seen: 0, resets: 0 };

        assert!(matches!(
            wait_for_wake(&mut source, &mut detector),
            Err(CaptureError::Disconnected)
        ));
    }

    #[test]
    fn wake_error_wraps_capture_error() {
        let err: WakeError = CaptureError::Disconnected.into();
        assert!(err.to_string().contains("wake word"));
    }
}
