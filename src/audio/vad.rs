//! Simple energy-based Voice Activity Detection (VAD).
//!
//! A frame is classified as *voice* when its RMS amplitude exceeds the
//! detector's threshold.  The threshold starts at the configured floor and
//! can be raised from an ambient-noise measurement taken right after a
//! microphone session opens, so a noisy room does not register as speech.

/// Multiplier applied to the measured ambient RMS during calibration.
pub const AMBIENT_RATIO: f32 = 1.5;

/// Root-mean-square amplitude of `frame`; `0.0` for an empty frame.
pub fn rms(frame: &[f32]) -> f32 {
    if frame.is_empty() {
        return 0.0;
    }
    let mean_sq: f32 = frame.iter().map(|s| s * s).sum::<f32>() / frame.len() as f32;
    mean_sq.sqrt()
}

// ---------------------------------------------------------------------------
// VadDetector
// ---------------------------------------------------------------------------

/// Energy-threshold voice detector.
///
/// # Example
///
/// ```rust
/// use voice_assistant::audio::VadDetector;
///
/// let mut vad = VadDetector::new(0.01);
/// assert!(!vad.is_voice_frame(&[0.0; 480]));
/// assert!(vad.is_voice_frame(&[0.5; 480]));
///
/// // A hum at 0.02 RMS lifts the threshold to 0.03.
/// vad.calibrate(0.02);
/// assert!(!vad.is_voice_frame(&[0.025; 480]));
/// ```
#[derive(Debug, Clone)]
pub struct VadDetector {
    /// Configured lower bound; calibration never goes below it.
    floor: f32,
    /// Threshold currently in effect.
    rms_threshold: f32,
}

impl VadDetector {
    /// Create a [`VadDetector`] with the given RMS threshold.
    ///
    /// `rms_threshold` should be in `[0.0, 1.0]`.  A typical value is
    /// `0.01`–`0.02` for a quiet room.
    pub fn new(rms_threshold: f32) -> Self {
        Self {
            floor: rms_threshold,
            rms_threshold,
        }
    }

    /// RMS threshold currently in use.
    pub fn threshold(&self) -> f32 {
        self.rms_threshold
    }

    /// Adapt to the measured ambient level: the threshold becomes
    /// `max(floor, ambient_rms * AMBIENT_RATIO)`.
    pub fn calibrate(&mut self, ambient_rms: f32) {
        self.rms_threshold = self.floor.max(ambient_rms * AMBIENT_RATIO);
        log::debug!(
            "vad: ambient rms {ambient_rms:.4}, threshold {:.4}",
            self.rms_threshold
        );
    }

    /// Drop any calibration and return to the configured floor.
    pub fn reset(&mut self) {
        self.rms_threshold = self.floor;
    }

    /// Returns `true` when the frame contains voice activity.
    pub fn is_voice_frame(&self, frame: &[f32]) -> bool {
        !frame.is_empty() && rms(frame) > self.rms_threshold
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
