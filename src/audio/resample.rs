//! Channel mixing and streaming resampling to 16 kHz.
//!
//! Whisper and the endpointing logic expect **16 kHz mono `f32`** audio.
//!
//! 1. [`stereo_to_mono`] downmixes interleaved channels.
//! 2. [`StreamResampler`] converts a continuous stream from the device rate to
//!    16 kHz with `rubato`'s FFT resampler.  Input arrives in arbitrarily
//!    sized cpal callbacks, so samples are queued until a full resampler
//!    chunk is available; the remainder waits for the next push.

use rubato::{FftFixedIn, Resampler};

use super::capture::CaptureError;

/// Sample rate every downstream consumer works at.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Input frames handed to the FFT resampler per call.
const RESAMPLER_CHUNK: usize = 1_024;

// ---------------------------------------------------------------------------
// stereo_to_mono
// ---------------------------------------------------------------------------

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// # Example
///
/// ```rust
/// use voice_assistant::audio::stereo_to_mono;
///
/// let stereo = vec![0.5_f32, -0.5, 0.2, 0.4]; // L R L R
/// let mono = stereo_to_mono(&stereo, 2);
/// assert_eq!(mono.len(), 2);
/// assert!((mono[1] - 0.3).abs() < 1e-6);
/// ```
pub fn stereo_to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

// ---------------------------------------------------------------------------
// StreamResampler
// ---------------------------------------------------------------------------

/// Stateful mono resampler from a device rate to [`TARGET_SAMPLE_RATE`].
///
/// When the source already runs at 16 kHz samples pass straight through.
pub struct StreamResampler {
    inner: Option<FftFixedIn<f32>>,
    pending: Vec<f32>,
}

impl StreamResampler {
    /// Build a resampler for `source_rate` Hz mono input.
    pub fn new(source_rate: u32) -> Result<Self, CaptureError> {
        let inner = if source_rate == TARGET_SAMPLE_RATE {
            None
        } else {
            let resampler = FftFixedIn::<f32>::new(
                source_rate as usize,
                TARGET_SAMPLE_RATE as usize,
                RESAMPLER_CHUNK,
                2,
                1,
            )
            .map_err(|e| CaptureError::Resample(e.to_string()))?;
            Some(resampler)
        };

        Ok(Self {
            inner,
            pending: Vec::with_capacity(RESAMPLER_CHUNK * 2),
        })
    }

    /// `true` when no conversion is performed.
    pub fn is_passthrough(&self) -> bool {
        self.inner.is_none()
    }

    /// Feed mono samples at the source rate; returns whatever 16 kHz output
    /// could be produced so far.
    pub fn push(&mut self, mono: &[f32]) -> Result<Vec<f32>, CaptureError> {
        let Some(resampler) = self.inner.as_mut() else {
            return Ok(mono.to_vec());
        };

        self.pending.extend_from_slice(mono);

        let mut output = Vec::new();
        loop {
            let needed = resampler.input_frames_next();
            if self.pending.len() < needed {
                break;
            }
            let chunk: Vec<f32> = self.pending.drain(..needed).collect();
            let resampled = resampler
                .process(&[chunk], None)
                .map_err(|e| CaptureError::Resample(e.to_string()))?;
            if let Some(channel) = resampled.first() {
                output.extend_from_slice(channel);
            }
        }

        Ok(output)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
