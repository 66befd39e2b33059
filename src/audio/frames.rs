//! Fixed-size 16 kHz mono frames pulled from a microphone-like device.
//!
//! [`AudioFrameSource`] is the leaf interface every listener reads from.
//! [`MicrophoneFrameSource`] implements it on top of [`InputDevice`]: mono
//! callbacks are resampled and re-cut into frames of exactly `frame_length`
//! samples.
//!
//! A `MicrophoneFrameSource` owns a live cpal stream, which is not `Send` on
//! every platform.  Open it on the thread that reads from it.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::time::Duration;

use super::capture::{CaptureError, InputDevice, MonoStream};
use super::resample::{StreamResampler, TARGET_SAMPLE_RATE};

// ---------------------------------------------------------------------------
// AudioFrameSource
// ---------------------------------------------------------------------------

/// Blocking source of fixed-size mono frames at [`TARGET_SAMPLE_RATE`].
pub trait AudioFrameSource {
    /// Block until the next frame is available.
    fn next_frame(&mut self) -> Result<Vec<f32>, CaptureError>;

    /// Number of samples in every frame returned by [`next_frame`](Self::next_frame).
    fn frame_length(&self) -> usize;

    /// Sample rate of the frames in Hz.
    fn sample_rate(&self) -> u32 {
        TARGET_SAMPLE_RATE
    }
}

// ---------------------------------------------------------------------------
// MicrophoneFrameSource
// ---------------------------------------------------------------------------

/// Frame source backed by the default input device.
pub struct MicrophoneFrameSource {
    _stream: MonoStream,
    rx: mpsc::Receiver<Vec<f32>>,
    resampler: StreamResampler,
    pending: VecDeque<f32>,
    frame_length: usize,
    read_timeout: Duration,
}

impl MicrophoneFrameSource {
    /// Open `device` (or the default input) and start streaming.
    ///
    /// `read_timeout` bounds how long [`next_frame`](AudioFrameSource::next_frame)
    /// waits for the device before reporting [`CaptureError::Stalled`].
    pub fn open(
        device: Option<&str>,
        frame_length: usize,
        read_timeout: Duration,
    ) -> Result<Self, CaptureError> {
        let input = InputDevice::open(device)?;
        let (tx, rx) = mpsc::channel::<Vec<f32>>();
        let resampler = StreamResampler::new(input.info().sample_rate)?;
        let stream = input.stream_mono(tx)?;

        log::debug!("audio: opened {}", input.info());

        Ok(Self {
            _stream: stream,
            rx,
            resampler,
            pending: VecDeque::with_capacity(frame_length * 4),
            frame_length: frame_length.max(1),
            read_timeout,
        })
    }
}

impl AudioFrameSource for MicrophoneFrameSource {
    fn next_frame(&mut self) -> Result<Vec<f32>, CaptureError> {
        while self.pending.len() < self.frame_length {
            let mono = self.rx.recv_timeout(self.read_timeout).map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => CaptureError::Stalled(self.read_timeout),
                mpsc::RecvTimeoutError::Disconnected => CaptureError::Disconnected,
            })?;

            let resampled = self.resampler.push(&mono)?;
            self.pending.extend(resampled);
        }

        Ok(self.pending.drain(..self.frame_length).collect())
    }

    fn frame_length(&self) -> usize {
        self.frame_length
    }
}

// ---------------------------------------------------------------------------
// MemoryFrameSource  (test-only)
// ---------------------------------------------------------------------------

/// Replays a fixed list of frames, then reports [`CaptureError::Disconnected`].
#[cfg(test)]
pub struct MemoryFrameSource {
    frames: VecDeque<Vec<f32>>,
    frame_length: usize,
}

#[cfg(test)]
impl MemoryFrameSource {
    pub fn new(frames: Vec<Vec<f32>>) -> Self {
        let frame_length = frames.first().map(Vec::len).unwrap_or(512);
        Self {
            frames: frames.into(),
            frame_length,
        }
    }

    /// `count` frames of constant amplitude.
    pub fn constant(amplitude: f32, frame_length: usize, count: usize) -> Vec<Vec<f32>> {
        vec![vec![amplitude; frame_length]; count]
    }
}

#[cfg(test)]
impl AudioFrameSource for MemoryFrameSource {
    fn next_frame(&mut self) -> Result<Vec<f32>, CaptureError> {
        self.frames.pop_front().ok_or(CaptureError::Disconnected)
    }

    fn frame_length(&self) -> usize {
        self.frame_length
    }
}
