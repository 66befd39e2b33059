//! Audio input: microphone capture → downmix → resample → fixed-size frames.
//!
//! # Pipeline
//!
//! ```text
//! InputDevice (default or by name) → cpal callback (any sample format → f32)
//!           → stereo_to_mono → Vec<f32> (mpsc)
//!           → StreamResampler (rubato, → 16 kHz) → frames of N samples
//!           → VadDetector (voice / silence per frame)
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use voice_assistant::audio::{AudioFrameSource, MicrophoneFrameSource};
//!
//! let mut source = MicrophoneFrameSource::open(None, 512, Duration::from_secs(2)).unwrap();
//! let frame = source.next_frame().unwrap();
//! assert_eq!(frame.len(), 512);
//! ```

pub mod capture;
pub mod frames;
pub mod resample;
pub mod vad;

pub use capture::{
    device_name_matches, list_input_devices, CaptureError, DeviceInfo, InputDevice, MonoStream,
};
pub use frames::{AudioFrameSource, MicrophoneFrameSource};
pub use resample::{stereo_to_mono, StreamResampler, TARGET_SAMPLE_RATE};
pub use vad::{rms, VadDetector};

#[cfg(test)]
pub use frames::MemoryFrameSource;
