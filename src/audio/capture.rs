//! Input device selection and mono sample streaming via `cpal`.
//!
//! [`InputDevice::open`] picks either the host default input or the first
//! device whose name contains a configured substring.  [`InputDevice::stream_mono`]
//! starts a stream whose callback converts whatever sample format the device
//! reports to `f32`, downmixes it and sends one `Vec<f32>` per callback.
//!
//! Each listener opens its own device on the thread that reads from it.

use std::fmt;
use std::sync::mpsc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use thiserror::Error;

use super::resample::stereo_to_mono;

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no input device found on the default audio host")]
    NoDevice,

    #[error("no input device matches {0:?}")]
    DeviceNotFound(String),

    #[error("failed to enumerate input devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("failed to query default input config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("resampler error: {0}")]
    Resample(String),

    #[error("audio stream delivered no data for {0:?}")]
    Stalled(std::time::Duration),

    #[error("audio stream closed")]
    Disconnected,
}

// ---------------------------------------------------------------------------
// DeviceInfo
// ---------------------------------------------------------------------------

/// What the selected device will deliver before downmixing and resampling.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceInfo {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub format: SampleFormat,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} Hz, {} ch, {:?})",
            self.name, self.sample_rate, self.channels, self.format
        )
    }
}

/// Case-insensitive substring match used for `audio.device`.
pub fn device_name_matches(name: &str, wanted: &str) -> bool {
    let wanted = wanted.trim();
    !wanted.is_empty() && name.to_lowercase().contains(&wanted.to_lowercase())
}

/// Names of every input device on the default host.
pub fn list_input_devices() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();
    Ok(host
        .input_devices()?
        .filter_map(|d| d.name().ok())
        .collect())
}

// ---------------------------------------------------------------------------
// InputDevice
// ---------------------------------------------------------------------------

/// Keeps a cpal stream alive; dropping it stops capture.
pub struct MonoStream {
    _stream: cpal::Stream,
}

pub struct InputDevice {
    device: cpal::Device,
    config: cpal::StreamConfig,
    info: DeviceInfo,
}

impl InputDevice {
    /// Open `wanted` (substring of the device name) or the default input.
    pub fn open(wanted: Option<&str>) -> Result<Self, CaptureError> {
        let host = cpal::default_host();
        let device = match wanted.map(str::trim).filter(|w| !w.is_empty()) {
            Some(wanted) => {
                let mut found = None;
                for device in host.input_devices()? {
                    if device
                        .name()
                        .map_or(false, |name| device_name_matches(&name, wanted))
                    {
                        found = Some(device);
                        break;
                    }
                }
                found.ok_or_else(|| CaptureError::DeviceNotFound(wanted.to_string()))?
            }
            None => host.default_input_device().ok_or(CaptureError::NoDevice)?,
        };

        let supported = device.default_input_config()?;
        let info = DeviceInfo {
            name: device.name().unwrap_or_else(|_| "<unknown device>".to_string()),
            sample_rate: supported.sample_rate().0,
            channels: supported.channels(),
            format: supported.sample_format(),
        };

        Ok(Self {
            device,
            config: supported.config(),
            info,
        })
    }

    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Start streaming mono `f32` samples at the device's native rate.
    ///
    /// Send errors (receiver dropped) are ignored inside the callback.
    pub fn stream_mono(&self, tx: mpsc::Sender<Vec<f32>>) -> Result<MonoStream, CaptureError> {
        let stream = match self.info.format {
            SampleFormat::F32 => self.build::<f32>(tx)?,
            SampleFormat::I16 => self.build::<i16>(tx)?,
            SampleFormat::I32 => self.build::<i32>(tx)?,
            SampleFormat::U16 => self.build::<u16>(tx)?,
            other => return Err(CaptureError::UnsupportedFormat(format!("{other:?}"))),
        };

        stream.play()?;
        Ok(MonoStream { _stream: stream })
    }

    fn build<T>(&self, tx: mpsc::Sender<Vec<f32>>) -> Result<cpal::Stream, CaptureError>
    where
        T: SizedSample,
        f32: FromSample<T>,
    {
        let channels = self.info.channels;
        let stream = self.device.build_input_stream(
            &self.config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data.iter().map(|&s| s.to_sample::<f32>()).collect();
                let _ = tx.send(stereo_to_mono(&samples, channels));
            },
            |err: cpal::StreamError| log::error!("audio: stream error: {err}"),
            None,
        )?;
        Ok(stream)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
