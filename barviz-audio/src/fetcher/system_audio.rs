use std::sync::{Arc, Mutex};

use cpal::{
    traits::{DeviceTrait, HostTrait, StreamTrait},
    FromSample, Sample, SampleFormat, SizedSample,
};
use tracing::{debug, info, warn};

use super::{mix_to_mono, Fetcher, SampleBuffer};
use crate::CaptureError;

/// Decides which input device should be opened.
#[derive(Debug, Clone, Default)]
pub struct Descriptor {
    /// The name of the input device. The default input device is used if `None`.
    pub device_name: Option<String>,

    /// How many mono samples the [SampleBuffer] holds.
    /// Should be the fft size of the analyser.
    pub capacity: usize,
}

/// Captures the microphone (or any other input device) through [cpal].
pub struct SystemAudio {
    sample_buffer: Arc<Mutex<SampleBuffer>>,
    channels: u16,

    // the stream stops recording as soon as it gets dropped
    stream: Option<cpal::Stream>,
}

impl SystemAudio {
    /// Opens the input device and starts recording.
    pub fn acquire(desc: &Descriptor) -> Result<Self, CaptureError> {
        let host = cpal::default_host();

        let device = match &desc.device_name {
            Some(name) => host
                .input_devices()
                .map_err(unavailable)?
                .find(|device| device_name(device).as_deref() == Some(name.as_str())),
            None => host.default_input_device(),
        }
        .ok_or(CaptureError::NoDevice)?;

        info!(
            "Capturing from input device: {}",
            device_name(&device).unwrap_or_else(|| "<unknown>".into())
        );

        let supported = device.default_input_config().map_err(unavailable)?;
        let sample_rate = supported.sample_rate();
        let channels = supported.channels();
        debug!(
            "Input config: {} channel(s), {} Hz, {:?}",
            channels,
            sample_rate,
            supported.sample_format()
        );

        let sample_buffer = Arc::new(Mutex::new(SampleBuffer::new(sample_rate, desc.capacity)));

        let config = supported.config();
        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, sample_buffer.clone()),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, sample_buffer.clone()),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, sample_buffer.clone()),
            SampleFormat::I32 => build_stream::<i32>(&device, &config, sample_buffer.clone()),
            other => {
                return Err(CaptureError::Unavailable(format!(
                    "Unsupported sample format: {other}"
                )))
            }
        }?;

        stream.play().map_err(unavailable)?;

        Ok(Self {
            sample_buffer,
            channels,
            stream: Some(stream),
        })
    }
}

impl Fetcher for SystemAudio {
    fn sample_buffer(&self) -> Arc<Mutex<SampleBuffer>> {
        self.sample_buffer.clone()
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(err) = stream.pause() {
                debug!("Couldn't pause input stream before closing it: {}", err);
            }
            info!("Input stream closed");
        }
    }
}

impl Drop for SystemAudio {
    fn drop(&mut self) {
        self.close();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_buffer: Arc<Mutex<SampleBuffer>>,
) -> Result<cpal::Stream, CaptureError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels;

    device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| {
                let samples: Vec<f32> = data
                    .iter()
                    .map(|&sample| sample.to_sample::<f32>())
                    .collect();
                let mono = mix_to_mono(&samples, channels);

                if let Ok(mut buffer) = sample_buffer.lock() {
                    buffer.push_latest(&mono);
                }
            },
            |err| warn!("Input stream error: {}", err),
            None,
        )
        .map_err(unavailable)
}

/// Returns the names of all available input devices.
pub fn input_device_names() -> Result<Vec<String>, CaptureError> {
    let host = cpal::default_host();

    Ok(host
        .input_devices()
        .map_err(unavailable)?
        .filter_map(|device| device_name(&device))
        .collect())
}

#[allow(deprecated)]
fn device_name(device: &cpal::Device) -> Option<String> {
    device.name().ok()
}

fn unavailable(err: impl std::fmt::Display) -> CaptureError {
    CaptureError::Unavailable(err.to_string())
}
