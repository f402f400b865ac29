//! Each struct here can be used to fetch the audio data from various sources.
//! Pick the one you need to fetch from.
mod dummy;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
mod system_audio;

#[cfg(target_arch = "wasm32")]
mod web_audio;

use crate::SampleRate;
use std::sync::{Arc, Mutex};

pub use dummy::DummyFetcher;

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub use system_audio::{
    input_device_names, Descriptor as SystemAudioFetcherDescriptor,
    SystemAudio as SystemAudioFetcher,
};

#[cfg(target_arch = "wasm32")]
pub use web_audio::WebAudioFetcher;

/// Interface for all structs (fetchers) which are listed in the [fetcher module](crate::fetcher).
pub trait Fetcher {
    /// Returns the [SampleBuffer] (aka the input for the analyser).
    fn sample_buffer(&self) -> Arc<Mutex<SampleBuffer>>;

    /// Returns the amount of channels of the device. The samples in the
    /// [SampleBuffer] are already mixed down to mono.
    fn channels(&self) -> u16;

    /// Pull based fetchers refresh their [SampleBuffer] here.
    /// Gets called once per tick before the buffer is read.
    fn update(&mut self) {}

    /// Releases the device and everything attached to it.
    ///
    /// Must be safe to call multiple times.
    fn close(&mut self) {}
}

/// Holds the latest mono samples which get filled by the fetcher.
///
/// The samples are ordered by time: the oldest sample is at index `0`, the newest
/// one at the end.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    buffer: Box<[f32]>,
    sample_rate: SampleRate,
}

impl SampleBuffer {
    /// Create a new instance for the given sample rate which holds `capacity` samples.
    pub fn new(sample_rate: SampleRate, capacity: usize) -> Self {
        Self {
            buffer: vec![0f32; capacity].into_boxed_slice(),
            sample_rate,
        }
    }

    /// Appends `data` to the end of the buffer and drops the same amount of the
    /// oldest samples.
    pub fn push_latest(&mut self, data: &[f32]) {
        let buffer_len = self.buffer.len();
        let data_len = data.len();

        if data_len >= buffer_len {
            self.buffer
                .copy_from_slice(&data[data_len - buffer_len..]);
            return;
        }

        // move the current values to the left...
        self.buffer.copy_within(data_len.., 0);
        // ... and write the new data at the end
        self.buffer[buffer_len - data_len..].copy_from_slice(data);
    }

    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn buffer(&self) -> &[f32] {
        &self.buffer
    }
}

/// Mixes interleaved samples with `channels` channels down to mono.
pub fn mix_to_mono(interleaved: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}
