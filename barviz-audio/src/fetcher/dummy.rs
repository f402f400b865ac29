use std::sync::{Arc, Mutex};

use super::{Fetcher, SampleBuffer};

/// A fetcher which never receives any audio. Mostly useful for tests.
///
/// The samples can still be set by hand through [DummyFetcher::push].
pub struct DummyFetcher {
    sample_buffer: Arc<Mutex<SampleBuffer>>,
    channels: u16,
    closed: bool,
}

impl DummyFetcher {
    /// Creates a silent fetcher with `channels` channels and room for `capacity` samples.
    pub fn new(channels: u16, capacity: usize) -> Self {
        Self {
            sample_buffer: Arc::new(Mutex::new(SampleBuffer::new(
                crate::DEFAULT_SAMPLE_RATE,
                capacity,
            ))),
            channels,
            closed: false,
        }
    }

    /// Feeds the given mono samples into the buffer as if they were recorded.
    pub fn push(&self, samples: &[f32]) {
        if let Ok(mut buffer) = self.sample_buffer.lock() {
            buffer.push_latest(samples);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Fetcher for DummyFetcher {
    fn sample_buffer(&self) -> Arc<Mutex<SampleBuffer>> {
        self.sample_buffer.clone()
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
