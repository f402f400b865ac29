use std::sync::{Arc, Mutex};

use super::{Fetcher, SampleBuffer};
use crate::CaptureError;
use tracing::{debug, info};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AnalyserNode, AudioContext, MediaStream, MediaStreamConstraints, MediaStreamTrack};

/// Fetcher for WebAudio API in WASM environments.
///
/// Uses an `AnalyserNode` as a tap to pull time-domain audio data each frame.
/// [`update`](Fetcher::update) has to be called on each animation frame to feed
/// new samples into the shared `SampleBuffer`.
pub struct WebAudioFetcher {
    sample_buffer: Arc<Mutex<SampleBuffer>>,
    context: AudioContext,
    stream: MediaStream,
    analyser: AnalyserNode,
    channels: u16,
    time_data: Vec<f32>,
    closed: bool,
}

impl WebAudioFetcher {
    /// Asks the browser for the microphone and connects it to a new `AudioContext`.
    ///
    /// `fft_size` has to be a power of two in `[32, 32768]`.
    pub async fn acquire(fft_size: usize) -> Result<Self, CaptureError> {
        let window = web_sys::window().ok_or(CaptureError::NoDevice)?;
        let media_devices = window.navigator().media_devices().map_err(unavailable)?;

        let constraints = MediaStreamConstraints::new();
        constraints.set_audio(&JsValue::TRUE);

        let stream: MediaStream = JsFuture::from(
            media_devices
                .get_user_media_with_constraints(&constraints)
                .map_err(unavailable)?,
        )
        .await
        .map_err(unavailable)?
        .dyn_into()
        .map_err(unavailable)?;

        let context = AudioContext::new().map_err(unavailable)?;
        let source = context
            .create_media_stream_source(&stream)
            .map_err(unavailable)?;

        let analyser = context.create_analyser().map_err(unavailable)?;
        analyser.set_fft_size(fft_size as u32);
        source
            .connect_with_audio_node(&analyser)
            .map_err(unavailable)?;

        let time_data = vec![0.0f32; analyser.fft_size() as usize];
        let sample_rate = context.sample_rate() as u32;
        let sample_buffer = Arc::new(Mutex::new(SampleBuffer::new(sample_rate, fft_size)));

        info!("Microphone acquired ({} Hz)", sample_rate);

        Ok(Self {
            sample_buffer,
            context,
            stream,
            analyser,
            channels: source.channel_count() as u16,
            time_data,
            closed: false,
        })
    }
}

impl Fetcher for WebAudioFetcher {
    fn sample_buffer(&self) -> Arc<Mutex<SampleBuffer>> {
        self.sample_buffer.clone()
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn update(&mut self) {
        if self.closed {
            return;
        }

        self.analyser.get_float_time_domain_data(&mut self.time_data);
        if let Ok(mut buf) = self.sample_buffer.lock() {
            buf.push_latest(&self.time_data);
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }

        if let Err(err) = self.context.close() {
            debug!("Couldn't close the audio context: {:?}", err);
        }
        info!("Microphone released");
    }
}

impl Drop for WebAudioFetcher {
    fn drop(&mut self) {
        self.close();
    }
}

fn unavailable(err: impl std::fmt::Debug) -> CaptureError {
    CaptureError::Unavailable(format!("{err:?}"))
}
