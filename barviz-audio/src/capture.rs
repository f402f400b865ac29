//! Turns a [Fetcher] into a stream of [SampleFrame]s.
use std::time::Duration;

use tracing::{debug, info};

use crate::{
    channel::{FrameChannel, SubscriptionId},
    fetcher::Fetcher,
    Analyser, AnalyserConfig, SampleFrame,
};

#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    #[error("No audio input device available")]
    NoDevice,

    #[error("Audio input is unavailable: {0}")]
    Unavailable(String),
}

/// The lifecycle of a [CaptureSource].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Running,
    Stopped,
}

/// Owns the device (through its fetcher) and the analyser and publishes one
/// [SampleFrame] per tick.
///
/// The host decides when a tick happens (for example once per animation frame).
pub struct CaptureSource<F: Fetcher> {
    // `None` as soon as the source got stopped, which drops the device as well
    fetcher: Option<F>,
    analyser: Analyser,
    channel: FrameChannel,
}

impl<F: Fetcher> CaptureSource<F> {
    /// Wraps an already acquired fetcher.
    pub fn new(fetcher: F, config: AnalyserConfig) -> Self {
        Self {
            fetcher: Some(fetcher),
            analyser: Analyser::new(config),
            channel: FrameChannel::new(),
        }
    }

    /// Reads the latest samples of the device, analyses them into a new frame and
    /// publishes it to every subscriber.
    ///
    /// Returns `None` once the source has been stopped.
    pub fn tick(&mut self) -> Option<SampleFrame> {
        let fetcher = self.fetcher.as_mut()?;
        fetcher.update();

        let frame = {
            let sample_buffer = fetcher.sample_buffer();
            let Ok(buffer) = sample_buffer.lock() else {
                return None;
            };

            self.analyser.analyse(buffer.buffer())
        };

        self.channel.publish(&frame);
        Some(frame)
    }

    /// Stops the device and releases it. Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(mut fetcher) = self.fetcher.take() {
            fetcher.close();
            info!("Capture stopped");
        } else {
            debug!("Capture was already stopped");
        }
    }

    pub fn state(&self) -> CaptureState {
        if self.fetcher.is_some() {
            CaptureState::Running
        } else {
            CaptureState::Stopped
        }
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&SampleFrame) + 'static) -> SubscriptionId {
        self.channel.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.channel.unsubscribe(id)
    }

    pub fn analyser_config(&self) -> &AnalyserConfig {
        self.analyser.config()
    }

    /// Returns the fetcher as long as the source is running.
    pub fn fetcher(&self) -> Option<&F> {
        self.fetcher.as_ref()
    }
}

impl<F: Fetcher> Drop for CaptureSource<F> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
impl CaptureSource<crate::fetcher::SystemAudioFetcher> {
    /// Opens the input device described by `desc` and starts capturing.
    ///
    /// The capacity of the descriptor is overridden by the fft size of `config`.
    pub fn acquire(
        desc: crate::fetcher::SystemAudioFetcherDescriptor,
        config: AnalyserConfig,
    ) -> Result<Self, CaptureError> {
        let fetcher = crate::fetcher::SystemAudioFetcher::acquire(
            &crate::fetcher::SystemAudioFetcherDescriptor {
                capacity: config.fft_size,
                ..desc
            },
        )?;

        Ok(Self::new(fetcher, config))
    }
}

#[cfg(target_arch = "wasm32")]
impl CaptureSource<crate::fetcher::WebAudioFetcher> {
    /// Asks the browser for the microphone and starts capturing.
    pub async fn acquire(config: AnalyserConfig) -> Result<Self, CaptureError> {
        let fetcher = crate::fetcher::WebAudioFetcher::acquire(config.fft_size).await?;
        Ok(Self::new(fetcher, config))
    }
}

/// Configuration of a [DemoSource].
#[derive(Debug, Clone, PartialEq)]
pub struct DemoConfig {
    /// Time between two frames.
    pub interval: Duration,
    /// Amount of values of each frame.
    pub frame_len: usize,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            frame_len: 10,
        }
    }
}

/// Synthesizes frames with random values in `[0, 1)` instead of recording anything.
///
/// Useful to check the visuals without a microphone.
pub struct DemoSource {
    config: DemoConfig,
    rng: fastrand::Rng,
    // the elapsed time at which the next frame is due
    next_due: Duration,
    channel: FrameChannel,
}

impl DemoSource {
    pub fn new(config: DemoConfig) -> Self {
        Self::with_rng(config, fastrand::Rng::new())
    }

    /// Same as [DemoSource::new] but with a fixed seed for reproducible frames.
    pub fn with_seed(config: DemoConfig, seed: u64) -> Self {
        Self::with_rng(config, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(config: DemoConfig, rng: fastrand::Rng) -> Self {
        Self {
            config,
            rng,
            next_due: Duration::ZERO,
            channel: FrameChannel::new(),
        }
    }

    /// Creates and publishes a new random frame.
    pub fn next_frame(&mut self) -> SampleFrame {
        let values: Vec<f32> = (0..self.config.frame_len)
            .map(|_| self.rng.f32())
            .collect();

        let frame = SampleFrame::new(values);
        self.channel.publish(&frame);
        frame
    }

    /// Returns a new frame if at least one interval passed since the last one.
    ///
    /// `elapsed` is the time since the demo started. The first call always yields a frame.
    pub fn poll(&mut self, elapsed: Duration) -> Option<SampleFrame> {
        if elapsed < self.next_due {
            return None;
        }

        self.next_due = elapsed + self.config.interval;
        Some(self.next_frame())
    }

    pub fn interval(&self) -> Duration {
        self.config.interval
    }

    pub fn subscribe(&mut self, observer: impl FnMut(&SampleFrame) + 'static) -> SubscriptionId {
        self.channel.subscribe(observer)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.channel.unsubscribe(id)
    }
}

/// Where the frames of a visualizer come from. Live capture and demo mode exclude each other.
pub enum FrameSource<F: Fetcher> {
    Live(CaptureSource<F>),
    Demo(DemoSource),
    /// Acquiring the device failed or the source got stopped. Nothing is drawn.
    Inactive,
}

impl<F: Fetcher> FrameSource<F> {
    /// Returns the next frame if there's one for this tick.
    ///
    /// `elapsed` is the time since the source was created and only relevant for the demo.
    pub fn tick(&mut self, elapsed: Duration) -> Option<SampleFrame> {
        match self {
            Self::Live(source) => source.tick(),
            Self::Demo(demo) => demo.poll(elapsed),
            Self::Inactive => None,
        }
    }

    /// Releases everything. Safe to call in every state and multiple times.
    pub fn stop(&mut self) {
        if let Self::Live(source) = self {
            source.stop();
        }
        *self = Self::Inactive;
    }

    pub fn is_demo(&self) -> bool {
        matches!(self, Self::Demo(_))
    }

    /// Registers `observer` for every frame of a live or demo source.
    ///
    /// Returns `None` for an inactive source since it'll never publish anything.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&SampleFrame) + 'static,
    ) -> Option<SubscriptionId> {
        match self {
            Self::Live(source) => Some(source.subscribe(observer)),
            Self::Demo(demo) => Some(demo.subscribe(observer)),
            Self::Inactive => None,
        }
    }
}

impl<F: Fetcher> From<Result<CaptureSource<F>, CaptureError>> for FrameSource<F> {
    fn from(result: Result<CaptureSource<F>, CaptureError>) -> Self {
        match result {
            Ok(source) => Self::Live(source),
            Err(err) => {
                tracing::warn!("{}. Nothing will be drawn.", err);
                Self::Inactive
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::DummyFetcher;
    use std::{cell::RefCell, rc::Rc};

    fn dummy_source() -> CaptureSource<DummyFetcher> {
        let config = AnalyserConfig::default();
        CaptureSource::new(DummyFetcher::new(1, config.fft_size), config)
    }

    mod capture_source {
        use super::*;

        #[test]
        fn tick_publishes_a_new_frame() {
            let mut source = dummy_source();
            let received = Rc::new(RefCell::new(Vec::new()));

            {
                let received = received.clone();
                source.subscribe(move |frame: &SampleFrame| received.borrow_mut().push(frame.id()));
            }

            let first = source.tick().unwrap();
            let second = source.tick().unwrap();

            assert_eq!(first.len(), 128);
            assert_ne!(first.id(), second.id());
            assert_eq!(*received.borrow(), vec![first.id(), second.id()]);
        }

        #[test]
        fn old_frames_stay_untouched() {
            let mut source = dummy_source();

            let first = source.tick().unwrap();
            let before = first.values().to_vec();

            let sine: Vec<f32> = (0..256).map(|n| (n as f32 * 0.4).sin()).collect();
            source.fetcher().unwrap().push(&sine);
            let second = source.tick().unwrap();

            assert_eq!(first.values(), before.as_slice());
            assert_ne!(first.values(), second.values());
        }

        #[test]
        fn stop_is_idempotent() {
            let mut source = dummy_source();

            source.stop();
            source.stop();

            assert_eq!(source.state(), CaptureState::Stopped);
        }

        #[test]
        fn no_frames_after_stop() {
            let mut source = dummy_source();
            let hits = Rc::new(RefCell::new(0));

            {
                let hits = hits.clone();
                source.subscribe(move |_: &SampleFrame| *hits.borrow_mut() += 1);
            }

            assert!(source.tick().is_some());
            source.stop();
            assert!(source.tick().is_none());
            assert_eq!(*hits.borrow(), 1);
        }

        #[test]
        fn unsubscribed_observer_gets_nothing() {
            let mut source = dummy_source();
            let hits = Rc::new(RefCell::new(0));

            let id = {
                let hits = hits.clone();
                source.subscribe(move |_: &SampleFrame| *hits.borrow_mut() += 1)
            };

            assert!(source.unsubscribe(id));
            source.tick();
            assert_eq!(*hits.borrow(), 0);
        }
    }

    mod demo_source {
        use super::*;

        #[test]
        fn values_are_in_unit_range() {
            let mut demo = DemoSource::with_seed(DemoConfig::default(), 42);
            let frame = demo.next_frame();

            assert_eq!(frame.len(), 10);
            assert!(frame.iter().all(|&value| (0. ..1.).contains(&value)));
        }

        #[test]
        fn polls_once_per_interval() {
            let mut demo = DemoSource::with_seed(DemoConfig::default(), 7);

            assert!(demo.poll(Duration::ZERO).is_some());
            assert!(demo.poll(Duration::from_millis(500)).is_none());
            assert!(demo.poll(Duration::from_millis(999)).is_none());
            assert!(demo.poll(Duration::from_millis(1000)).is_some());
            assert!(demo.poll(Duration::from_millis(1500)).is_none());
        }

        #[test]
        fn publishes_to_subscribers() {
            let mut demo = DemoSource::with_seed(DemoConfig::default(), 1);
            let received = Rc::new(RefCell::new(0));

            {
                let received = received.clone();
                demo.subscribe(move |_: &SampleFrame| *received.borrow_mut() += 1);
            }

            demo.next_frame();
            demo.next_frame();
            assert_eq!(*received.borrow(), 2);
        }
    }

    mod frame_source {
        use super::*;

        #[test]
        fn failed_acquire_yields_no_frames() {
            let mut source: FrameSource<DummyFetcher> =
                FrameSource::from(Err(CaptureError::NoDevice));

            assert!(source.tick(Duration::from_secs(10)).is_none());
            source.stop();
            source.stop();
        }

        #[test]
        fn stop_releases_the_fetcher() {
            let mut source = FrameSource::from(Ok(dummy_source()));

            assert!(source.tick(Duration::ZERO).is_some());
            source.stop();
            assert!(source.tick(Duration::ZERO).is_none());
        }

        #[test]
        fn demo_is_driven_by_elapsed_time() {
            let mut source: FrameSource<DummyFetcher> =
                FrameSource::Demo(DemoSource::with_seed(DemoConfig::default(), 3));

            assert!(source.is_demo());
            assert!(source.tick(Duration::ZERO).is_some());
            assert!(source.tick(Duration::from_millis(10)).is_none());
        }

        #[test]
        fn subscribers_see_every_ticked_frame() {
            let mut source = FrameSource::from(Ok(dummy_source()));
            let latest = Rc::new(RefCell::new(None));

            {
                let latest = latest.clone();
                source
                    .subscribe(move |frame: &SampleFrame| *latest.borrow_mut() = Some(frame.id()))
                    .unwrap();
            }

            let frame = source.tick(Duration::ZERO).unwrap();
            assert_eq!(*latest.borrow(), Some(frame.id()));
        }

        #[test]
        fn inactive_source_has_no_subscribers() {
            let mut source: FrameSource<DummyFetcher> = FrameSource::Inactive;
            assert!(source.subscribe(|_: &SampleFrame| {}).is_none());
        }
    }
}
