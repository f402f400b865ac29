//! # Description
//! A crate which turns a live audio input into frames of frequency magnitudes and
//! maps those frames onto a fixed amount of bars.
//!
//! ### [cpal]
//!
//! With the `native` feature this crate also re-exports [cpal] so there's no need
//! to add [cpal] exclusively to your dependency list.
//!
//! # Example
//!
//! ## Simple workflow
//! A simple workflow can look like this:
//! ```
//! use barviz_audio::{fetcher::DummyFetcher, resample, Aggregation, AnalyserConfig, CaptureSource};
//!
//! let config = AnalyserConfig::default();
//! let mut source = CaptureSource::new(DummyFetcher::new(1, config.fft_size), config);
//!
//! loop {
//!     // once per animation frame: analyse the latest samples
//!     let frame = source.tick().unwrap();
//!
//!     // each frame has `fft_size / 2` values
//!     assert_eq!(frame.len(), 128);
//!
//!     // map them onto 24 bars
//!     let bars = resample(&frame, 24, Aggregation::Peak);
//!     assert_eq!(bars.len(), 24);
//!
//!     break;
//! }
//!
//! // releases the device
//! source.stop();
//! assert!(source.tick().is_none());
//! ```
//!
//! ## Multiple observers
//! Every subscriber gets each frame in the order they were produced.
//!
//! ```
//! use std::{cell::RefCell, rc::Rc};
//! use barviz_audio::{fetcher::DummyFetcher, AnalyserConfig, CaptureSource, SampleFrame};
//!
//! let config = AnalyserConfig::default();
//! let mut source = CaptureSource::new(DummyFetcher::new(1, config.fft_size), config);
//!
//! let seen = Rc::new(RefCell::new(0));
//! let counter = seen.clone();
//! let id = source.subscribe(move |_: &SampleFrame| *counter.borrow_mut() += 1);
//! source.subscribe(|frame: &SampleFrame| assert_eq!(frame.len(), 128));
//!
//! source.tick();
//! source.unsubscribe(id);
//! source.tick();
//!
//! assert_eq!(*seen.borrow(), 1);
//! ```
pub mod channel;
pub mod fetcher;
pub mod worklet;

mod analyser;
mod capture;
mod frame;
mod resample;

pub use analyser::{Analyser, AnalyserConfig};
pub use capture::{
    CaptureError, CaptureSource, CaptureState, DemoConfig, DemoSource, FrameSource,
};
#[cfg(all(feature = "native", not(target_arch = "wasm32")))]
pub use cpal;
pub use frame::{FrameId, SampleFrame, WeakFrame};
pub use resample::{resample, Aggregation, ResampleCache};

/// Samples per second.
pub type SampleRate = u32;

/// The default sample rate for a fetcher.
/// Fetchers are allowed to use this for orientation.
pub const DEFAULT_SAMPLE_RATE: SampleRate = 44_100;
