//! The message contract of the playback and recording worklets.
//!
//! A playback worklet receives either a buffer of 16 bit samples which should be
//! queued for playback or an empty message which drops everything that is still
//! queued. A recording worklet sends one message per recorded buffer.

/// Scale between `i16` samples and `f32` samples in `[-1, 1)`.
pub const I16_SCALE: f32 = 32_768.;

/// A message which is sent to a playback worklet.
#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackMessage {
    /// Queue the samples for playback (after everything which is already queued).
    Enqueue(Vec<i16>),
    /// Drop all queued samples.
    Clear,
}

impl From<Option<Vec<i16>>> for PlaybackMessage {
    /// `None` and empty buffers are both treated as "clear".
    fn from(samples: Option<Vec<i16>>) -> Self {
        match samples {
            Some(samples) if !samples.is_empty() => Self::Enqueue(samples),
            _ => Self::Clear,
        }
    }
}

/// Converts `f32` samples into `i16` samples for a playback worklet.
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|sample| {
            (sample.clamp(-1., 1.) * I16_SCALE).clamp(i16::MIN as f32, i16::MAX as f32) as i16
        })
        .collect()
}
