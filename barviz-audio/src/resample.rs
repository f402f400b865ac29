//! Maps frames of arbitrary length onto a fixed amount of bars.
use std::{collections::HashMap, sync::Arc};

use crate::{frame::WeakFrame, FrameId, SampleFrame};

/// How multiple source values which fall into the same bar are combined
/// when downsampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Aggregation {
    /// Take the largest absolute value of the bucket.
    #[default]
    Peak,
    /// Take the mean of the absolute values of the bucket.
    Average,
}

/// Resamples `data` to exactly `len` values.
///
/// - `len <= data.len()`: source index `i` lands in bucket `i * len / data.len()`
///   and each bucket is combined according to `aggregation`.
/// - `len > data.len()`: linear interpolation between the neighbouring source values.
///   The first and last value are taken over unchanged.
///
/// Returns an empty vector if `data` is empty or `len` is zero.
pub fn resample(data: &[f32], len: usize, aggregation: Aggregation) -> Vec<f32> {
    if data.is_empty() || len == 0 {
        return Vec::new();
    }

    if len <= data.len() {
        downsample(data, len, aggregation)
    } else {
        upsample(data, len)
    }
}

fn downsample(data: &[f32], len: usize, aggregation: Aggregation) -> Vec<f32> {
    let data_len = data.len();
    let mut buckets = vec![0f32; len];
    let mut counts = vec![0usize; len];

    for (idx, value) in data.iter().enumerate() {
        let bucket = idx * len / data_len;
        let value = value.abs();

        match aggregation {
            Aggregation::Peak => buckets[bucket] = buckets[bucket].max(value),
            Aggregation::Average => buckets[bucket] += value,
        }
        counts[bucket] += 1;
    }

    if aggregation == Aggregation::Average {
        for (bucket, &count) in buckets.iter_mut().zip(counts.iter()) {
            // empty buckets stay at zero
            if count > 0 {
                *bucket /= count as f32;
            }
        }
    }

    buckets
}

fn upsample(data: &[f32], len: usize) -> Vec<f32> {
    debug_assert!(len > data.len());

    let data_len = data.len();
    let last = data[data_len - 1];

    (0..len)
        .map(|idx| {
            let pos = (idx * (data_len - 1)) as f64 / (len - 1) as f64;
            let low = pos.floor() as usize;
            let high = pos.ceil() as usize;
            let t = (pos - low as f64) as f32;

            if high >= data_len {
                last
            } else {
                data[low] * (1. - t) + data[high] * t
            }
        })
        .collect()
}

struct CacheEntry {
    frame: WeakFrame,
    series: HashMap<(usize, Aggregation), Arc<[f32]>>,
}

/// Remembers the resampled values of each frame.
///
/// The cache only holds a weak handle to the frames it has seen. As soon as the
/// last [SampleFrame] of an identity is dropped its entry becomes invalid and gets
/// removed on the next access.
#[derive(Default)]
pub struct ResampleCache {
    entries: HashMap<FrameId, CacheEntry>,
    recomputations: usize,
}

impl ResampleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same as [resample] but returns the already computed values if `frame` has been
    /// resampled with the same `len` and `aggregation` before.
    pub fn resample(
        &mut self,
        frame: &SampleFrame,
        len: usize,
        aggregation: Aggregation,
    ) -> Arc<[f32]> {
        self.purge();

        let entry = self
            .entries
            .entry(frame.id())
            .or_insert_with(|| CacheEntry {
                frame: frame.downgrade(),
                series: HashMap::new(),
            });

        if let Some(series) = entry.series.get(&(len, aggregation)) {
            return series.clone();
        }

        self.recomputations += 1;
        let series: Arc<[f32]> = resample(frame.values(), len, aggregation).into();
        entry.series.insert((len, aggregation), series.clone());

        series
    }

    /// Drops every entry whose frame doesn't exist anymore.
    pub fn purge(&mut self) {
        self.entries.retain(|_, entry| entry.frame.is_alive());
    }

    /// How often the cache had to compute a series instead of returning a cached one.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// Amount of frames which currently have an entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ResampleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResampleCache")
            .field("entries", &self.entries.len())
            .field("recomputations", &self.recomputations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod downsample {
        use super::*;

        #[test]
        fn peaks_of_each_bucket() {
            let result = resample(&[0.2, 0.8, 0.4, 0.1], 2, Aggregation::Peak);
            assert_eq!(result, vec![0.8, 0.4]);
        }

        #[test]
        fn average_of_each_bucket() {
            let result = resample(&[0.2, 0.6, -0.4, 0.1], 2, Aggregation::Average);

            assert_eq!(result.len(), 2);
            assert!((result[0] - 0.4).abs() < 1e-6);
            assert!((result[1] - 0.25).abs() < 1e-6);
        }

        #[test]
        fn peaks_use_absolute_values() {
            let result = resample(&[-90., -30., -60., -10.], 2, Aggregation::Peak);
            assert_eq!(result, vec![90., 60.]);
        }

        #[test]
        fn same_length_keeps_absolute_values() {
            let result = resample(&[1., -2., 3.], 3, Aggregation::Peak);
            assert_eq!(result, vec![1., 2., 3.]);
        }

        #[test]
        fn bounded_by_max_absolute_input() {
            let data: Vec<f32> = (0..128).map(|i| ((i * 37) % 101) as f32 - 50.).collect();
            let max = data.iter().fold(0f32, |acc, v| acc.max(v.abs()));

            for len in 1..=data.len() {
                let result = resample(&data, len, Aggregation::Peak);

                assert_eq!(result.len(), len);
                assert!(result.iter().all(|&value| value <= max));
            }
        }

        #[test]
        fn no_nan_in_average_mode() {
            let data: Vec<f32> = (0..10).map(|i| i as f32).collect();

            for len in 1..=data.len() {
                let result = resample(&data, len, Aggregation::Average);
                assert!(result.iter().all(|value| !value.is_nan()));
            }
        }
    }

    mod upsample {
        use super::*;

        #[test]
        fn interpolates_linearly() {
            let result = resample(&[0., 1.], 3, Aggregation::Peak);
            assert_eq!(result, vec![0., 0.5, 1.]);
        }

        #[test]
        fn keeps_first_and_last_value() {
            for data_len in 1..64 {
                let data: Vec<f32> = (0..data_len)
                    .map(|i| -((i * 37 % 100) as f32) - 0.25)
                    .collect();

                for len in (data_len + 1)..300 {
                    let result = resample(&data, len, Aggregation::Peak);

                    assert_eq!(result.len(), len);
                    assert_eq!(result[0], data[0]);
                    assert_eq!(result[len - 1], data[data_len - 1]);
                }
            }
        }

        #[test]
        fn single_value_is_repeated() {
            let result = resample(&[0.7], 4, Aggregation::Average);
            assert_eq!(result, vec![0.7; 4]);
        }
    }

    #[test]
    fn empty_input() {
        assert!(resample(&[], 10, Aggregation::Peak).is_empty());
    }

    #[test]
    fn zero_bars() {
        assert!(resample(&[1., 2., 3.], 0, Aggregation::Peak).is_empty());
    }

    mod cache {
        use super::*;

        #[test]
        fn returns_cached_series() {
            let mut cache = ResampleCache::new();
            let frame = SampleFrame::new(vec![0.2, 0.8, 0.4, 0.1]);

            let first = cache.resample(&frame, 2, Aggregation::Peak);
            let second = cache.resample(&frame, 2, Aggregation::Peak);

            assert!(Arc::ptr_eq(&first, &second));
            assert_eq!(cache.recomputations(), 1);
        }

        #[test]
        fn separate_series_per_len_and_aggregation() {
            let mut cache = ResampleCache::new();
            let frame = SampleFrame::new(vec![0.2, 0.8, 0.4, 0.1]);

            cache.resample(&frame, 2, Aggregation::Peak);
            cache.resample(&frame, 2, Aggregation::Average);
            cache.resample(&frame, 3, Aggregation::Peak);
            cache.resample(&frame, 2, Aggregation::Average);

            assert_eq!(cache.recomputations(), 3);
            assert_eq!(cache.len(), 1);
        }

        #[test]
        fn equal_values_are_not_shared() {
            let mut cache = ResampleCache::new();
            let a = SampleFrame::new(vec![1., 2.]);
            let b = SampleFrame::new(vec![1., 2.]);

            cache.resample(&a, 1, Aggregation::Peak);
            cache.resample(&b, 1, Aggregation::Peak);

            assert_eq!(cache.recomputations(), 2);
        }

        #[test]
        fn does_not_keep_frames_alive() {
            let mut cache = ResampleCache::new();
            let frame = SampleFrame::new(vec![1.; 64]);
            let weak = frame.downgrade();

            cache.resample(&frame, 8, Aggregation::Peak);
            drop(frame);

            assert!(!weak.is_alive());

            cache.purge();
            assert!(cache.is_empty());
        }
    }
}
