use std::sync::Arc;

use realfft::{num_complex::Complex32, RealFftPlanner, RealToComplex};

use crate::SampleFrame;

/// Configuration of an [Analyser].
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyserConfig {
    /// The amount of samples of each fft. Each frame has `fft_size / 2` values.
    pub fft_size: usize,

    /// How much of the previous magnitudes is kept for the next frame.
    /// `0` means no smoothing at all, values close to `1` smooth a lot.
    pub smoothing_time_constant: f32,

    /// The value (in dB) which is reported for silent frequency bins.
    pub min_decibels: f32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: 256,
            smoothing_time_constant: 0.8,
            min_decibels: -100.,
        }
    }
}

impl AnalyserConfig {
    /// Amount of values of each frame of the analyser.
    pub fn frame_len(&self) -> usize {
        self.fft_size / 2
    }
}

/// Turns the latest samples into the frequency magnitudes (in dB) of a [SampleFrame].
///
/// Behaves like the float frequency output of a WebAudio `AnalyserNode`:
/// blackman window, fft, magnitudes smoothed over time, converted into decibels.
pub struct Analyser {
    config: AnalyserConfig,

    fft: Arc<dyn RealToComplex<f32>>,
    window: Box<[f32]>,

    fft_in: Box<[f32]>,
    fft_out: Box<[Complex32]>,
    scratch_buffer: Box<[Complex32]>,

    // smoothed magnitudes of the previous frame
    smoothed: Box<[f32]>,
}

impl Analyser {
    /// # Panics
    /// If `config.fft_size` is smaller than `2`.
    pub fn new(config: AnalyserConfig) -> Self {
        assert!(
            config.fft_size >= 2,
            "The fft size must be at least 2 (got {})",
            config.fft_size
        );

        let fft = RealFftPlanner::<f32>::new().plan_fft_forward(config.fft_size);

        let window = apodize::blackman_iter(config.fft_size)
            .map(|val| val as f32)
            .collect::<Vec<f32>>()
            .into_boxed_slice();

        let fft_in = fft.make_input_vec().into_boxed_slice();
        let fft_out = fft.make_output_vec().into_boxed_slice();
        let scratch_buffer = fft.make_scratch_vec().into_boxed_slice();
        let smoothed = vec![0f32; config.frame_len()].into_boxed_slice();

        Self {
            config,
            fft,
            window,
            fft_in,
            fft_out,
            scratch_buffer,
            smoothed,
        }
    }

    /// Analyses the given samples and returns a fresh frame.
    ///
    /// Only the latest `fft_size` samples are used. If there are fewer, the missing
    /// (oldest) samples are treated as silence.
    pub fn analyse(&mut self, samples: &[f32]) -> SampleFrame {
        let fft_size = self.config.fft_size;
        let samples = &samples[samples.len().saturating_sub(fft_size)..];
        let offset = fft_size - samples.len();

        self.fft_in[..offset].fill(0.);
        for (idx, sample) in samples.iter().enumerate() {
            self.fft_in[offset + idx] = sample * self.window[offset + idx];
        }

        if let Err(err) = self.fft.process_with_scratch(
            &mut self.fft_in,
            &mut self.fft_out,
            &mut self.scratch_buffer,
        ) {
            // only happens if the buffer lengths don't fit which we control
            tracing::error!("FFT failed: {}", err);
            return SampleFrame::new(vec![self.config.min_decibels; self.config.frame_len()]);
        }

        let tau = self.config.smoothing_time_constant;
        let min_decibels = self.config.min_decibels;
        let scale = 1. / fft_size as f32;

        let values: Vec<f32> = self
            .smoothed
            .iter_mut()
            .zip(self.fft_out.iter())
            .map(|(smoothed, bin)| {
                let magnitude = bin.norm() * scale;
                *smoothed = tau * *smoothed + (1. - tau) * magnitude;

                if *smoothed > 0. {
                    (20. * smoothed.log10()).max(min_decibels)
                } else {
                    min_decibels
                }
            })
            .collect();

        SampleFrame::new(values)
    }

    pub fn config(&self) -> &AnalyserConfig {
        &self.config
    }

    /// Forgets the smoothing history.
    pub fn reset(&mut self) {
        self.smoothed.fill(0.);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FFT_SIZE: usize = 256;

    fn sine(bin: usize, len: usize) -> Vec<f32> {
        (0..len)
            .map(|n| (2. * std::f32::consts::PI * bin as f32 * n as f32 / FFT_SIZE as f32).sin())
            .collect()
    }

    #[test]
    fn frame_len_is_half_the_fft_size() {
        let mut analyser = Analyser::new(AnalyserConfig::default());
        let frame = analyser.analyse(&[0.; FFT_SIZE]);

        assert_eq!(frame.len(), FFT_SIZE / 2);
    }

    #[test]
    fn silence_reports_min_decibels() {
        let config = AnalyserConfig::default();
        let min_decibels = config.min_decibels;
        let mut analyser = Analyser::new(config);

        let frame = analyser.analyse(&[0.; FFT_SIZE]);
        assert!(frame.iter().all(|&value| value == min_decibels));
    }

    #[test]
    fn sine_peaks_at_its_bin() {
        let mut analyser = Analyser::new(AnalyserConfig {
            smoothing_time_constant: 0.,
            ..Default::default()
        });

        let frame = analyser.analyse(&sine(16, FFT_SIZE));
        let (peak_bin, _) = frame
            .iter()
            .enumerate()
            .fold((0, f32::MIN), |(best_idx, best), (idx, &value)| {
                if value > best {
                    (idx, value)
                } else {
                    (best_idx, best)
                }
            });

        assert_eq!(peak_bin, 16);
    }

    #[test]
    fn uses_only_the_latest_samples() {
        let mut analyser = Analyser::new(AnalyserConfig {
            smoothing_time_constant: 0.,
            ..Default::default()
        });

        let mut samples = sine(40, FFT_SIZE);
        samples.extend(std::iter::repeat(0.).take(FFT_SIZE));

        let frame = analyser.analyse(&samples);
        assert!(frame.iter().all(|&value| value == -100.));
    }

    #[test]
    fn smoothing_keeps_previous_energy() {
        let mut analyser = Analyser::new(AnalyserConfig::default());

        analyser.analyse(&sine(16, FFT_SIZE));
        let frame = analyser.analyse(&[0.; FFT_SIZE]);

        assert!(frame[16] > -100.);

        analyser.reset();
        let frame = analyser.analyse(&[0.; FFT_SIZE]);
        assert_eq!(frame[16], -100.);
    }

    #[test]
    fn every_frame_is_a_new_frame() {
        let mut analyser = Analyser::new(AnalyserConfig::default());

        let first = analyser.analyse(&[0.; FFT_SIZE]);
        let second = analyser.analyse(&[0.; FFT_SIZE]);

        assert_ne!(first.id(), second.id());
    }
}
