//! Where each bar goes and how tall it is.

/// Magnitudes are scaled by this factor before they're turned into a bar height.
pub const AMPLITUDE_SCALE: f32 = 0.0125;

/// Bars are never smaller than this (in pixels).
pub const MIN_BAR_HEIGHT: f32 = 1.;

/// Returns how many bars fit into a surface which is `surface_width` pixels wide.
///
/// A bar is at least one pixel wide. Returns `0` if not even a single bar fits.
pub fn point_count(surface_width: f32, bar_width: f32, bar_spacing: f32) -> usize {
    let count = ((surface_width - bar_spacing) / (bar_width.max(1.) + bar_spacing)).floor();

    if count.is_finite() && count > 0. {
        count as usize
    } else {
        0
    }
}

/// Maps a (resampled) magnitude to the height of its bar.
///
/// Small magnitudes result in tall bars: the frames carry decibel values, so
/// `-10 dB` is louder than `-70 dB`.
pub fn bar_height(value: f32, surface_height: f32) -> f32 {
    let amplitude = 1. - (value * AMPLITUDE_SCALE).abs();
    (amplitude * surface_height).max(MIN_BAR_HEIGHT)
}

/// An axis aligned rectangle in surface coordinates (origin at the top left).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// The horizontal arrangement of the bars: evenly spaced and centered as a block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarLayout {
    start_x: f32,
    bar_width: f32,
    bar_spacing: f32,
    surface_height: f32,
    center: bool,
}

impl BarLayout {
    pub fn new(
        surface: (f32, f32),
        bar_width: f32,
        bar_spacing: f32,
        point_count: usize,
        center: bool,
    ) -> Self {
        let (surface_width, surface_height) = surface;

        let total_bars_width = point_count as f32 * bar_width;
        let total_spacing_width = point_count.saturating_sub(1) as f32 * bar_spacing;
        let total_width = total_bars_width + total_spacing_width;

        Self {
            start_x: (surface_width - total_width) / 2.,
            bar_width,
            bar_spacing,
            surface_height,
            center,
        }
    }

    /// The x coordinate of the left edge of the first bar.
    pub fn start_x(&self) -> f32 {
        self.start_x
    }

    /// The rectangle of the `idx`-th bar for the given magnitude.
    pub fn bar(&self, idx: usize, value: f32) -> BarRect {
        let height = bar_height(value, self.surface_height);
        let x = self.start_x + idx as f32 * (self.bar_width + self.bar_spacing);
        let y = if self.center {
            (self.surface_height - height) / 2.
        } else {
            self.surface_height - height
        };

        BarRect {
            x,
            y,
            width: self.bar_width,
            height,
        }
    }
}
