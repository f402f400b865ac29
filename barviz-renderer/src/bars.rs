use barviz_audio::{Aggregation, ResampleCache, SampleFrame};
use tracing::trace;

use crate::{
    layout::{point_count, BarLayout},
    DrawSurface, RenderConfig,
};

/// Corner radius of each bar. Gets clamped by the surface if the bar is too small.
pub const CORNER_RADIUS: f32 = 20.;

/// Why nothing got drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// There's no frame or the frame is empty.
    NoData,
    /// The surface is too narrow for a single bar.
    NoRoom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    Drawn { bars: usize },
    Skipped(SkipReason),
}

/// Draws frames as a bar chart.
///
/// # Example
/// ```
/// use barviz_audio::SampleFrame;
/// use barviz_renderer::{BarRenderer, DrawOutcome, PixmapSurface, RenderConfig};
///
/// let config = RenderConfig::default();
/// let mut surface = PixmapSurface::new(config.width, config.height).unwrap();
/// let mut renderer = BarRenderer::new(config);
///
/// let frame = SampleFrame::new(vec![-30.; 128]);
/// assert_eq!(renderer.draw(&mut surface, Some(&frame)), DrawOutcome::Drawn { bars: 24 });
/// ```
#[derive(Debug)]
pub struct BarRenderer {
    config: RenderConfig,
    cache: ResampleCache,
}

impl BarRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            config,
            cache: ResampleCache::new(),
        }
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Replaces the config. Takes effect with the next draw.
    pub fn set_config(&mut self, config: RenderConfig) {
        self.config = config;
    }

    /// How many bars fit onto `surface`.
    pub fn point_count<S: DrawSurface + ?Sized>(&self, surface: &S) -> usize {
        let (width, _) = surface.size();
        point_count(width as f32, self.config.bar_width, self.config.bar_spacing)
    }

    /// Clears `surface` and draws `frame` onto it.
    pub fn draw<S: DrawSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        frame: Option<&SampleFrame>,
    ) -> DrawOutcome {
        surface.clear();

        let Some(frame) = frame.filter(|frame| !frame.is_empty()) else {
            return DrawOutcome::Skipped(SkipReason::NoData);
        };

        let point_count = self.point_count(surface);
        if point_count == 0 {
            trace!("Surface too small for a single bar");
            return DrawOutcome::Skipped(SkipReason::NoRoom);
        }

        let points = self.cache.resample(frame, point_count, Aggregation::Peak);

        let (width, height) = surface.size();
        let layout = BarLayout::new(
            (width as f32, height as f32),
            self.config.bar_width,
            self.config.bar_spacing,
            point_count,
            self.config.center,
        );

        for (idx, &value) in points.iter().enumerate() {
            surface.fill_rounded_rect(layout.bar(idx, value), CORNER_RADIUS, &self.config.color);
        }

        DrawOutcome::Drawn { bars: point_count }
    }

    /// How often the bars had to be resampled instead of being taken from the cache.
    pub fn recomputations(&self) -> usize {
        self.cache.recomputations()
    }
}
