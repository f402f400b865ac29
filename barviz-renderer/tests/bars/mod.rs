use barviz_audio::SampleFrame;
use barviz_renderer::{
    BarColor, BarRect, BarRenderer, DrawOutcome, DrawSurface, PixmapSurface, RenderConfig,
    SkipReason,
};

use crate::Tester;

// 24 bars with the default config, the block starts at x = 6
const FIRST_BAR_X: u32 = 6;

#[test]
fn draws_centered_bars() {
    let mut tester = Tester::default();
    let frame = SampleFrame::new(vec![-40.; 128]);

    assert_eq!(tester.draw(Some(&frame)), DrawOutcome::Drawn { bars: 24 });

    // bars are 50px high and span y = 25..75
    assert_eq!(tester.surface.pixel(FIRST_BAR_X + 1, 50), Some([255, 0, 0, 255]));
    assert!(tester.is_transparent(FIRST_BAR_X + 1, 10));
    assert!(tester.is_transparent(FIRST_BAR_X + 1, 90));

    // left margin and the gap between the first two bars
    assert!(tester.is_transparent(2, 50));
    assert!(tester.is_transparent(FIRST_BAR_X + 5, 50));
}

#[test]
fn bars_sit_at_the_bottom_without_center() {
    let mut tester = Tester::new(RenderConfig {
        center: false,
        ..Default::default()
    });
    let frame = SampleFrame::new(vec![-40.; 128]);

    tester.draw(Some(&frame));

    assert!(!tester.is_transparent(FIRST_BAR_X + 1, 90));
    assert!(tester.is_transparent(FIRST_BAR_X + 1, 30));
}

#[test]
fn uses_the_configured_color() {
    let mut tester = Tester::new(RenderConfig {
        color: BarColor::parse("#0000ff").unwrap(),
        ..Default::default()
    });
    let frame = SampleFrame::new(vec![-10.; 128]);

    tester.draw(Some(&frame));

    assert_eq!(tester.surface.pixel(FIRST_BAR_X + 1, 50), Some([0, 0, 255, 255]));
}

#[test]
fn empty_frame_only_clears() {
    let mut tester = Tester::default();
    tester.draw(Some(&SampleFrame::new(vec![-10.; 128])));
    assert!(!tester.is_transparent(FIRST_BAR_X + 1, 50));

    let outcome = tester.draw(Some(&SampleFrame::new(Vec::new())));

    assert_eq!(outcome, DrawOutcome::Skipped(SkipReason::NoData));
    assert!(tester.is_transparent(FIRST_BAR_X + 1, 50));
}

#[test]
fn no_frame_draws_nothing() {
    let mut tester = Tester::default();

    assert_eq!(tester.draw(None), DrawOutcome::Skipped(SkipReason::NoData));
    assert!(tester.surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn too_narrow_for_a_single_bar() {
    let mut tester = Tester::new(RenderConfig {
        width: 7,
        ..Default::default()
    });

    let outcome = tester.draw(Some(&SampleFrame::new(vec![-10.; 128])));

    assert_eq!(outcome, DrawOutcome::Skipped(SkipReason::NoRoom));
    assert!(tester.surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
}

#[test]
fn resampled_values_are_reused_per_frame() {
    let mut tester = Tester::default();
    let frame = SampleFrame::new(vec![-30.; 128]);

    tester.draw(Some(&frame));
    tester.draw(Some(&frame));
    assert_eq!(tester.renderer.recomputations(), 1);

    let next = SampleFrame::new(vec![-30.; 128]);
    tester.draw(Some(&next));
    assert_eq!(tester.renderer.recomputations(), 2);
}

#[test]
fn point_count_follows_the_surface() {
    let renderer = BarRenderer::new(RenderConfig::default());
    let wide = PixmapSurface::new(1200, 100).unwrap();

    assert_eq!(renderer.point_count(&wide), 149);
}

/// Remembers the rectangles instead of rasterizing them.
#[derive(Default)]
struct Recorder {
    rects: Vec<BarRect>,
    radii: Vec<f32>,
    clears: usize,
}

impl DrawSurface for Recorder {
    fn size(&self) -> (u32, u32) {
        (200, 100)
    }

    fn clear(&mut self) {
        self.clears += 1;
        self.rects.clear();
        self.radii.clear();
    }

    fn fill_rounded_rect(&mut self, rect: BarRect, radius: f32, _color: &BarColor) {
        self.rects.push(rect);
        self.radii.push(radius);
    }
}

#[test]
fn peaks_decide_the_bar_heights() {
    let mut recorder = Recorder::default();
    let mut renderer = BarRenderer::new(RenderConfig {
        bar_width: 35.,
        ..Default::default()
    });

    // 200px fit 5 bars of 35px, each bar covers two values
    let frame = SampleFrame::new(vec![-80., -40., -80., -80., -80., -80., -80., -80., 0., -80.]);
    assert_eq!(renderer.draw(&mut recorder, Some(&frame)), DrawOutcome::Drawn { bars: 5 });

    assert_eq!(recorder.clears, 1);
    assert_eq!(recorder.rects.len(), 5);
    // peak keeps the largest magnitude of each pair
    assert_eq!(recorder.rects[0].height, 1.);
    assert_eq!(recorder.rects[4].height, 1.);
    assert!(recorder.radii.iter().all(|&radius| radius == 20.));

    let start_x = (200. - (5. * 35. + 4. * 4.)) / 2.;
    assert_eq!(recorder.rects[0].x, start_x);
    assert_eq!(recorder.rects[1].x, start_x + 39.);
}
