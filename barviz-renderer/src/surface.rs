use crate::{layout::BarRect, BarColor};

/// Something the [crate::BarRenderer] can draw onto.
///
/// # Example
/// ```
/// use barviz_renderer::{BarColor, BarRect, DrawSurface};
///
/// /// Remembers every rectangle instead of drawing it.
/// struct Recorder {
///     rects: Vec<BarRect>,
/// }
///
/// impl DrawSurface for Recorder {
///     fn size(&self) -> (u32, u32) {
///         (200, 100)
///     }
///
///     fn clear(&mut self) {
///         self.rects.clear();
///     }
///
///     fn fill_rounded_rect(&mut self, rect: BarRect, _radius: f32, _color: &BarColor) {
///         self.rects.push(rect);
///     }
/// }
/// ```
pub trait DrawSurface {
    /// `(width, height)` in pixels.
    fn size(&self) -> (u32, u32);

    /// Makes the whole surface transparent.
    fn clear(&mut self);

    /// Fills `rect` with `color`. The corners are rounded with `radius` which the
    /// surface has to clamp to half of the smaller side of `rect`.
    fn fill_rounded_rect(&mut self, rect: BarRect, radius: f32, color: &BarColor);
}

/// The largest corner radius which still fits into `rect`.
pub fn clamp_radius(rect: &BarRect, radius: f32) -> f32 {
    radius.min(rect.width / 2.).min(rect.height / 2.).max(0.)
}

#[cfg(feature = "pixmap")]
pub use pixmap::{PixmapSurface, SurfaceError};

#[cfg(feature = "pixmap")]
mod pixmap {
    use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};

    use super::{clamp_radius, DrawSurface};
    use crate::{layout::BarRect, BarColor};

    #[derive(thiserror::Error, Debug)]
    pub enum SurfaceError {
        #[error("Can't create a surface of size {width}x{height}")]
        InvalidSize { width: u32, height: u32 },
    }

    /// A CPU backed surface.
    #[derive(Debug, Clone)]
    pub struct PixmapSurface {
        pixmap: Pixmap,
    }

    impl PixmapSurface {
        pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
            let pixmap =
                Pixmap::new(width, height).ok_or(SurfaceError::InvalidSize { width, height })?;

            Ok(Self { pixmap })
        }

        pub fn pixmap(&self) -> &Pixmap {
            &self.pixmap
        }

        /// Premultiplied `[r, g, b, a]` of the pixel at `(x, y)`.
        pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
            self.pixmap
                .pixel(x, y)
                .map(|pixel| [pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()])
        }

        /// Writes the surface as `0RGB` pixels into `buffer` at `(x, y)`, blended over
        /// what is already there. Pixels outside of `buffer` are skipped.
        pub fn blit_onto(&self, buffer: &mut [u32], buffer_width: u32, x: u32, y: u32) {
            if buffer_width == 0 {
                return;
            }
            let buffer_height = buffer.len() as u32 / buffer_width;

            for (row_idx, row) in self
                .pixmap
                .pixels()
                .chunks_exact(self.pixmap.width() as usize)
                .enumerate()
            {
                let dst_y = y + row_idx as u32;
                if dst_y >= buffer_height {
                    break;
                }

                for (col_idx, pixel) in row.iter().enumerate() {
                    let dst_x = x + col_idx as u32;
                    if dst_x >= buffer_width {
                        break;
                    }

                    let dst = &mut buffer[(dst_y * buffer_width + dst_x) as usize];
                    *dst = blend(
                        *dst,
                        [pixel.red(), pixel.green(), pixel.blue(), pixel.alpha()],
                    );
                }
            }
        }
    }

    // source over with a premultiplied source
    fn blend(dst: u32, src: [u8; 4]) -> u32 {
        let inv_alpha = 255 - src[3] as u32;
        let channel = |src: u8, shift: u32| {
            let dst = (dst >> shift) & 0xff;
            (src as u32 + dst * inv_alpha / 255).min(255)
        };

        (channel(src[0], 16) << 16) | (channel(src[1], 8) << 8) | channel(src[2], 0)
    }

    impl DrawSurface for PixmapSurface {
        fn size(&self) -> (u32, u32) {
            (self.pixmap.width(), self.pixmap.height())
        }

        fn clear(&mut self) {
            self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        }

        fn fill_rounded_rect(&mut self, rect: BarRect, radius: f32, color: &BarColor) {
            let Some(skia_rect) = Rect::from_xywh(rect.x, rect.y, rect.width, rect.height) else {
                return;
            };

            let path = rounded_rect(skia_rect, clamp_radius(&rect, radius));

            let [r, g, b, a] = color.rgba8();
            let mut paint = Paint::default();
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            self.pixmap.fill_path(
                &path,
                &paint,
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
    }

    fn rounded_rect(rect: Rect, radius: f32) -> Path {
        let mut pb = PathBuilder::new();

        let x = rect.x();
        let y = rect.y();
        let w = rect.width();
        let h = rect.height();

        pb.move_to(x + radius, y);
        pb.line_to(x + w - radius, y);
        pb.quad_to(x + w, y, x + w, y + radius);
        pb.line_to(x + w, y + h - radius);
        pb.quad_to(x + w, y + h, x + w - radius, y + h);
        pb.line_to(x + radius, y + h);
        pb.quad_to(x, y + h, x, y + h - radius);
        pb.line_to(x, y + radius);
        pb.quad_to(x, y, x + radius, y);
        pb.close();

        pb.finish().unwrap_or_else(|| PathBuilder::from_rect(rect))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn zero_size_is_an_error() {
            assert!(PixmapSurface::new(0, 10).is_err());
        }

        #[test]
        fn clear_makes_everything_transparent() {
            let mut surface = PixmapSurface::new(8, 8).unwrap();
            surface.fill_rounded_rect(
                BarRect {
                    x: 0.,
                    y: 0.,
                    width: 8.,
                    height: 8.,
                },
                0.,
                &BarColor::default(),
            );
            assert_eq!(surface.pixel(4, 4), Some([255, 0, 0, 255]));

            surface.clear();
            assert_eq!(surface.pixel(4, 4), Some([0, 0, 0, 0]));
        }

        #[test]
        fn blend_over_black() {
            assert_eq!(blend(0, [255, 128, 0, 255]), 0x00ff8000);
            assert_eq!(blend(0x00ffffff, [0, 0, 0, 0]), 0x00ffffff);
        }

        #[test]
        fn blit_clips_at_the_buffer_edge() {
            let mut surface = PixmapSurface::new(4, 4).unwrap();
            surface.fill_rounded_rect(
                BarRect {
                    x: 0.,
                    y: 0.,
                    width: 4.,
                    height: 4.,
                },
                0.,
                &BarColor::parse("blue").unwrap(),
            );

            let mut buffer = vec![0u32; 3 * 3];
            surface.blit_onto(&mut buffer, 3, 1, 1);

            assert_eq!(buffer[0], 0);
            assert_eq!(buffer[4], 0x000000ff);
            assert_eq!(buffer[8], 0x000000ff);
        }
    }
}
