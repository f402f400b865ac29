use barviz_renderer::{clamp_radius, BarColor, BarRect, DrawSurface};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

/// Draws onto the 2d context of a `<canvas>`.
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    context: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or("Canvas has no 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "Unexpected rendering context")?;

        Ok(Self { canvas, context })
    }

    /// Sets the size of the drawing buffer of the canvas.
    pub fn resize(&self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

impl DrawSurface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn clear(&mut self) {
        let (width, height) = self.size();
        self.context
            .clear_rect(0., 0., width as f64, height as f64);
    }

    fn fill_rounded_rect(&mut self, rect: BarRect, radius: f32, color: &BarColor) {
        let radius = clamp_radius(&rect, radius);

        self.context.set_fill_style_str(color.css());
        self.context.begin_path();
        if let Err(err) = self.context.round_rect_with_f64(
            rect.x as f64,
            rect.y as f64,
            rect.width as f64,
            rect.height as f64,
            radius as f64,
        ) {
            log::warn!("Couldn't add a rounded rectangle: {:?}", err);
            return;
        }
        self.context.fill();
    }
}
