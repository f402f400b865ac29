use serde::{Deserialize, Serialize};

use crate::BarColor;

/// Everything which decides how a [crate::BarRenderer] draws its bars.
///
/// Every field is optional in config files. The defaults are:
///
/// | field         | default |
/// |---------------|---------|
/// | `width`       | `200`   |
/// | `height`      | `100`   |
/// | `bar_width`   | `4`     |
/// | `bar_spacing` | `4`     |
/// | `center`      | `true`  |
/// | `color`       | `"red"` |
/// | `demo_mode`   | `false` |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Width of the drawing surface in pixels.
    pub width: u32,
    /// Height of the drawing surface in pixels.
    pub height: u32,
    pub bar_width: f32,
    /// Horizontal gap between two bars.
    pub bar_spacing: f32,
    pub color: BarColor,
    /// Center the bars vertically instead of anchoring them at the bottom.
    pub center: bool,
    /// Draw random frames instead of listening to the microphone.
    pub demo_mode: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 100,
            bar_width: 4.,
            bar_spacing: 4.,
            color: BarColor::default(),
            center: true,
            demo_mode: false,
        }
    }
}
