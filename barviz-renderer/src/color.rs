use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
#[error("Invalid color '{input}': {source}")]
pub struct ColorError {
    input: String,
    #[source]
    source: csscolorparser::ParseColorError,
}

/// The fill color of the bars.
///
/// Accepts every CSS color (`"red"`, `"#ff8800"`, `"rgb(0 128 255)"`, ...). The
/// original text is kept so that it can be handed to a canvas unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BarColor {
    css: String,
    rgba: [u8; 4],
}

impl BarColor {
    pub fn parse(css: impl Into<String>) -> Result<Self, ColorError> {
        let css = css.into();

        match csscolorparser::parse(&css) {
            Ok(color) => Ok(Self {
                rgba: color.to_rgba8(),
                css,
            }),
            Err(source) => Err(ColorError { input: css, source }),
        }
    }

    /// The color like it was written in the config.
    pub fn css(&self) -> &str {
        &self.css
    }

    /// Non-premultiplied `[r, g, b, a]`.
    pub fn rgba8(&self) -> [u8; 4] {
        self.rgba
    }
}

impl Default for BarColor {
    fn default() -> Self {
        Self {
            css: "red".into(),
            rgba: [255, 0, 0, 255],
        }
    }
}

impl TryFrom<String> for BarColor {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<BarColor> for String {
    fn from(color: BarColor) -> Self {
        color.css
    }
}
