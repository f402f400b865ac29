//! Draws frames of [barviz_audio] as bar charts onto a [DrawSurface].
//!
//! With the `pixmap` feature (enabled by default) [PixmapSurface] provides a CPU
//! backed surface. Other hosts (for example a browser canvas) implement
//! [DrawSurface] themselves.
mod bars;
mod color;
mod config;
pub mod layout;
mod surface;

pub use bars::{BarRenderer, DrawOutcome, SkipReason, CORNER_RADIUS};
pub use color::{BarColor, ColorError};
pub use config::RenderConfig;
pub use layout::{BarLayout, BarRect};
pub use surface::{clamp_radius, DrawSurface};

#[cfg(feature = "pixmap")]
pub use surface::{PixmapSurface, SurfaceError};
