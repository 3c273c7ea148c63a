//! Raster primitives the composition algorithm is written against.
//!
//! Two backends exist. [`CanvasBackend`] follows the 2D-canvas model used by
//! the browser preview: premultiplied float surfaces. [`BufferBackend`]
//! follows the server raster path: straight-alpha `u8` buffers. Both scale
//! through [`resample_rgba`] and [`resample_gray`], so a model output or mask
//! of a different size reaches the blend identically on either. The algorithm
//! in [`super::compose`] runs unchanged on both.

mod buffer;
mod canvas;

pub use buffer::BufferBackend;
pub use canvas::{CanvasBackend, CanvasSurface};

use super::feather::AlphaMap;
use image::imageops::{self, FilterType};
use image::{GrayImage, RgbaImage};

/// Filter shared by every resize in the compositing path.
const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// Stretches an image to `width` x `height`. Same-size input is copied as is.
pub fn resample_rgba(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, RESAMPLE_FILTER)
}

/// Single-channel counterpart of [`resample_rgba`].
pub fn resample_gray(alpha: &GrayImage, width: u32, height: u32) -> GrayImage {
    if alpha.dimensions() == (width, height) {
        return alpha.clone();
    }
    imageops::resize(alpha, width, height, RESAMPLE_FILTER)
}

/// Selects which [`RasterBackend`] runs the compositing passes.
#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Buffer,
    Canvas,
}

impl BackendKind {
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Buffer => BufferBackend::name(),
            BackendKind::Canvas => CanvasBackend::name(),
        }
    }
}

pub trait RasterBackend {
    type Surface;

    /// Short identifier used in logs and metrics.
    fn name() -> &'static str;

    /// Draws an image onto a new surface at its native resolution.
    fn load(image: &RgbaImage) -> Self::Surface;

    /// Draws an image onto a new surface of the given size, stretching it.
    fn load_resampled(image: &RgbaImage, width: u32, height: u32) -> Self::Surface {
        Self::load(&resample_rgba(image, width, height))
    }

    /// Resamples a single-channel mask to the given size.
    fn resample_alpha(alpha: &GrayImage, width: u32, height: u32) -> GrayImage {
        resample_gray(alpha, width, height)
    }

    /// A surface of solid `color` whose alpha is exactly `coverage`
    /// (a `source-in` fill over the mask shape).
    fn fill_through(color: [u8; 3], coverage: &AlphaMap) -> Self::Surface;

    /// Multiplies the surface's alpha by `coverage` (`destination-in`).
    fn destination_in(surface: &mut Self::Surface, coverage: &AlphaMap);

    /// Composites `src` over `dst` at the origin (`source-over`).
    fn source_over(dst: &mut Self::Surface, src: &Self::Surface);

    /// Flattens a surface to straight-alpha RGBA.
    fn export(surface: &Self::Surface) -> RgbaImage;
}
