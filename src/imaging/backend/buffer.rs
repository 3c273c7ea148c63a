use super::RasterBackend;
use crate::imaging::feather::AlphaMap;
use image::{Rgba, RgbaImage};

/// Straight-alpha `u8` buffers, blended with integer arithmetic.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferBackend;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

impl RasterBackend for BufferBackend {
    type Surface = RgbaImage;

    fn name() -> &'static str {
        "buffer"
    }

    fn load(image: &RgbaImage) -> RgbaImage {
        image.clone()
    }

    fn fill_through(color: [u8; 3], coverage: &AlphaMap) -> RgbaImage {
        let (width, height) = coverage.dimensions();
        RgbaImage::from_fn(width, height, |x, y| match coverage.to_u8(x, y) {
            0 => TRANSPARENT,
            a => Rgba([color[0], color[1], color[2], a]),
        })
    }

    fn destination_in(surface: &mut RgbaImage, coverage: &AlphaMap) {
        for (x, y, pixel) in surface.enumerate_pixels_mut() {
            let alpha = coverage.scale_u8(x, y, pixel[3]);
            *pixel = if alpha == 0 {
                TRANSPARENT
            } else {
                Rgba([pixel[0], pixel[1], pixel[2], alpha])
            };
        }
    }

    fn source_over(dst: &mut RgbaImage, src: &RgbaImage) {
        for (d, s) in dst.pixels_mut().zip(src.pixels()) {
            *d = blend_over(*d, *s);
        }
    }

    fn export(surface: &RgbaImage) -> RgbaImage {
        surface.clone()
    }
}

/// Straight-alpha Porter-Duff "over", rounded to nearest.
fn blend_over(dst: Rgba<u8>, src: Rgba<u8>) -> Rgba<u8> {
    let sa = src[3] as u32;
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }
    let da = dst[3] as u32;

    // Both terms are scaled by 255 * 255.
    let out_alpha = sa * 255 + da * (255 - sa);
    if out_alpha == 0 {
        return TRANSPARENT;
    }

    let channel = |i: usize| -> u8 {
        let num = src[i] as u32 * sa * 255 + dst[i] as u32 * da * (255 - sa);
        ((num + out_alpha / 2) / out_alpha) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        ((out_alpha + 127) / 255) as u8,
    ])
}
