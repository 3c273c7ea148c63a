use super::RasterBackend;
use crate::imaging::feather::AlphaMap;
use image::{Rgba, RgbaImage};

/// Premultiplied RGBA float surface, the way a 2D canvas holds its backing store.
#[derive(Debug, Clone)]
pub struct CanvasSurface {
    width: u32,
    height: u32,
    data: Vec<[f32; 4]>,
}

impl CanvasSurface {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![[0.0; 4]; width as usize * height as usize],
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }
}

fn premultiply(p: &Rgba<u8>) -> [f32; 4] {
    let a = p[3] as f32 / 255.0;
    [
        p[0] as f32 / 255.0 * a,
        p[1] as f32 / 255.0 * a,
        p[2] as f32 / 255.0 * a,
        a,
    ]
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

/// Software emulation of the 2D-canvas compositing path.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanvasBackend;

impl RasterBackend for CanvasBackend {
    type Surface = CanvasSurface;

    fn name() -> &'static str {
        "canvas"
    }

    fn load(image: &RgbaImage) -> CanvasSurface {
        CanvasSurface {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(premultiply).collect(),
        }
    }

    fn fill_through(color: [u8; 3], coverage: &AlphaMap) -> CanvasSurface {
        let (width, height) = coverage.dimensions();
        let mut surface = CanvasSurface::new(width, height);
        let rgb = color.map(|c| c as f32 / 255.0);
        for y in 0..height {
            for x in 0..width {
                let a = coverage.coverage(x, y);
                let idx = surface.index(x, y);
                surface.data[idx] = [rgb[0] * a, rgb[1] * a, rgb[2] * a, a];
            }
        }
        surface
    }

    fn destination_in(surface: &mut CanvasSurface, coverage: &AlphaMap) {
        for y in 0..surface.height {
            for x in 0..surface.width {
                let a = coverage.coverage(x, y);
                let idx = surface.index(x, y);
                for channel in surface.data[idx].iter_mut() {
                    *channel *= a;
                }
            }
        }
    }

    fn source_over(dst: &mut CanvasSurface, src: &CanvasSurface) {
        for (d, s) in dst.data.iter_mut().zip(src.data.iter()) {
            let keep = 1.0 - s[3];
            for i in 0..4 {
                d[i] = s[i] + d[i] * keep;
            }
        }
    }

    fn export(surface: &CanvasSurface) -> RgbaImage {
        RgbaImage::from_fn(surface.width, surface.height, |x, y| {
            let [r, g, b, a] = surface.data[surface.index(x, y)];
            let alpha = to_u8(a);
            if alpha == 0 {
                return Rgba([0, 0, 0, 0]);
            }
            Rgba([to_u8(r / a), to_u8(g / a), to_u8(b / a), alpha])
        })
    }
}
