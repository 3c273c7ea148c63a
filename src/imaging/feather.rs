//! Mask feathering.
//!
//! The feather is a separable Gaussian with integer weights, so coverage is an
//! exact rational: exactly zero where no selected pixel lies within the radius,
//! exactly one where the whole window is fully selected. Both raster backends
//! consume the same [`AlphaMap`], which keeps their blends in agreement.

use image::GrayImage;

/// Kernel half-width, in pixels, of the seam-eliminating feather applied to the
/// mask before the final blend.
pub const FEATHER_RADIUS: u32 = 12;

/// Standard deviation, in pixels, of the slight softening applied to the
/// chroma-key layer.
pub const EDGE_SOFTEN_SIGMA: f64 = 1.0;

/// Kernel half-width for [`EDGE_SOFTEN_SIGMA`], truncated at three sigma.
pub const EDGE_SOFTEN_RADIUS: u32 = 3;

/// Fixed-point scale of the kernel weights.
const WEIGHT_SCALE: f64 = 1024.0;

/// Integer Gaussian weights for offsets `0..=radius`.
///
/// Every weight is at least 1, so the kernel support is exactly `radius`.
pub fn gaussian_weights(radius: u32, sigma: f64) -> Vec<u64> {
    if radius == 0 || sigma <= 0.0 {
        return vec![1];
    }
    (0..=radius)
        .map(|offset| {
            let d = offset as f64;
            let w = (WEIGHT_SCALE * (-(d * d) / (2.0 * sigma * sigma)).exp()).round();
            (w as u64).max(1)
        })
        .collect()
}

/// Per-pixel coverage in [0, 1], stored as `numerator / denominator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlphaMap {
    width: u32,
    height: u32,
    numerators: Vec<u64>,
    denominator: u64,
}

impl AlphaMap {
    /// Coverage taken verbatim from a mask, without any blur.
    pub fn exact(alpha: &GrayImage) -> Self {
        Self {
            width: alpha.width(),
            height: alpha.height(),
            numerators: alpha.as_raw().iter().map(|&a| a as u64).collect(),
            denominator: 255,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn is_zero(&self, x: u32, y: u32) -> bool {
        self.numerators[self.index(x, y)] == 0
    }

    pub fn is_saturated(&self, x: u32, y: u32) -> bool {
        self.numerators[self.index(x, y)] == self.denominator
    }

    /// Coverage as a float; `0.0` and `1.0` are returned exactly at the extremes.
    pub fn coverage(&self, x: u32, y: u32) -> f32 {
        let numerator = self.numerators[self.index(x, y)];
        if numerator == 0 {
            0.0
        } else if numerator == self.denominator {
            1.0
        } else {
            (numerator as f64 / self.denominator as f64) as f32
        }
    }

    /// Coverage scaled to `0..=255`, rounded to nearest.
    pub fn to_u8(&self, x: u32, y: u32) -> u8 {
        let numerator = self.numerators[self.index(x, y)];
        ((numerator * 255 + self.denominator / 2) / self.denominator) as u8
    }

    /// `value * coverage`, rounded to nearest, in integer arithmetic.
    pub fn scale_u8(&self, x: u32, y: u32, value: u8) -> u8 {
        let numerator = self.numerators[self.index(x, y)] as u128;
        let denominator = self.denominator as u128;
        ((value as u128 * numerator + denominator / 2) / denominator) as u8
    }

    /// Number of pixels with nonzero coverage.
    pub fn support_len(&self) -> usize {
        self.numerators.iter().filter(|&&n| n > 0).count()
    }
}

/// Blurs a mask's alpha with a Gaussian of the given kernel radius and
/// sigma = radius / 3.
///
/// Borders replicate the edge pixel, so a selection touching the frame stays
/// saturated up to the edge.
pub fn feather(alpha: &GrayImage, radius: u32) -> AlphaMap {
    feather_with_sigma(alpha, radius, radius as f64 / 3.0)
}

/// [`feather`] with an explicit sigma, truncated at `radius`.
pub fn feather_with_sigma(alpha: &GrayImage, radius: u32, sigma: f64) -> AlphaMap {
    if radius == 0 || sigma <= 0.0 {
        return AlphaMap::exact(alpha);
    }

    let (width, height) = alpha.dimensions();
    let weights = gaussian_weights(radius, sigma);
    let weight_sum: u64 = weights[0] + 2 * weights[1..].iter().sum::<u64>();
    let r = radius as i64;

    let clamp = |v: i64, len: u32| -> usize { v.clamp(0, len as i64 - 1) as usize };

    let source = alpha.as_raw();
    let w = width as usize;

    let mut horizontal = vec![0u64; source.len()];
    for y in 0..height as usize {
        let row = &source[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0u64;
            for k in -r..=r {
                let sample = row[clamp(x as i64 + k, width)] as u64;
                acc += sample * weights[k.unsigned_abs() as usize];
            }
            horizontal[y * w + x] = acc;
        }
    }

    let mut numerators = vec![0u64; source.len()];
    for y in 0..height as usize {
        for x in 0..w {
            let mut acc = 0u64;
            for k in -r..=r {
                let sy = clamp(y as i64 + k, height);
                acc += horizontal[sy * w + x] * weights[k.unsigned_abs() as usize];
            }
            numerators[y * w + x] = acc;
        }
    }

    AlphaMap {
        width,
        height,
        numerators,
        denominator: 255 * weight_sum * weight_sum,
    }
}
