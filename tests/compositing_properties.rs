//! Property-based tests for the compositing passes.
//!
//! Uses proptest to check the blend invariants on both raster backends over
//! arbitrary photos, model outputs and masks. Model outputs and masks may come
//! at a different size than the photo and get stretched onto it.

use hairline_server::imaging::{
    chroma_layer, composite_final, feather, feathered_coverage, resample_rgba, BufferBackend,
    CanvasBackend, Mask, Photo, RasterBackend, MARKER_COLOR,
};
use image::{GrayImage, Luma, Rgba, RgbaImage};
use proptest::prelude::*;

const MAX_SIDE: u32 = 40;

#[derive(Debug, Clone)]
struct Scene {
    photo: RgbaImage,
    ai: RgbaImage,
    mask: GrayImage,
}

fn opaque_image(width: u32, height: u32) -> impl Strategy<Value = RgbaImage> {
    prop::collection::vec(any::<[u8; 3]>(), (width * height) as usize).prop_map(move |pixels| {
        RgbaImage::from_fn(width, height, |x, y| {
            let [r, g, b] = pixels[(y * width + x) as usize];
            Rgba([r, g, b, 255])
        })
    })
}

/// A soft-edged rectangle on a clear background, or fully random alpha.
fn mask_image(width: u32, height: u32) -> impl Strategy<Value = GrayImage> {
    let rect = (0..width, 0..height, 1..=width, 1..=height, 1u8..=255).prop_map(
        move |(x0, y0, w, h, level)| {
            GrayImage::from_fn(width, height, |x, y| {
                if x >= x0 && x < x0 + w && y >= y0 && y < y0 + h {
                    Luma([level])
                } else {
                    Luma([0])
                }
            })
        },
    );
    let noise = prop::collection::vec(any::<u8>(), (width * height) as usize).prop_map(
        move |values| GrayImage::from_fn(width, height, |x, y| Luma([values[(y * width + x) as usize]])),
    );
    prop_oneof![3 => rect, 1 => noise]
}

/// Either the photo's own size or an unrelated one.
fn layer_size(width: u32, height: u32) -> impl Strategy<Value = (u32, u32)> {
    prop_oneof![
        2 => Just((width, height)),
        1 => (2..=MAX_SIDE * 2, 2..=MAX_SIDE * 2),
    ]
}

fn scene() -> impl Strategy<Value = Scene> {
    (4..=MAX_SIDE, 4..=MAX_SIDE)
        .prop_flat_map(|(width, height)| {
            (Just((width, height)), layer_size(width, height), layer_size(width, height))
        })
        .prop_flat_map(|((width, height), (ai_w, ai_h), (mask_w, mask_h))| {
            (
                opaque_image(width, height),
                opaque_image(ai_w, ai_h),
                mask_image(mask_w, mask_h),
            )
                .prop_map(|(photo, ai, mask)| Scene { photo, ai, mask })
        })
}

fn composite<B: RasterBackend>(scene: &Scene) -> RgbaImage {
    composite_final::<B>(
        &Photo::from_rgba(scene.photo.clone()),
        &scene.ai,
        &Mask::from_alpha(scene.mask.clone()),
    )
}

fn check_blend_bounds<B: RasterBackend>(scene: &Scene) -> Result<(), TestCaseError> {
    let result = composite::<B>(scene);
    let (width, height) = scene.photo.dimensions();
    prop_assert_eq!(result.dimensions(), (width, height));

    let coverage = feathered_coverage::<B>(&Mask::from_alpha(scene.mask.clone()), width, height);
    let stretched = resample_rgba(&scene.ai, width, height);
    for (x, y, pixel) in result.enumerate_pixels() {
        let photo = scene.photo.get_pixel(x, y);
        let ai = stretched.get_pixel(x, y);
        prop_assert_eq!(pixel[3], 255, "{} output not opaque at ({}, {})", B::name(), x, y);

        if coverage.is_zero(x, y) {
            prop_assert_eq!(pixel, photo, "{} changed unmasked pixel ({}, {})", B::name(), x, y);
        } else if coverage.is_saturated(x, y) {
            prop_assert_eq!(pixel, ai, "{} diluted saturated pixel ({}, {})", B::name(), x, y);
        } else {
            for c in 0..3 {
                let lo = photo[c].min(ai[c]);
                let hi = photo[c].max(ai[c]);
                prop_assert!(
                    pixel[c] >= lo && pixel[c] <= hi,
                    "{} channel {} at ({}, {}) = {} outside [{}, {}]",
                    B::name(), c, x, y, pixel[c], lo, hi
                );
            }
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Unmasked pixels keep the photo, saturated ones take the model output,
    /// and everything in between is a mix of the two.
    #[test]
    fn prop_blend_stays_between_photo_and_model(scene in scene()) {
        check_blend_bounds::<BufferBackend>(&scene)?;
        check_blend_bounds::<CanvasBackend>(&scene)?;
    }

    /// An empty mask leaves the photo untouched.
    #[test]
    fn prop_empty_mask_is_identity(scene in scene()) {
        let scene = Scene {
            mask: GrayImage::new(scene.photo.width(), scene.photo.height()),
            ..scene
        };
        prop_assert_eq!(composite::<BufferBackend>(&scene), scene.photo.clone());
        prop_assert_eq!(composite::<CanvasBackend>(&scene), scene.photo.clone());
    }

    /// The model's own alpha never leaks into the result.
    #[test]
    fn prop_model_alpha_is_ignored(scene in scene(), alpha in any::<u8>()) {
        let mut translucent = scene.clone();
        for pixel in translucent.ai.pixels_mut() {
            pixel[3] = alpha;
        }
        prop_assert_eq!(composite::<BufferBackend>(&translucent), composite::<BufferBackend>(&scene));
        prop_assert_eq!(composite::<CanvasBackend>(&translucent), composite::<CanvasBackend>(&scene));
    }

    /// A wider feather only ever grows the set of touched pixels.
    #[test]
    fn prop_wider_feather_never_shrinks_coverage(
        scene in scene(),
        (narrow, wide) in (0..=16u32, 0..=16u32).prop_map(|(a, b)| (a.min(b), a.max(b))),
    ) {
        let (width, height) = scene.photo.dimensions();
        for alpha in [
            BufferBackend::resample_alpha(&scene.mask, width, height),
            CanvasBackend::resample_alpha(&scene.mask, width, height),
        ] {
            let small = feather(&alpha, narrow);
            let large = feather(&alpha, wide);
            prop_assert!(small.support_len() <= large.support_len());
            for y in 0..height {
                for x in 0..width {
                    prop_assert!(
                        small.is_zero(x, y) || !large.is_zero(x, y),
                        "({}, {}) covered at radius {} but not at {}",
                        x, y, narrow, wide
                    );
                }
            }
        }
    }

    /// The marker layer covers exactly the masked pixels.
    #[test]
    fn prop_chroma_layer_follows_mask(scene in scene()) {
        let (width, height) = scene.mask.dimensions();
        let mask = Mask::from_alpha(scene.mask.clone());
        for layer in [
            chroma_layer::<BufferBackend>(&mask, width, height),
            chroma_layer::<CanvasBackend>(&mask, width, height),
        ] {
            for (x, y, pixel) in layer.enumerate_pixels() {
                let alpha = scene.mask.get_pixel(x, y)[0];
                prop_assert_eq!(pixel[3], alpha);
                if alpha > 0 {
                    prop_assert_eq!([pixel[0], pixel[1], pixel[2]], MARKER_COLOR);
                }
            }
        }
    }

    /// Both backends agree to within one level per channel.
    #[test]
    fn prop_backends_agree(scene in scene()) {
        let buffer = composite::<BufferBackend>(&scene);
        let canvas = composite::<CanvasBackend>(&scene);
        for (x, y, a) in buffer.enumerate_pixels() {
            let b = canvas.get_pixel(x, y);
            for c in 0..4 {
                prop_assert!(
                    (a[c] as i16 - b[c] as i16).abs() <= 1,
                    "({}, {}) channel {}: buffer {} vs canvas {}",
                    x, y, c, a[c], b[c]
                );
            }
        }
    }
}
