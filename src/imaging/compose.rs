//! The two compositing passes around the generative call.
//!
//! Before the call, [`compose_ai_input`] paints the selected region of the
//! photo in [`MARKER_COLOR`] so the model knows what to replace. After it,
//! [`composite_final`] blends the model output back into the untouched photo
//! through a feathered copy of the same mask.

use super::backend::RasterBackend;
use super::data_uri::DataUri;
use super::feather::{
    feather, feather_with_sigma, AlphaMap, EDGE_SOFTEN_RADIUS, EDGE_SOFTEN_SIGMA, FEATHER_RADIUS,
};
use super::raster::{encode_png_data_uri, Mask, Photo, RasterError};
use image::{GrayImage, RgbaImage};
use tracing::{debug, warn};

/// Pure green, never found on a scalp.
pub const MARKER_COLOR: [u8; 3] = [0, 255, 0];

/// Brings the mask to the photo's size, resampling only when needed.
fn reconcile_mask<B: RasterBackend>(mask: &Mask, width: u32, height: u32) -> GrayImage {
    if mask.dimensions() == (width, height) {
        mask.alpha().clone()
    } else {
        debug!(
            "Resampling mask from {:?} to {}x{}",
            mask.dimensions(),
            width,
            height
        );
        B::resample_alpha(mask.alpha(), width, height)
    }
}

/// The mask recolored to the marker, before any softening.
///
/// Alpha equals the (reconciled) mask alpha exactly; every pixel with nonzero
/// alpha carries [`MARKER_COLOR`].
pub fn chroma_layer<B: RasterBackend>(mask: &Mask, width: u32, height: u32) -> RgbaImage {
    let alpha = reconcile_mask::<B>(mask, width, height);
    B::export(&B::fill_through(MARKER_COLOR, &AlphaMap::exact(&alpha)))
}

/// Photo with the masked region painted in the marker color. Without a mask
/// the photo is returned as is.
pub fn compose_ai_input<B: RasterBackend>(photo: &Photo, mask: Option<&Mask>) -> RgbaImage {
    let Some(mask) = mask else {
        return photo.pixels().clone();
    };
    let (width, height) = photo.dimensions();
    let alpha = reconcile_mask::<B>(mask, width, height);

    let softened = feather_with_sigma(&alpha, EDGE_SOFTEN_RADIUS, EDGE_SOFTEN_SIGMA);
    let layer = B::fill_through(MARKER_COLOR, &softened);
    let mut surface = B::load(photo.pixels());
    B::source_over(&mut surface, &layer);
    B::export(&surface)
}

/// The seam-hiding coverage used by [`composite_final`], at the photo's size.
pub fn feathered_coverage<B: RasterBackend>(mask: &Mask, width: u32, height: u32) -> AlphaMap {
    feather(&reconcile_mask::<B>(mask, width, height), FEATHER_RADIUS)
}

/// Blends the model output into the photo, restricted to the feathered mask.
///
/// The model output is treated as opaque: its own alpha is discarded and the
/// blended alpha comes from the mask alone.
pub fn composite_final<B: RasterBackend>(photo: &Photo, ai_output: &RgbaImage, mask: &Mask) -> RgbaImage {
    let (width, height) = photo.dimensions();
    let coverage = feathered_coverage::<B>(mask, width, height);

    let mut opaque = ai_output.clone();
    for pixel in opaque.pixels_mut() {
        pixel[3] = 255;
    }

    let mut ai = if opaque.dimensions() == (width, height) {
        B::load(&opaque)
    } else {
        debug!(
            "Resampling AI output from {:?} to {}x{}",
            opaque.dimensions(),
            width,
            height
        );
        B::load_resampled(&opaque, width, height)
    };
    B::destination_in(&mut ai, &coverage);

    let mut surface = B::load(photo.pixels());
    B::source_over(&mut surface, &ai);
    B::export(&surface)
}

/// Builds the model input from encoded photo and mask.
pub fn prepare_ai_input<B: RasterBackend>(photo: &DataUri, mask: &DataUri) -> Result<DataUri, RasterError> {
    let photo = Photo::from_data_uri(photo)?;
    let mask = Mask::from_data_uri(mask)?;
    encode_png_data_uri(&compose_ai_input::<B>(&photo, Some(&mask)))
}

fn try_composite<B: RasterBackend>(
    photo: &DataUri,
    ai_output: &DataUri,
    mask: &DataUri,
) -> Result<DataUri, RasterError> {
    let photo = Photo::from_data_uri(photo)?;
    let ai_output = Photo::from_data_uri(ai_output)?;
    let mask = Mask::from_data_uri(mask)?;
    encode_png_data_uri(&composite_final::<B>(&photo, ai_output.pixels(), &mask))
}

/// Final blend over encoded images. Any decode or encode failure degrades to
/// the raw model output instead of failing the request.
pub fn composite_or_fallback<B: RasterBackend>(
    photo: &DataUri,
    ai_output: &DataUri,
    mask: &DataUri,
) -> DataUri {
    match try_composite::<B>(photo, ai_output, mask) {
        Ok(result) => result,
        Err(err) => {
            warn!(
                "Final composition on {} backend failed, returning raw AI output: {}",
                B::name(),
                err
            );
            ai_output.clone()
        }
    }
}
