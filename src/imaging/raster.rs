//! Photo and mask rasters, plus the decode/normalize/encode steps around them.

use super::data_uri::{DataUri, DataUriError};
use image::{GrayImage, ImageEncoder, Luma, RgbaImage};
use thiserror::Error;

/// Longest edge accepted into the pipeline; larger uploads are scaled down.
pub const MAX_PHOTO_DIMENSION: u32 = 1280;

/// JPEG quality used when re-encoding a normalized upload.
pub const NORMALIZED_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum RasterError {
    #[error("Invalid image data: {0}")]
    DataUri(#[from] DataUriError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Image has zero area")]
    Empty,
}

/// The user's photo, held as straight-alpha RGBA.
#[derive(Debug, Clone)]
pub struct Photo {
    pixels: RgbaImage,
}

impl Photo {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let image = image::load_from_memory(bytes).map_err(|e| RasterError::Decode(e.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(RasterError::Empty);
        }
        Ok(Self::from_rgba(image.to_rgba8()))
    }

    pub fn from_data_uri(uri: &DataUri) -> Result<Self, RasterError> {
        Self::decode(&uri.decode()?)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Scales the photo down so its longer edge is at most [`MAX_PHOTO_DIMENSION`].
    /// Photos already within bounds are returned untouched.
    pub fn normalized(self) -> Self {
        let (width, height) = self.dimensions();
        let target = normalized_dimensions(width, height, MAX_PHOTO_DIMENSION);
        if target == (width, height) {
            return self;
        }
        Self::from_rgba(image::imageops::resize(
            &self.pixels,
            target.0,
            target.1,
            image::imageops::FilterType::Triangle,
        ))
    }
}

/// Aspect-preserving size whose longer edge does not exceed `max_dimension`.
pub fn normalized_dimensions(width: u32, height: u32, max_dimension: u32) -> (u32, u32) {
    if width <= max_dimension && height <= max_dimension {
        return (width, height);
    }
    let scale = |short: u32, long: u32| -> u32 {
        ((short as f64 / long as f64) * max_dimension as f64)
            .round()
            .max(1.0) as u32
    };
    if width > height {
        (max_dimension, scale(height, width))
    } else {
        (scale(width, height), max_dimension)
    }
}

/// Normalizes an uploaded photo the way the capture UI does before sending it:
/// bounded size, re-encoded as high quality JPEG.
pub fn normalize_upload(bytes: &[u8]) -> Result<DataUri, RasterError> {
    let photo = Photo::decode(bytes)?.normalized();
    let rgb = image::DynamicImage::ImageRgba8(photo.into_pixels()).to_rgb8();

    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, NORMALIZED_JPEG_QUALITY);
    encoder
        .encode(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| RasterError::Encode(e.to_string()))?;

    Ok(DataUri::from_bytes("image/jpeg", &buffer))
}

/// Single-channel selection mask: 0 leaves a pixel untouched, 255 selects it fully.
#[derive(Debug, Clone)]
pub struct Mask {
    alpha: GrayImage,
}

impl Mask {
    pub fn from_alpha(alpha: GrayImage) -> Self {
        Self { alpha }
    }

    /// Decodes a mask image. Images with an alpha channel contribute that
    /// channel; opaque images (grayscale or RGB) contribute their luminance.
    pub fn decode(bytes: &[u8]) -> Result<Self, RasterError> {
        let image = image::load_from_memory(bytes).map_err(|e| RasterError::Decode(e.to_string()))?;
        if image.width() == 0 || image.height() == 0 {
            return Err(RasterError::Empty);
        }
        if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let alpha = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
                Luma([rgba.get_pixel(x, y)[3]])
            });
            Ok(Self::from_alpha(alpha))
        } else {
            Ok(Self::from_alpha(image.to_luma8()))
        }
    }

    pub fn from_data_uri(uri: &DataUri) -> Result<Self, RasterError> {
        Self::decode(&uri.decode()?)
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.alpha.dimensions()
    }

    pub fn alpha(&self) -> &GrayImage {
        &self.alpha
    }

    /// True when no pixel is selected at all.
    pub fn is_blank(&self) -> bool {
        self.alpha.as_raw().iter().all(|&a| a == 0)
    }
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, RasterError> {
    let mut buffer = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buffer);
    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|e| RasterError::Encode(e.to_string()))?;
    Ok(buffer)
}

pub fn encode_png_data_uri(image: &RgbaImage) -> Result<DataUri, RasterError> {
    Ok(DataUri::from_bytes("image/png", &encode_png(image)?))
}
