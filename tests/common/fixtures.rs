//! Test fixture creation
//!
//! Builds in-memory images and temporary reference directories.

#![allow(dead_code)]

use hairline_server::imaging::{encode_png_data_uri, DataUri, Photo};
use image::{Rgba, RgbaImage};
use std::fs;
use tempfile::TempDir;

/// Solid color PNG as a data URI string
pub fn png_data_uri(width: u32, height: u32, color: [u8; 4]) -> String {
    encode_png_data_uri(&RgbaImage::from_pixel(width, height, Rgba(color)))
        .expect("Failed to encode fixture PNG")
        .to_string()
}

/// Mask with an opaque rectangle `[x0, x1) x [y0, y1)` on a transparent background
pub fn mask_data_uri(width: u32, height: u32, rect: (u32, u32, u32, u32)) -> String {
    let (x0, y0, x1, y1) = rect;
    let mask = RgbaImage::from_fn(width, height, |x, y| {
        if x >= x0 && x < x1 && y >= y0 && y < y1 {
            Rgba([255, 255, 255, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png_data_uri(&mask)
        .expect("Failed to encode fixture mask")
        .to_string()
}

/// Decodes a data URI returned by the server
pub fn read_data_uri_image(uri: &str) -> RgbaImage {
    let uri = DataUri::parse(uri).expect("Result is not a data URI");
    Photo::from_data_uri(&uri)
        .expect("Result is not a decodable image")
        .into_pixels()
}

/// Creates a reference catalog holding a single HIGH density exemplar
pub fn create_reference_catalog() -> anyhow::Result<TempDir> {
    let temp_dir = TempDir::new()?;
    let high = temp_dir.path().join("density").join("high");
    fs::create_dir_all(&high)?;

    let uri = DataUri::parse(&png_data_uri(8, 8, [60, 40, 20, 255]))?;
    fs::write(high.join("1.png"), uri.decode()?)?;

    Ok(temp_dir)
}
