//! Raster side of the simulation: data URIs, photo/mask decoding, feathering
//! and the compositing passes run against a pluggable raster backend.

pub mod backend;
pub mod compose;
pub mod data_uri;
pub mod feather;
pub mod raster;

pub use backend::{
    resample_gray, resample_rgba, BackendKind, BufferBackend, CanvasBackend, RasterBackend,
};
pub use compose::{
    chroma_layer, compose_ai_input, composite_final, composite_or_fallback, feathered_coverage,
    prepare_ai_input, MARKER_COLOR,
};
pub use data_uri::{DataUri, DataUriError};
pub use feather::{
    feather, feather_with_sigma, AlphaMap, EDGE_SOFTEN_RADIUS, EDGE_SOFTEN_SIGMA, FEATHER_RADIUS,
};
pub use raster::{
    encode_png, encode_png_data_uri, normalize_upload, Mask, Photo, RasterError,
    MAX_PHOTO_DIMENSION,
};
