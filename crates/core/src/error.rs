//! Error types for AgroLens

use crate::raster::BandRole;
use thiserror::Error;

/// Main error type for AgroLens operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed sidecar JSON: {0}")]
    Sidecar(#[from] serde_json::Error),

    #[error("invalid raster dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },

    #[error("band {role} has {got} samples, expected {expected}")]
    BandLength {
        role: BandRole,
        expected: usize,
        got: usize,
    },

    #[error("mask has {got} samples, expected {expected}")]
    MaskLength { expected: usize, got: usize },

    #[error("invalid bounding box: {reason}")]
    InvalidBounds { reason: String },

    #[error("invalid byte-order marker 0x{marker:04X}, expected II (0x4949) or MM (0x4D4D)")]
    InvalidByteOrder { marker: u16 },

    #[error("TIFF decode error: {0}")]
    Decode(String),

    #[error("no acquisition date in file name {name:?}")]
    MissingDate { name: String },

    #[error("companion raster {tiff:?} not found for {json:?}")]
    MissingCompanion { json: String, tiff: String },

    #[error("no layerConfiguration section in {name:?}")]
    MissingLayerConfiguration { name: String },

    #[error("no recognized bands in {name:?}")]
    NoRecognizedBands { name: String },

    #[error("{index} requires missing band(s) {missing:?}")]
    UnsupportedIndex {
        index: &'static str,
        missing: Vec<BandRole>,
    },

    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("unknown image id: {0}")]
    UnknownImage(String),

    #[error("unknown geometry id: {0}")]
    UnknownGeometry(String),
}

/// Result type alias for AgroLens operations
pub type Result<T> = std::result::Result<T, Error>;
