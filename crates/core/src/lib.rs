//! # AgroLens Core
//!
//! Core types and ingestion I/O for the AgroLens multispectral engine.
//!
//! This crate provides:
//! - `GeoRaster`: decoded multi-band image with validity masking
//! - `LatLngBounds`: geographic bounding box and pixel geocoding
//! - `LatLng` + `point_in_polygon`: geometry primitives for aggregation
//! - I/O for the sidecar/GeoTIFF ingestion contract

pub mod bounds;
pub mod error;
pub mod geometry;
pub mod io;
pub mod raster;

pub use bounds::LatLngBounds;
pub use error::{Error, Result};
pub use geometry::{point_in_polygon, LatLng};
pub use raster::{BandRole, GeoRaster, MaskStats};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::bounds::LatLngBounds;
    pub use crate::error::{Error, Result};
    pub use crate::geometry::{point_in_polygon, LatLng};
    pub use crate::raster::{BandRole, GeoRaster, MaskStats};
}
