//! Multi-band raster data structures and masking

mod band;
mod image;

pub use band::BandRole;
pub use image::{BandPlane, GeoRaster, MaskStats};
