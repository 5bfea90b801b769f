//! Ingestion I/O: file-naming contract, band-mapping sidecars and native
//! GeoTIFF decoding

mod decode;
mod naming;
mod sidecar;

pub use decode::{decode_mask, decode_scene, validate_byte_order, DecodedScene};
pub use naming::{acquisition_date, companion_tiff_name, mask_prefix};
pub use sidecar::{parse_band_mapping, BandMapping};
