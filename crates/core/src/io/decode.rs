//! Native GeoTIFF decoding for the ingestion boundary
//!
//! Uses the `tiff` crate. The decoder hands the raster model raw band planes,
//! dimensions and a geographic bounding box; everything downstream works on
//! those, never on the byte stream.

use crate::bounds::LatLngBounds;
use crate::error::{Error, Result};
use std::io::Cursor;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;

// GeoTIFF georeferencing tags
const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;

/// Raw decoding product handed to the raster model: band planes in band-number
/// order, dimensions, and the geographic extent read from the geo-tags.
#[derive(Debug, Clone)]
pub struct DecodedScene {
    pub bands: Vec<Vec<f32>>,
    pub width: usize,
    pub height: usize,
    pub bounds: LatLngBounds,
}

/// Check the byte-order marker before attempting a decode.
///
/// A TIFF stream opens with `II` (little-endian) or `MM` (big-endian);
/// anything else is rejected up front.
pub fn validate_byte_order(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 2 {
        return Err(Error::InvalidByteOrder { marker: 0 });
    }
    let marker = u16::from_be_bytes([bytes[0], bytes[1]]);
    if marker != 0x4949 && marker != 0x4D4D {
        return Err(Error::InvalidByteOrder { marker });
    }
    Ok(())
}

/// Decode a multi-band GeoTIFF into per-band planes plus its bounding box.
pub fn decode_scene(bytes: &[u8]) -> Result<DecodedScene> {
    validate_byte_order(bytes)?;

    let mut decoder =
        Decoder::new(Cursor::new(bytes)).map_err(|e| Error::Decode(e.to_string()))?;
    let (width, height) = dimensions(&mut decoder)?;
    let samples = read_samples_f32(&mut decoder)?;
    let bands = split_planes(&mut decoder, samples, width, height)?;
    let bounds = read_bounds(&mut decoder, width, height)?;

    Ok(DecodedScene {
        bands,
        width,
        height,
        bounds,
    })
}

/// Decode a usability mask: the first plane with every sample collapsed to
/// 0 (valid) or 1 (masked).
pub fn decode_mask(bytes: &[u8]) -> Result<Vec<u8>> {
    validate_byte_order(bytes)?;

    let mut decoder =
        Decoder::new(Cursor::new(bytes)).map_err(|e| Error::Decode(e.to_string()))?;
    let (width, height) = dimensions(&mut decoder)?;
    let samples = read_samples_f32(&mut decoder)?;
    let mut planes = split_planes(&mut decoder, samples, width, height)?;

    // split_planes guarantees at least one plane
    let first = planes.swap_remove(0);
    Ok(first.iter().map(|&v| u8::from(v != 0.0)).collect())
}

fn dimensions<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<(usize, usize)> {
    let (width, height) = decoder
        .dimensions()
        .map_err(|e| Error::Decode(e.to_string()))?;
    let (width, height) = (width as usize, height as usize);
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    Ok((width, height))
}

fn read_samples_f32<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Result<Vec<f32>> {
    let result = decoder
        .read_image()
        .map_err(|e| Error::Decode(e.to_string()))?;

    let samples = match result {
        DecodingResult::U8(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U16(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U32(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::U64(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I16(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I32(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::I64(buf) => buf.iter().map(|&v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.iter().map(|&v| v as f32).collect(),
    };
    if samples.is_empty() {
        return Err(Error::Decode("no sample data".to_string()));
    }
    Ok(samples)
}

/// Split a decoded sample buffer into per-band planes, honoring the
/// PlanarConfiguration tag (1 = pixel-interleaved, 2 = separate planes).
fn split_planes<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    samples: Vec<f32>,
    width: usize,
    height: usize,
) -> Result<Vec<Vec<f32>>> {
    let len = width * height;
    if samples.len() % len != 0 {
        return Err(Error::Decode(format!(
            "{} samples do not tile a {}x{} grid",
            samples.len(),
            width,
            height
        )));
    }
    let band_count = samples.len() / len;
    if band_count == 1 {
        return Ok(vec![samples]);
    }

    let planar = decoder
        .find_tag(Tag::PlanarConfiguration)
        .ok()
        .flatten()
        .and_then(|v| v.into_u32().ok())
        .unwrap_or(1);

    let bands = if planar == 2 {
        samples.chunks_exact(len).map(|c| c.to_vec()).collect()
    } else {
        let mut bands = vec![Vec::with_capacity(len); band_count];
        for pixel in samples.chunks_exact(band_count) {
            for (band, &sample) in bands.iter_mut().zip(pixel) {
                band.push(sample);
            }
        }
        bands
    };
    Ok(bands)
}

/// Bounding box from ModelPixelScaleTag + ModelTiepointTag.
fn read_bounds<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
    width: usize,
    height: usize,
) -> Result<LatLngBounds> {
    let scale = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE_TAG))
        .map_err(|_| Error::Decode("missing ModelPixelScale tag".to_string()))?;
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::from_u16_exhaustive(MODEL_TIEPOINT_TAG))
        .map_err(|_| Error::Decode("missing ModelTiepoint tag".to_string()))?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err(Error::Decode(
            "malformed georeferencing tags".to_string(),
        ));
    }

    // tiepoint = [I, J, K, X, Y, Z], scale = [sx, sy, sz]
    let west = tiepoint[3] - tiepoint[0] * scale[0];
    let north = tiepoint[4] + tiepoint[1] * scale[1];
    let east = west + width as f64 * scale[0];
    let south = north - height as f64 * scale[1];

    // range/order validation doubles as the CRS sanity check: anything not in
    // geographic degrees lands outside [-90,90]x[-180,180]
    LatLngBounds::new(south, west, north, east)
}
