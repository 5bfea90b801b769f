//! Spatial aggregation of overlays over user geometries
//!
//! Samples are pooled by concatenation across every raster sharing a date
//! (same-date mosaicking, not reprojection-aware blending) and reduced to an
//! arithmetic mean. Non-finite samples, out-of-raster points and degenerate
//! polygons contribute nothing and are never reported as errors.

use crate::indices::Overlay;
use crate::scene::SceneImage;
use agrolens_core::geometry::{point_in_polygon, LatLng};
use ndarray::Array2;
use std::fmt;
use tracing::debug;

/// One statistic for a geometry, overlay and date.
///
/// Spectral means are rounded to 4 decimals. The raw first-band diagnostic
/// (the "None" overlay) is tagged distinctly so chart consumers never mix it
/// with true index means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    Mean(f64),
    RgbMean(f64),
    NotAvailable,
}

impl Aggregate {
    fn from_samples(overlay: Overlay, samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::NotAvailable;
        }
        let mean = round4(samples.iter().sum::<f64>() / samples.len() as f64);
        match overlay {
            Overlay::Rgb => Self::RgbMean(mean),
            Overlay::Index(_) => Self::Mean(mean),
        }
    }

    /// The spectral mean, if this is one (what the temporal chart plots).
    pub fn spectral(&self) -> Option<f64> {
        match self {
            Self::Mean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self, Self::NotAvailable)
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mean(v) => write!(f, "{v:.4}"),
            Self::RgbMean(v) => write!(f, "RGB: {v:.4}"),
            Self::NotAvailable => f.write_str("N/A"),
        }
    }
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}

/// Mean of an overlay at a single coordinate, pooled over one date's rasters.
pub fn aggregate_point(images: &mut [SceneImage], overlay: Overlay, at: LatLng) -> Aggregate {
    let mut samples = Vec::new();
    for image in images.iter_mut() {
        collect_point(image, overlay, at, &mut samples);
    }
    Aggregate::from_samples(overlay, &samples)
}

/// Mean of an overlay over a polygon, pooled over one date's rasters.
pub fn aggregate_region(
    images: &mut [SceneImage],
    overlay: Overlay,
    vertices: &[LatLng],
) -> Aggregate {
    let mut samples = Vec::new();
    for image in images.iter_mut() {
        collect_region(image, overlay, vertices, &mut samples);
    }
    Aggregate::from_samples(overlay, &samples)
}

fn collect_point(image: &mut SceneImage, overlay: Overlay, at: LatLng, out: &mut Vec<f64>) {
    let raster = image.raster();
    let (width, height) = (raster.width(), raster.height());
    let Some((x, y)) = raster.bounds().to_pixel(at, width, height) else {
        return;
    };
    let Some(values) = overlay_values(image, overlay) else {
        return;
    };
    let v = f64::from(values[(y, x)]);
    if v.is_finite() {
        out.push(v);
    }
}

fn collect_region(
    image: &mut SceneImage,
    overlay: Overlay,
    vertices: &[LatLng],
    out: &mut Vec<f64>,
) {
    if vertices.len() < 3 {
        return;
    }
    let raster = image.raster();
    let (width, height) = (raster.width(), raster.height());
    let bounds = *raster.bounds();
    let Some(values) = overlay_values(image, overlay) else {
        return;
    };

    for y in 0..height {
        for x in 0..width {
            let center = bounds.pixel_center(x, y, width, height);
            if !point_in_polygon(center, vertices) {
                continue;
            }
            let v = f64::from(values[(y, x)]);
            if v.is_finite() {
                out.push(v);
            }
        }
    }
}

/// The plane an overlay samples from: the raw first band for the diagnostic
/// display, or the cached index plane. An unsupported index is no-data for
/// this raster, not a failure of the whole aggregation.
fn overlay_values(image: &mut SceneImage, overlay: Overlay) -> Option<&Array2<f32>> {
    match overlay {
        Overlay::Rgb => Some(image.raster().first_band()),
        Overlay::Index(index) => match image.index_values(index) {
            Ok(values) => Some(values),
            Err(err) => {
                debug!("index unavailable: {err}");
                None
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indices::SpectralIndex;
    use agrolens_core::raster::{BandRole, GeoRaster};
    use agrolens_core::LatLngBounds;

    const NDVI: Overlay = Overlay::Index(SpectralIndex::Ndvi);

    fn unit_bounds() -> LatLngBounds {
        LatLngBounds::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    /// `size`x`size` raster over the unit square with constant NIR/Red.
    fn ndvi_image(size: usize, nir: f32, red: f32) -> SceneImage {
        let raster = GeoRaster::new(
            format!("r{size}"),
            size,
            size,
            unit_bounds(),
            vec![
                (1, BandRole::Red, vec![red; size * size]),
                (2, BandRole::Nir, vec![nir; size * size]),
            ],
            None,
        )
        .unwrap();
        SceneImage::new(raster)
    }

    fn inner_square() -> Vec<LatLng> {
        vec![
            LatLng::new(0.2, 0.2),
            LatLng::new(0.2, 0.8),
            LatLng::new(0.8, 0.8),
            LatLng::new(0.8, 0.2),
        ]
    }

    #[test]
    fn test_uniform_ndvi_region_mean() {
        // NIR 0.8, Red 0.2 everywhere -> NDVI 0.6 at every pixel
        let mut images = vec![ndvi_image(100, 0.8, 0.2)];
        let result = aggregate_region(&mut images, NDVI, &inner_square());
        assert_eq!(result, Aggregate::Mean(0.6));
        assert_eq!(result.to_string(), "0.6000");
    }

    #[test]
    fn test_uniform_ndvi_point() {
        let mut images = vec![ndvi_image(100, 0.8, 0.2)];
        let result = aggregate_point(&mut images, NDVI, LatLng::new(0.5, 0.5));
        assert_eq!(result, Aggregate::Mean(0.6));
    }

    #[test]
    fn test_region_outside_raster() {
        let mut images = vec![ndvi_image(100, 0.8, 0.2)];
        let outside = vec![
            LatLng::new(10.0, 10.0),
            LatLng::new(10.0, 11.0),
            LatLng::new(11.0, 11.0),
        ];
        for overlay in Overlay::ALL {
            assert_eq!(
                aggregate_region(&mut images, overlay, &outside),
                Aggregate::NotAvailable
            );
        }
    }

    #[test]
    fn test_point_outside_raster() {
        let mut images = vec![ndvi_image(100, 0.8, 0.2)];
        assert_eq!(
            aggregate_point(&mut images, NDVI, LatLng::new(2.0, 0.5)),
            Aggregate::NotAvailable
        );
    }

    #[test]
    fn test_degenerate_polygon() {
        let mut images = vec![ndvi_image(10, 0.8, 0.2)];
        let line = vec![LatLng::new(0.2, 0.2), LatLng::new(0.8, 0.8)];
        assert_eq!(
            aggregate_region(&mut images, NDVI, &line),
            Aggregate::NotAvailable
        );
    }

    #[test]
    fn test_pooled_mean_not_mean_of_means() {
        // Two rasters share the date: 10x10 at NDVI 0.6 and 20x20 at NDVI
        // 0.4. A polygon covering both pools 100 + 400 samples, so the mean
        // is (100*0.6 + 400*0.4) / 500 = 0.44, not (0.6 + 0.4) / 2.
        let mut images = vec![ndvi_image(10, 0.8, 0.2), ndvi_image(20, 0.7, 0.3)];
        let whole = vec![
            LatLng::new(-0.1, -0.1),
            LatLng::new(-0.1, 1.1),
            LatLng::new(1.1, 1.1),
            LatLng::new(1.1, -0.1),
        ];
        let result = aggregate_region(&mut images, NDVI, &whole);
        assert_eq!(result, Aggregate::Mean(0.44));
    }

    #[test]
    fn test_rgb_mean_tagged_distinctly() {
        let mut images = vec![ndvi_image(10, 0.8, 0.2)];
        let result = aggregate_region(&mut images, Overlay::Rgb, &inner_square());
        // first band is Red (band number 1), constant 0.2
        assert_eq!(result, Aggregate::RgbMean(0.2));
        assert_eq!(result.to_string(), "RGB: 0.2000");
        assert_eq!(result.spectral(), None);
    }

    #[test]
    fn test_unsupported_index_is_no_data() {
        // no Green band -> NDWI unsupported -> N/A rather than an error
        let mut images = vec![ndvi_image(10, 0.8, 0.2)];
        assert_eq!(
            aggregate_region(
                &mut images,
                Overlay::Index(SpectralIndex::Ndwi),
                &inner_square()
            ),
            Aggregate::NotAvailable
        );
    }

    #[test]
    fn test_non_finite_samples_excluded() {
        // Red 0 and NIR 0 in one corner pixel -> NDVI NaN there; the mean
        // pools only the finite samples.
        let size = 4;
        let mut red = vec![0.2; size * size];
        let mut nir = vec![0.8; size * size];
        red[0] = 0.0;
        nir[0] = 0.0;
        let raster = GeoRaster::new(
            "r",
            size,
            size,
            unit_bounds(),
            vec![(1, BandRole::Red, red), (2, BandRole::Nir, nir)],
            None,
        )
        .unwrap();
        let mut images = vec![SceneImage::new(raster)];
        let whole = vec![
            LatLng::new(-0.1, -0.1),
            LatLng::new(-0.1, 1.1),
            LatLng::new(1.1, 1.1),
            LatLng::new(1.1, -0.1),
        ];
        assert_eq!(
            aggregate_region(&mut images, NDVI, &whole),
            Aggregate::Mean(0.6)
        );
    }

    #[test]
    fn test_rounding_to_four_decimals() {
        assert_eq!(
            Aggregate::from_samples(NDVI, &[0.123456, 0.123456]),
            Aggregate::Mean(0.1235)
        );
        assert_eq!(Aggregate::from_samples(NDVI, &[]), Aggregate::NotAvailable);
    }
}
