//! Spectral vegetation and water indices
//!
//! Per-pixel formulas over the named bands of a [`GeoRaster`]. All formulas
//! propagate NaN: a masked sample in any required band yields NaN at that
//! pixel. Zero denominators are deliberately not guarded: IEEE-754 division
//! produces NaN or an infinity and downstream consumers treat every
//! non-finite sample as missing.

use agrolens_core::raster::{BandRole, GeoRaster};
use agrolens_core::{Error, Result};
use ndarray::{Array2, Zip};

/// Soil brightness correction factor for SAVI.
const SAVI_L: f32 = 0.5;

/// Band center wavelengths (nm) for the FAI baseline.
const FAI_LAMBDA_RED: f32 = 665.0;
const FAI_LAMBDA_RED_EDGE: f32 = 705.0;
const FAI_LAMBDA_NIR: f32 = 865.0;

/// Supported spectral indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SpectralIndex {
    /// Normalized Difference Vegetation Index
    Ndvi,
    /// Soil Adjusted Vegetation Index
    Savi,
    /// Enhanced Vegetation Index
    Evi,
    /// Normalized Difference Water Index (McFeeters)
    Ndwi,
    /// Normalized Difference Chlorophyll Index
    Ndci,
    /// Normalized Difference Tillage Index
    Ndti,
    /// Floating Algae Index
    Fai,
    /// Surface Algal Bloom Index
    Sabi,
}

impl SpectralIndex {
    pub const ALL: [SpectralIndex; 8] = [
        Self::Ndvi,
        Self::Savi,
        Self::Evi,
        Self::Ndwi,
        Self::Ndci,
        Self::Ndti,
        Self::Fai,
        Self::Sabi,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ndvi => "NDVI",
            Self::Savi => "SAVI",
            Self::Evi => "EVI",
            Self::Ndwi => "NDWI",
            Self::Ndci => "NDCI",
            Self::Ndti => "NDTI",
            Self::Fai => "FAI",
            Self::Sabi => "SABI",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|index| index.name().eq_ignore_ascii_case(name))
    }

    /// Band roles the formula reads. Computation fails with
    /// [`Error::UnsupportedIndex`] when any is absent.
    pub fn required_bands(&self) -> &'static [BandRole] {
        match self {
            Self::Ndvi | Self::Savi => &[BandRole::Red, BandRole::Nir],
            Self::Evi => &[BandRole::Blue, BandRole::Red, BandRole::Nir],
            Self::Ndwi => &[BandRole::Green, BandRole::Nir],
            Self::Ndci => &[BandRole::Red, BandRole::RedEdge],
            Self::Ndti => &[BandRole::Green, BandRole::Red],
            Self::Fai => &[BandRole::Red, BandRole::RedEdge, BandRole::Nir],
            Self::Sabi => &[
                BandRole::Blue,
                BandRole::Green,
                BandRole::Red,
                BandRole::Nir,
            ],
        }
    }

    /// What the index measures, for the UI's index panel.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Ndvi => {
                "Normalized Difference Vegetation Index. Measures vegetation health; \
                 useful for detecting pest or disease stress."
            }
            Self::Savi => {
                "Soil Adjusted Vegetation Index. Assesses vegetation over exposed \
                 soils, inferring soil characteristics."
            }
            Self::Evi => {
                "Enhanced Vegetation Index. Monitors biomass with less sensitivity \
                 to saturation."
            }
            Self::Ndwi => {
                "Normalized Difference Water Index. Assesses moisture in vegetation \
                 and soil, essential for bacterial activity."
            }
            Self::Ndci => {
                "Normalized Difference Chlorophyll Index. Detects chlorophyll, \
                 useful for bacterial diseases."
            }
            Self::Ndti => {
                "Normalized Difference Tillage Index. Assesses crop residue and \
                 soil management."
            }
            Self::Fai => {
                "Floating Algae Index. Detects aquatic biomass in irrigated areas."
            }
            Self::Sabi => {
                "Surface Algal Bloom Index. Monitors organic matter and bacterial \
                 activity in moist soils."
            }
        }
    }

    /// Compute the per-pixel index plane for a raster.
    pub fn compute(&self, raster: &GeoRaster) -> Result<Array2<f32>> {
        let missing = raster.missing_bands(self.required_bands());
        if !missing.is_empty() {
            return Err(Error::UnsupportedIndex {
                index: self.name(),
                missing,
            });
        }

        let plane = |role: BandRole| band_plane(raster, *self, role);

        let result = match self {
            Self::Ndvi => normalized_difference(plane(BandRole::Nir)?, plane(BandRole::Red)?),
            Self::Savi => {
                let (n, r) = (plane(BandRole::Nir)?, plane(BandRole::Red)?);
                Zip::from(n)
                    .and(r)
                    .map_collect(|&n, &r| ((n - r) / (n + r + SAVI_L)) * (1.0 + SAVI_L))
            }
            Self::Evi => {
                let (n, r, b) = (
                    plane(BandRole::Nir)?,
                    plane(BandRole::Red)?,
                    plane(BandRole::Blue)?,
                );
                Zip::from(n)
                    .and(r)
                    .and(b)
                    .map_collect(|&n, &r, &b| 2.5 * (n - r) / (n + 6.0 * r - 7.5 * b + 1.0))
            }
            Self::Ndwi => normalized_difference(plane(BandRole::Green)?, plane(BandRole::Nir)?),
            Self::Ndci => normalized_difference(plane(BandRole::RedEdge)?, plane(BandRole::Red)?),
            Self::Ndti => normalized_difference(plane(BandRole::Red)?, plane(BandRole::Green)?),
            Self::Fai => {
                let (n, r, re) = (
                    plane(BandRole::Nir)?,
                    plane(BandRole::Red)?,
                    plane(BandRole::RedEdge)?,
                );
                Zip::from(n).and(r).and(re).map_collect(|&n, &r, &re| {
                    // the red-edge sample only gates validity; the baseline
                    // is interpolated between the band center wavelengths
                    if re.is_nan() {
                        return f32::NAN;
                    }
                    let baseline = r
                        + ((n - r) / (FAI_LAMBDA_NIR - FAI_LAMBDA_RED))
                            * (FAI_LAMBDA_NIR - FAI_LAMBDA_RED_EDGE);
                    n - baseline
                })
            }
            Self::Sabi => {
                let (n, r, g, b) = (
                    plane(BandRole::Nir)?,
                    plane(BandRole::Red)?,
                    plane(BandRole::Green)?,
                    plane(BandRole::Blue)?,
                );
                Zip::from(n)
                    .and(r)
                    .and(g)
                    .and(b)
                    .map_collect(|&n, &r, &g, &b| (n - r) / (g + b))
            }
        };
        Ok(result)
    }
}

fn band_plane<'a>(
    raster: &'a GeoRaster,
    index: SpectralIndex,
    role: BandRole,
) -> Result<&'a Array2<f32>> {
    raster.band(role).ok_or_else(|| Error::UnsupportedIndex {
        index: index.name(),
        missing: vec![role],
    })
}

/// `(a - b) / (a + b)` per pixel, IEEE semantics throughout.
fn normalized_difference(a: &Array2<f32>, b: &Array2<f32>) -> Array2<f32> {
    Zip::from(a).and(b).map_collect(|&a, &b| (a - b) / (a + b))
}

/// What the viewer drapes over the map and samples for geometries: the raw
/// first-band diagnostic shown as a true-color composite (the UI's "None"
/// selection) or a spectral index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Overlay {
    #[default]
    Rgb,
    Index(SpectralIndex),
}

impl Overlay {
    pub const ALL: [Overlay; 9] = [
        Self::Rgb,
        Self::Index(SpectralIndex::Ndvi),
        Self::Index(SpectralIndex::Savi),
        Self::Index(SpectralIndex::Evi),
        Self::Index(SpectralIndex::Ndwi),
        Self::Index(SpectralIndex::Ndci),
        Self::Index(SpectralIndex::Ndti),
        Self::Index(SpectralIndex::Fai),
        Self::Index(SpectralIndex::Sabi),
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Rgb => "None",
            Self::Index(index) => index.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Rgb => {
                "No spectral index. Displays the RGB composite as configured in \
                 the sidecar."
            }
            Self::Index(index) => index.description(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agrolens_core::LatLngBounds;
    use approx::assert_relative_eq;

    fn bounds() -> LatLngBounds {
        LatLngBounds::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    fn raster(bands: Vec<(usize, BandRole, Vec<f32>)>) -> GeoRaster {
        GeoRaster::new("r", 2, 2, bounds(), bands, None).unwrap()
    }

    fn full_raster(blue: f32, green: f32, red: f32, red_edge: f32, nir: f32) -> GeoRaster {
        raster(vec![
            (1, BandRole::Blue, vec![blue; 4]),
            (2, BandRole::Green, vec![green; 4]),
            (3, BandRole::Red, vec![red; 4]),
            (4, BandRole::RedEdge, vec![red_edge; 4]),
            (5, BandRole::Nir, vec![nir; 4]),
        ])
    }

    #[test]
    fn test_ndvi() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let out = SpectralIndex::Ndvi.compute(&r).unwrap();
        assert_relative_eq!(out[(0, 0)], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn test_savi() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let out = SpectralIndex::Savi.compute(&r).unwrap();
        let expected = ((0.8 - 0.2) / (0.8 + 0.2 + 0.5)) * 1.5;
        assert_relative_eq!(out[(1, 1)], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_evi() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let out = SpectralIndex::Evi.compute(&r).unwrap();
        let expected = 2.5 * (0.8 - 0.2) / (0.8 + 6.0 * 0.2 - 7.5 * 0.05 + 1.0);
        assert_relative_eq!(out[(0, 1)], expected, epsilon = 1e-6);
    }

    #[test]
    fn test_ndwi() {
        let r = full_raster(0.05, 0.3, 0.2, 0.3, 0.1);
        let out = SpectralIndex::Ndwi.compute(&r).unwrap();
        assert_relative_eq!(out[(0, 0)], (0.3 - 0.1) / (0.3 + 0.1), epsilon = 1e-6);
    }

    #[test]
    fn test_ndci_and_ndti() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let ndci = SpectralIndex::Ndci.compute(&r).unwrap();
        assert_relative_eq!(ndci[(0, 0)], (0.3 - 0.2) / (0.3 + 0.2), epsilon = 1e-6);
        let ndti = SpectralIndex::Ndti.compute(&r).unwrap();
        assert_relative_eq!(ndti[(0, 0)], (0.2 - 0.1) / (0.2 + 0.1), epsilon = 1e-6);
    }

    #[test]
    fn test_fai() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let out = SpectralIndex::Fai.compute(&r).unwrap();
        let baseline = 0.2 + ((0.8 - 0.2) / (865.0 - 665.0)) * (865.0 - 705.0);
        assert_relative_eq!(out[(0, 0)], 0.8 - baseline, epsilon = 1e-6);
    }

    #[test]
    fn test_sabi() {
        let r = full_raster(0.05, 0.1, 0.2, 0.3, 0.8);
        let out = SpectralIndex::Sabi.compute(&r).unwrap();
        assert_relative_eq!(out[(0, 0)], (0.8 - 0.2) / (0.1 + 0.05), epsilon = 1e-6);
    }

    #[test]
    fn test_nan_propagation() {
        for index in SpectralIndex::ALL {
            let mut bands = Vec::new();
            for (number, role) in BandRole::ALL.iter().enumerate() {
                // pixel 0 is NaN in every band
                bands.push((number + 1, *role, vec![f32::NAN, 0.4, 0.4, 0.4]));
            }
            let r = GeoRaster::new("r", 2, 2, bounds(), bands, None).unwrap();
            let out = index.compute(&r).unwrap();
            assert!(out[(0, 0)].is_nan(), "{} should propagate NaN", index.name());
        }
    }

    #[test]
    fn test_fai_propagates_red_edge_nan() {
        // red edge is absent from the FAI formula itself but still gates it
        let r = raster(vec![
            (1, BandRole::Red, vec![0.2; 4]),
            (2, BandRole::RedEdge, vec![f32::NAN, 0.3, 0.3, 0.3]),
            (3, BandRole::Nir, vec![0.8; 4]),
        ]);
        let out = SpectralIndex::Fai.compute(&r).unwrap();
        assert!(out[(0, 0)].is_nan());
        assert!(!out[(0, 1)].is_nan());
    }

    #[test]
    fn test_nan_from_any_single_band() {
        // NaN only in the green band; every index reading green goes NaN
        let r = raster(vec![
            (1, BandRole::Green, vec![f32::NAN, 0.3, 0.3, 0.3]),
            (2, BandRole::Nir, vec![0.8; 4]),
        ]);
        let out = SpectralIndex::Ndwi.compute(&r).unwrap();
        assert!(out[(0, 0)].is_nan());
        assert!(!out[(0, 1)].is_nan());
    }

    #[test]
    fn test_unsupported_index() {
        let r = raster(vec![(1, BandRole::Red, vec![0.2; 4])]);
        let err = SpectralIndex::Ndvi.compute(&r).unwrap_err();
        match err {
            Error::UnsupportedIndex { index, missing } => {
                assert_eq!(index, "NDVI");
                assert_eq!(missing, vec![BandRole::Nir]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_division_by_zero_unguarded() {
        // all-zero green and NIR: NDWI denominator is 0 -> NaN, not an error
        let r = raster(vec![
            (1, BandRole::Green, vec![0.0; 4]),
            (2, BandRole::Nir, vec![0.0; 4]),
        ]);
        let out = SpectralIndex::Ndwi.compute(&r).unwrap();
        assert!(out[(0, 0)].is_nan());

        // non-zero numerator over zero denominator -> infinity flows through
        let r = raster(vec![
            (1, BandRole::Green, vec![0.5; 4]),
            (2, BandRole::Nir, vec![-0.5; 4]),
        ]);
        let out = SpectralIndex::Ndwi.compute(&r).unwrap();
        assert!(out[(0, 0)].is_infinite());
    }

    #[test]
    fn test_names_roundtrip() {
        for index in SpectralIndex::ALL {
            assert_eq!(SpectralIndex::from_name(index.name()), Some(index));
        }
        assert_eq!(SpectralIndex::from_name("ndvi"), Some(SpectralIndex::Ndvi));
        assert_eq!(SpectralIndex::from_name("ARI"), None);
    }

    #[test]
    fn test_required_bands_match_formulas() {
        // computing with exactly the required bands succeeds for every index
        for index in SpectralIndex::ALL {
            let bands = index
                .required_bands()
                .iter()
                .enumerate()
                .map(|(i, role)| (i + 1, *role, vec![0.4; 4]))
                .collect();
            let r = raster(bands);
            assert!(index.compute(&r).is_ok(), "{}", index.name());
        }
    }
}
