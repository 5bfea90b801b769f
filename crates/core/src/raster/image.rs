//! Multi-band georeferenced raster with validity masking

use crate::bounds::LatLngBounds;
use crate::error::{Error, Result};
use crate::raster::BandRole;
use ndarray::{Array2, Zip};

/// One spectral band of a raster.
///
/// Carries both a *working* plane, which masking rewrites, and the *pristine*
/// plane captured at ingestion, which is never mutated.
#[derive(Debug, Clone)]
pub struct BandPlane {
    role: BandRole,
    number: usize,
    working: Array2<f32>,
    pristine: Array2<f32>,
}

impl BandPlane {
    pub fn role(&self) -> BandRole {
        self.role
    }

    /// 1-based band number from the sidecar layer configuration.
    pub fn number(&self) -> usize {
        self.number
    }

    /// Current working samples (masked when the mask is applied).
    pub fn values(&self) -> &Array2<f32> {
        &self.working
    }

    /// Unmasked samples as decoded.
    pub fn pristine(&self) -> &Array2<f32> {
        &self.pristine
    }
}

/// Valid-pixel accounting for one mask application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaskStats {
    pub valid: usize,
    pub total: usize,
}

impl MaskStats {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.valid as f64 / self.total as f64
        }
    }

    /// Fewer than 10% of the pixels survive the mask. Surfaced to the caller
    /// as a warning, never as an error.
    pub fn is_sparse(&self) -> bool {
        self.fraction() < 0.1
    }
}

/// One decoded multi-band image: band planes, dimensions, geographic extent
/// and an optional usability mask.
///
/// Bands are ordered by their sidecar band number. Every plane shares the
/// raster's `(height, width)` shape; this is validated at construction.
/// Masking rewrites the working planes from the pristine copies, so applying
/// a mask twice is the same as applying it once. Every working-plane rewrite
/// bumps `revision`, which downstream caches use to invalidate.
#[derive(Debug, Clone)]
pub struct GeoRaster {
    id: String,
    width: usize,
    height: usize,
    bounds: LatLngBounds,
    bands: Vec<BandPlane>,
    mask: Option<Array2<u8>>,
    revision: u64,
}

impl GeoRaster {
    /// Assemble a raster from decoded planes.
    ///
    /// `bands` pairs a 1-based band number and role with its row-major
    /// samples; `mask` uses 0 as the valid sentinel. The mask is stored but
    /// not applied; call [`apply_mask`](Self::apply_mask).
    pub fn new(
        id: impl Into<String>,
        width: usize,
        height: usize,
        bounds: LatLngBounds,
        bands: Vec<(usize, BandRole, Vec<f32>)>,
        mask: Option<Vec<u8>>,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let id = id.into();
        if bands.is_empty() {
            return Err(Error::NoRecognizedBands { name: id });
        }

        let expected = width * height;
        let mut planes = Vec::with_capacity(bands.len());
        for (number, role, values) in bands {
            if values.len() != expected {
                return Err(Error::BandLength {
                    role,
                    expected,
                    got: values.len(),
                });
            }
            if planes.iter().any(|p: &BandPlane| p.role == role) {
                return Err(Error::InvalidParameter {
                    name: "bands",
                    value: role.to_string(),
                    reason: "duplicate band role".to_string(),
                });
            }
            let pristine = Array2::from_shape_vec((height, width), values)
                .map_err(|_| Error::InvalidDimensions { width, height })?;
            planes.push(BandPlane {
                role,
                number,
                working: pristine.clone(),
                pristine,
            });
        }
        planes.sort_by_key(|p| p.number);

        let mask = match mask {
            Some(values) => {
                if values.len() != expected {
                    return Err(Error::MaskLength {
                        expected,
                        got: values.len(),
                    });
                }
                Some(
                    Array2::from_shape_vec((height, width), values)
                        .map_err(|_| Error::InvalidDimensions { width, height })?,
                )
            }
            None => None,
        };

        Ok(Self {
            id,
            width,
            height,
            bounds,
            bands: planes,
            mask,
            revision: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels per band.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bounds(&self) -> &LatLngBounds {
        &self.bounds
    }

    /// Monotonic counter of working-plane rewrites.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn bands(&self) -> &[BandPlane] {
        &self.bands
    }

    /// Working samples of the band playing `role`, if present.
    pub fn band(&self, role: BandRole) -> Option<&Array2<f32>> {
        self.bands
            .iter()
            .find(|p| p.role == role)
            .map(|p| &p.working)
    }

    pub fn has_band(&self, role: BandRole) -> bool {
        self.bands.iter().any(|p| p.role == role)
    }

    /// Which of `roles` this raster does not carry.
    pub fn missing_bands(&self, roles: &[BandRole]) -> Vec<BandRole> {
        roles
            .iter()
            .copied()
            .filter(|role| !self.has_band(*role))
            .collect()
    }

    /// Lowest-numbered band plane; the raw diagnostic source for the "no
    /// index" display.
    pub fn first_band(&self) -> &Array2<f32> {
        // construction guarantees at least one band
        &self.bands[0].working
    }

    pub fn has_mask(&self) -> bool {
        self.mask.is_some()
    }

    /// Rewrite every working plane from its pristine copy, setting masked
    /// pixels (mask value != 0) to NaN.
    ///
    /// Always masks from the pristine original, never an already-masked
    /// plane, so the operation is idempotent. Returns `None` when the raster
    /// carries no mask.
    pub fn apply_mask(&mut self) -> Option<MaskStats> {
        let mask = self.mask.as_ref()?;

        for plane in &mut self.bands {
            plane.working = plane.pristine.clone();
            Zip::from(&mut plane.working).and(mask).for_each(|w, &m| {
                if m != 0 {
                    *w = f32::NAN;
                }
            });
        }
        self.revision += 1;

        let valid = mask.iter().filter(|&&m| m == 0).count();
        Some(MaskStats {
            valid,
            total: mask.len(),
        })
    }

    /// Restore the pristine samples in every working plane. The mask itself
    /// is retained and can be re-applied.
    pub fn clear_mask(&mut self) {
        if self.mask.is_none() {
            return;
        }
        for plane in &mut self.bands {
            plane.working = plane.pristine.clone();
        }
        self.revision += 1;
    }
}
