//! Per-raster memoization of computed index planes

use crate::indices::SpectralIndex;
use agrolens_core::raster::GeoRaster;
use agrolens_core::Result;
use ndarray::Array2;
use std::collections::HashMap;

/// Memoized index planes for one raster.
///
/// Each cache is owned by exactly one raster and keyed by index; the stored
/// `Array2` carries the raster's `(height, width)` shape. Entries are valid
/// only for the raster revision they were computed at: whenever the working
/// bands are rewritten (mask applied or cleared) the next lookup drops every
/// entry. Within one revision each (raster, index) pair is computed at most
/// once.
#[derive(Debug, Default)]
pub struct IndexCache {
    revision: u64,
    entries: HashMap<SpectralIndex, Array2<f32>>,
    computations: usize,
}

impl IndexCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached index plane, computing it on first use.
    pub fn get(&mut self, raster: &GeoRaster, index: SpectralIndex) -> Result<&Array2<f32>> {
        if self.revision != raster.revision() {
            self.entries.clear();
            self.revision = raster.revision();
        }

        if !self.entries.contains_key(&index) {
            let values = index.compute(raster)?;
            self.computations += 1;
            self.entries.insert(index, values);
        }
        Ok(&self.entries[&index])
    }

    /// Drop every cached plane.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// How many planes were actually computed (cache misses) over the cache's
    /// lifetime.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
