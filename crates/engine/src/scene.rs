//! Session state: images by date, user geometries, playback
//!
//! The `Scene` is the one mutable context the host UI drives. Every operation
//! that changes the raster set or a geometry recomputes the affected
//! aggregates, so a geometry's series is never stale.

use crate::aggregate::{aggregate_point, aggregate_region};
use crate::cache::IndexCache;
use crate::indices::{Overlay, SpectralIndex};
use crate::measurements::FieldMeasurements;
use crate::series::DateSeries;
use agrolens_core::bounds::LatLngBounds;
use agrolens_core::geometry::LatLng;
use agrolens_core::raster::{BandRole, GeoRaster, MaskStats};
use agrolens_core::{Error, Result};
use chrono::NaiveDate;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Minimum playback interval in seconds.
pub const MIN_PLAY_INTERVAL: f64 = 0.5;

/// One ingested raster together with its exclusively-owned index cache.
#[derive(Debug)]
pub struct SceneImage {
    raster: GeoRaster,
    cache: IndexCache,
    mask_enabled: bool,
    mask_stats: Option<MaskStats>,
}

impl SceneImage {
    /// Wrap a freshly decoded raster. A raster that ships a mask has it
    /// applied immediately, like at ingestion.
    pub(crate) fn new(raster: GeoRaster) -> Self {
        let mut image = Self {
            raster,
            cache: IndexCache::new(),
            mask_enabled: false,
            mask_stats: None,
        };
        if image.raster.has_mask() {
            image.set_mask_enabled(true);
        }
        image
    }

    pub fn id(&self) -> &str {
        self.raster.id()
    }

    pub fn raster(&self) -> &GeoRaster {
        &self.raster
    }

    pub fn mask_enabled(&self) -> bool {
        self.mask_enabled
    }

    /// Valid-pixel accounting from the most recent mask application.
    pub fn mask_stats(&self) -> Option<MaskStats> {
        self.mask_stats
    }

    pub fn cache(&self) -> &IndexCache {
        &self.cache
    }

    /// Cached index plane for this raster, computed on first use.
    pub fn index_values(&mut self, index: SpectralIndex) -> Result<&Array2<f32>> {
        self.cache.get(&self.raster, index)
    }

    /// Toggle the usability mask. Rewrites the working bands (from the
    /// pristine planes) and drops every cached index plane.
    pub(crate) fn set_mask_enabled(&mut self, enabled: bool) -> Option<MaskStats> {
        if !self.raster.has_mask() {
            return None;
        }
        self.mask_enabled = enabled;
        let stats = if enabled {
            let stats = self.raster.apply_mask();
            self.mask_stats = stats;
            stats
        } else {
            self.raster.clear_mask();
            None
        };
        self.cache.clear();
        stats
    }
}

/// A drawn polygon with its per-date aggregate series.
#[derive(Debug, Clone)]
pub struct Region {
    id: String,
    name: String,
    vertices: Vec<LatLng>,
    aggregates: DateSeries,
}

impl Region {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[LatLng] {
        &self.vertices
    }

    /// The full `{date -> {overlay -> value}}` series for the chart.
    pub fn series(&self) -> &DateSeries {
        &self.aggregates
    }
}

/// What a sample point is for; decides which measurement table applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointKind {
    Monitoring,
    Metagenomic,
}

/// A dropped marker with its per-date aggregate series.
#[derive(Debug, Clone)]
pub struct SamplePoint {
    id: String,
    name: String,
    kind: PointKind,
    position: LatLng,
    aggregates: DateSeries,
}

impl SamplePoint {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> PointKind {
        self.kind
    }

    pub fn position(&self) -> LatLng {
        self.position
    }

    pub fn series(&self) -> &DateSeries {
        &self.aggregates
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct Playback {
    interval: Option<Duration>,
}

/// The whole session: time-bucketed images, geometries, measurements and the
/// current viewing state.
#[derive(Debug, Default)]
pub struct Scene {
    images: BTreeMap<NaiveDate, Vec<SceneImage>>,
    regions: Vec<Region>,
    points: Vec<SamplePoint>,
    measurements: FieldMeasurements,
    current_date: Option<NaiveDate>,
    overlay: Overlay,
    playback: Playback,
    region_seq: usize,
    point_seq: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every image, geometry and measurement, returning to the initial
    /// state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    // ── images ──────────────────────────────────────────────────────────

    /// Ingest a decoded raster into a date bucket and recompute every
    /// geometry's aggregates.
    pub fn add_image(&mut self, date: NaiveDate, raster: GeoRaster) -> String {
        let id = self.insert_image(date, raster);
        self.recompute_aggregates();
        id
    }

    /// Insert without recomputing; batch ingestion recomputes once at the
    /// end instead of per file.
    pub(crate) fn insert_image(&mut self, date: NaiveDate, raster: GeoRaster) -> String {
        let image = SceneImage::new(raster);
        let id = image.id().to_string();
        self.images.entry(date).or_default().push(image);
        if self.current_date.is_none() {
            self.current_date = Some(date);
        }
        id
    }

    /// Remove an image, dropping its raster, cache and (when its bucket
    /// empties) its date; aggregates are recomputed.
    pub fn remove_image(&mut self, id: &str) -> Result<()> {
        let mut removed_date = None;
        for (date, bucket) in self.images.iter_mut() {
            if let Some(pos) = bucket.iter().position(|img| img.id() == id) {
                bucket.remove(pos);
                removed_date = Some(*date);
                break;
            }
        }
        let Some(date) = removed_date else {
            return Err(Error::UnknownImage(id.to_string()));
        };

        if self.images.get(&date).is_some_and(Vec::is_empty) {
            self.images.remove(&date);
        }
        if self.current_date == Some(date) && !self.images.contains_key(&date) {
            self.current_date = self.images.keys().next().copied();
        }
        self.recompute_aggregates();
        Ok(())
    }

    pub fn image(&self, id: &str) -> Option<&SceneImage> {
        self.images.values().flatten().find(|img| img.id() == id)
    }

    pub fn image_count(&self) -> usize {
        self.images.values().map(Vec::len).sum()
    }

    /// Every date carrying at least one image, ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.images.keys().copied().collect()
    }

    pub fn images_at(&self, date: NaiveDate) -> &[SceneImage] {
        self.images.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Combined extent of a date's images, for fitting the map view.
    pub fn combined_bounds(&self, date: NaiveDate) -> Option<LatLngBounds> {
        self.images_at(date)
            .iter()
            .map(|img| *img.raster().bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    /// Toggle an image's usability mask; the raster set changed, so every
    /// aggregate is recomputed.
    pub fn set_mask_enabled(&mut self, id: &str, enabled: bool) -> Result<Option<MaskStats>> {
        let image = self
            .images
            .values_mut()
            .flatten()
            .find(|img| img.id() == id)
            .ok_or_else(|| Error::UnknownImage(id.to_string()))?;
        let stats = image.set_mask_enabled(enabled);
        self.recompute_aggregates();
        Ok(stats)
    }

    // ── viewing state ───────────────────────────────────────────────────

    pub fn current_date(&self) -> Option<NaiveDate> {
        self.current_date
    }

    /// Select a date that has images. Returns whether the selection changed.
    pub fn select_date(&mut self, date: NaiveDate) -> bool {
        if self.images.contains_key(&date) && self.current_date != Some(date) {
            self.current_date = Some(date);
            true
        } else {
            false
        }
    }

    pub fn overlay(&self) -> Overlay {
        self.overlay
    }

    /// Change the displayed overlay. Aggregates cover every overlay already,
    /// so nothing is recomputed.
    pub fn set_overlay(&mut self, overlay: Overlay) {
        self.overlay = overlay;
    }

    // ── geometries ──────────────────────────────────────────────────────

    /// Register a drawn polygon and compute its aggregates across every date.
    pub fn add_region(&mut self, vertices: Vec<LatLng>) -> String {
        self.region_seq += 1;
        let id = format!("region-{}", self.region_seq);
        let mut region = Region {
            id: id.clone(),
            name: id.clone(),
            vertices,
            aggregates: DateSeries::new(),
        };
        Self::recompute_region(&mut self.images, &mut region);
        self.regions.push(region);
        id
    }

    /// Replace a region's vertex ring and recompute its aggregates.
    pub fn edit_region(&mut self, id: &str, vertices: Vec<LatLng>) -> Result<()> {
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        region.vertices = vertices;
        Self::recompute_region(&mut self.images, region);
        Ok(())
    }

    /// Rename a region. Display-only: the aggregates do not depend on the
    /// name and are left as they are.
    pub fn rename_region(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        let region = self
            .regions
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        region.name = name.into();
        Ok(())
    }

    pub fn remove_region(&mut self, id: &str) -> Result<()> {
        let pos = self
            .regions
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        self.regions.remove(pos);
        Ok(())
    }

    pub fn region(&self, id: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.id == id)
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    /// Register a dropped marker and compute its aggregates across every
    /// date.
    pub fn add_point(&mut self, position: LatLng, kind: PointKind) -> String {
        self.point_seq += 1;
        let id = format!("point-{}", self.point_seq);
        let mut point = SamplePoint {
            id: id.clone(),
            name: id.clone(),
            kind,
            position,
            aggregates: DateSeries::new(),
        };
        Self::recompute_point(&mut self.images, &mut point);
        self.points.push(point);
        id
    }

    /// Move a point and recompute its aggregates.
    pub fn move_point(&mut self, id: &str, position: LatLng) -> Result<()> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        point.position = position;
        Self::recompute_point(&mut self.images, point);
        Ok(())
    }

    /// Rename a point. Display-only, like [`rename_region`](Self::rename_region).
    pub fn rename_point(&mut self, id: &str, name: impl Into<String>) -> Result<()> {
        let point = self
            .points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        point.name = name.into();
        Ok(())
    }

    /// Remove a point together with its measurement records.
    pub fn remove_point(&mut self, id: &str) -> Result<()> {
        let pos = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| Error::UnknownGeometry(id.to_string()))?;
        self.points.remove(pos);
        self.measurements.remove_point(id);
        Ok(())
    }

    pub fn point(&self, id: &str) -> Option<&SamplePoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn points(&self) -> &[SamplePoint] {
        &self.points
    }

    // ── measurements ────────────────────────────────────────────────────

    pub fn measurements(&self) -> &FieldMeasurements {
        &self.measurements
    }

    pub fn measurements_mut(&mut self) -> &mut FieldMeasurements {
        &mut self.measurements
    }

    // ── aggregation ─────────────────────────────────────────────────────

    /// Recompute every geometry's series against the current raster set.
    pub(crate) fn recompute_aggregates(&mut self) {
        let images = &mut self.images;
        for region in &mut self.regions {
            Self::recompute_region(images, region);
        }
        for point in &mut self.points {
            Self::recompute_point(images, point);
        }
    }

    fn recompute_region(
        images: &mut BTreeMap<NaiveDate, Vec<SceneImage>>,
        region: &mut Region,
    ) {
        region.aggregates.clear();
        for (date, bucket) in images.iter_mut() {
            let per_overlay = Overlay::ALL
                .into_iter()
                .map(|overlay| {
                    (
                        overlay,
                        aggregate_region(bucket, overlay, &region.vertices),
                    )
                })
                .collect();
            region.aggregates.insert(*date, per_overlay);
        }
    }

    fn recompute_point(
        images: &mut BTreeMap<NaiveDate, Vec<SceneImage>>,
        point: &mut SamplePoint,
    ) {
        point.aggregates.clear();
        for (date, bucket) in images.iter_mut() {
            let per_overlay = Overlay::ALL
                .into_iter()
                .map(|overlay| (overlay, aggregate_point(bucket, overlay, point.position)))
                .collect();
            point.aggregates.insert(*date, per_overlay);
        }
    }

    // ── hover lookup ────────────────────────────────────────────────────

    /// Value under the cursor for the current date and overlay, formatted
    /// for the hover readout. When several same-date images cover the
    /// coordinate the last one wins, matching the display stacking order.
    pub fn pixel_value(&mut self, at: LatLng) -> String {
        const NO_DATA: &str = "no data";
        let Some(date) = self.current_date else {
            return NO_DATA.to_string();
        };
        let overlay = self.overlay;
        let Some(bucket) = self.images.get_mut(&date) else {
            return NO_DATA.to_string();
        };

        let mut result = None;
        for image in bucket.iter_mut() {
            let raster = image.raster();
            let (width, height) = (raster.width(), raster.height());
            let Some((x, y)) = raster.bounds().to_pixel(at, width, height) else {
                continue;
            };
            match overlay {
                Overlay::Rgb => {
                    let raster = image.raster();
                    let (Some(r), Some(g), Some(b)) = (
                        raster.band(BandRole::Red),
                        raster.band(BandRole::Green),
                        raster.band(BandRole::Blue),
                    ) else {
                        continue;
                    };
                    let (r, g, b) = (r[(y, x)], g[(y, x)], b[(y, x)]);
                    if !(r.is_nan() || g.is_nan() || b.is_nan()) {
                        result = Some(format!("[{r:.2}, {g:.2}, {b:.2}]"));
                    }
                }
                Overlay::Index(index) => {
                    if let Ok(values) = image.index_values(index) {
                        let v = values[(y, x)];
                        if !v.is_nan() {
                            result = Some(format!("{v:.4}"));
                        }
                    }
                }
            }
        }
        result.unwrap_or_else(|| NO_DATA.to_string())
    }

    // ── playback ────────────────────────────────────────────────────────

    /// Start advancing the date on a fixed interval (host-driven timer; the
    /// host calls [`playback_tick`](Self::playback_tick) on each firing).
    pub fn start_playback(&mut self, interval_secs: f64) -> Result<()> {
        if !interval_secs.is_finite() || interval_secs < MIN_PLAY_INTERVAL {
            return Err(Error::InvalidParameter {
                name: "interval",
                value: format!("{interval_secs}"),
                reason: format!("playback interval must be at least {MIN_PLAY_INTERVAL} s"),
            });
        }
        self.playback.interval = Some(Duration::from_secs_f64(interval_secs));
        Ok(())
    }

    pub fn stop_playback(&mut self) {
        self.playback.interval = None;
    }

    pub fn is_playing(&self) -> bool {
        self.playback.interval.is_some()
    }

    pub fn playback_interval(&self) -> Option<Duration> {
        self.playback.interval
    }

    /// Advance to the next date in order, wrapping at the end. No-op unless
    /// playback is running.
    pub fn playback_tick(&mut self) -> Option<NaiveDate> {
        if !self.is_playing() {
            return None;
        }
        let next = match self.current_date {
            Some(current) => self
                .images
                .keys()
                .copied()
                .find(|d| *d > current)
                .or_else(|| self.images.keys().next().copied()),
            None => self.images.keys().next().copied(),
        }?;
        self.current_date = Some(next);
        Some(next)
    }
}
