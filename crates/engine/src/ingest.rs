//! Batch ingestion of sidecar/GeoTIFF pairs
//!
//! A batch is a sequential fold over the selected files. Every file is
//! processed independently: a failure is recorded and the fold moves on, so
//! one bad scene never blocks the rest. The report carries loaded-vs-attempted
//! counts plus the collected error list, surfaced atomically at the end.

use crate::scene::Scene;
use agrolens_core::io::{
    acquisition_date, companion_tiff_name, decode_mask, decode_scene, mask_prefix,
    parse_band_mapping,
};
use agrolens_core::raster::{BandRole, GeoRaster};
use agrolens_core::{Error, Result};
use std::fmt;
use tracing::{debug, info, warn};

/// One file handed to the batch loader, already read into memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// A per-file ingestion failure.
#[derive(Debug)]
pub struct IngestError {
    pub file: String,
    pub error: Error,
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.file, self.error)
    }
}

/// Outcome of one batch.
#[derive(Debug, Default)]
pub struct IngestReport {
    pub attempted: usize,
    pub loaded: usize,
    pub errors: Vec<IngestError>,
    pub warnings: Vec<String>,
}

impl IngestReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loaded {} of {} image(s), {} error(s)",
            self.loaded,
            self.attempted,
            self.errors.len()
        )
    }
}

/// Load a batch of files into the scene.
///
/// `files` holds the selected sidecars and rasters (other names are ignored);
/// `mask_files` holds optional usability masks, paired by filename prefix.
/// Aggregates are recomputed once after the fold rather than per file.
pub fn ingest_batch(scene: &mut Scene, files: &[InputFile], mask_files: &[InputFile]) -> IngestReport {
    let sidecars: Vec<&InputFile> = files.iter().filter(|f| f.name.ends_with(".json")).collect();
    let rasters: Vec<&InputFile> = files
        .iter()
        .filter(|f| f.name.ends_with(".tif") || f.name.ends_with(".tiff"))
        .collect();

    let mut report = IngestReport {
        attempted: sidecars.len(),
        ..Default::default()
    };

    for sidecar in sidecars {
        match ingest_one(scene, sidecar, &rasters, mask_files, &mut report) {
            Ok(id) => {
                report.loaded += 1;
                debug!(image = %id, "image ingested");
            }
            Err(error) => {
                report.errors.push(IngestError {
                    file: sidecar.name.clone(),
                    error,
                });
            }
        }
    }

    if report.loaded > 0 {
        scene.recompute_aggregates();
    }
    info!(loaded = report.loaded, attempted = report.attempted, "batch finished");
    report
}

fn ingest_one(
    scene: &mut Scene,
    sidecar: &InputFile,
    rasters: &[&InputFile],
    mask_files: &[InputFile],
    report: &mut IngestReport,
) -> Result<String> {
    let date = acquisition_date(&sidecar.name).ok_or_else(|| Error::MissingDate {
        name: sidecar.name.clone(),
    })?;

    let tiff_name = companion_tiff_name(&sidecar.name);
    let raster_file = rasters
        .iter()
        .find(|f| f.name == tiff_name)
        .ok_or_else(|| Error::MissingCompanion {
            json: sidecar.name.clone(),
            tiff: tiff_name.clone(),
        })?;

    let mapping = parse_band_mapping(&sidecar.name, &sidecar.bytes)?;
    let decoded = decode_scene(&raster_file.bytes)?;

    // A broken mask is reported but never rejects the scene itself.
    let prefix = mask_prefix(&sidecar.name);
    let mut mask = None;
    if let Some(mask_file) = mask_files.iter().find(|f| f.name.contains(prefix)) {
        match decode_mask(&mask_file.bytes) {
            Ok(values) if values.len() == decoded.width * decoded.height => {
                mask = Some(values);
            }
            Ok(values) => {
                report.errors.push(IngestError {
                    file: mask_file.name.clone(),
                    error: Error::MaskLength {
                        expected: decoded.width * decoded.height,
                        got: values.len(),
                    },
                });
            }
            Err(error) => {
                report.errors.push(IngestError {
                    file: mask_file.name.clone(),
                    error,
                });
            }
        }
    }

    // Mapped band numbers that the raster does not actually carry are
    // dropped; a mapping with nothing left is a rejection.
    let bands: Vec<(usize, BandRole, Vec<f32>)> = mapping
        .iter()
        .filter_map(|(role, number)| {
            decoded
                .bands
                .get(number - 1)
                .map(|plane| (number, role, plane.clone()))
        })
        .collect();
    if bands.is_empty() {
        return Err(Error::NoRecognizedBands {
            name: sidecar.name.clone(),
        });
    }

    let id = format!("image-{}-{}", scene.image_count() + 1, date);
    let raster = GeoRaster::new(id, decoded.width, decoded.height, decoded.bounds, bands, mask)?;
    let image_id = scene.insert_image(date, raster);

    if let Some(stats) = scene.image(&image_id).and_then(|img| img.mask_stats()) {
        if stats.is_sparse() {
            warn!(
                image = %image_id,
                valid = format!("{:.2}%", stats.fraction() * 100.0),
                "mask leaves fewer than 10% of pixels valid"
            );
            report.warnings.push(format!(
                "{image_id}: mask leaves only {:.2}% of pixels valid",
                stats.fraction() * 100.0
            ));
        }
    }

    Ok(image_id)
}
