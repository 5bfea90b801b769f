//! AgroLens CLI - batch-load multispectral scenes and query index series

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use agrolens_core::geometry::LatLng;
use agrolens_engine::indices::{Overlay, SpectralIndex};
use agrolens_engine::ingest::{ingest_batch, InputFile};
use agrolens_engine::scene::{PointKind, Scene};
use agrolens_engine::series::chart_points;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "agrolens")]
#[command(author, version, about = "Multi-temporal multispectral index engine", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load a directory of sidecar/GeoTIFF pairs and report what was ingested
    Info {
        /// Directory holding .json sidecars, .tif scenes and optional *udm* masks
        dir: PathBuf,
    },
    /// Temporal series of a spectral index over a polygon or at a point
    Series {
        /// Directory holding .json sidecars, .tif scenes and optional *udm* masks
        dir: PathBuf,
        /// Index name (NDVI, SAVI, EVI, NDWI, NDCI, NDTI, FAI, SABI)
        #[arg(long, default_value = "NDVI")]
        index: String,
        /// Polygon vertices as "lat,lng" pairs (at least 3)
        #[arg(long, value_name = "LAT,LNG", num_args = 3..)]
        region: Option<Vec<String>>,
        /// Single "lat,lng" sample point
        #[arg(long, value_name = "LAT,LNG", conflicts_with = "region")]
        point: Option<String>,
    },
    /// Describe a spectral index
    Describe {
        /// Index name, or "None" for the RGB display
        index: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    match cli.command {
        Commands::Info { dir } => info_command(&dir),
        Commands::Series {
            dir,
            index,
            region,
            point,
        } => series_command(&dir, &index, region, point),
        Commands::Describe { index } => describe_command(&index),
    }
}

// ─── Commands ───────────────────────────────────────────────────────────

fn info_command(dir: &Path) -> Result<()> {
    let mut scene = Scene::new();
    load_directory(&mut scene, dir)?;

    for date in scene.dates() {
        let images = scene.images_at(date);
        println!("{date}: {} image(s)", images.len());
        for image in images {
            let raster = image.raster();
            let bands: Vec<&str> = raster.bands().iter().map(|b| b.role().name()).collect();
            println!(
                "  {} {}x{} [{}]{}",
                image.id(),
                raster.width(),
                raster.height(),
                bands.join(", "),
                match image.mask_stats() {
                    Some(stats) => format!(
                        " mask: {:.1}% valid",
                        stats.fraction() * 100.0
                    ),
                    None => String::new(),
                }
            );
        }
    }
    Ok(())
}

fn series_command(
    dir: &Path,
    index: &str,
    region: Option<Vec<String>>,
    point: Option<String>,
) -> Result<()> {
    let overlay = parse_overlay(index)?;

    let mut scene = Scene::new();
    load_directory(&mut scene, dir)?;

    let series = match (region, point) {
        (Some(vertices), None) => {
            let vertices: Vec<LatLng> = vertices
                .iter()
                .map(|s| parse_latlng(s))
                .collect::<Result<_>>()?;
            let id = scene.add_region(vertices);
            scene
                .region(&id)
                .map(|r| r.series().clone())
                .context("region vanished after creation")?
        }
        (None, Some(at)) => {
            let id = scene.add_point(parse_latlng(&at)?, PointKind::Monitoring);
            scene
                .point(&id)
                .map(|p| p.series().clone())
                .context("point vanished after creation")?
        }
        _ => bail!("pass either --region or --point"),
    };

    let mut printed = 0;
    for (date, values) in &series {
        if let Some(value) = values.get(&overlay) {
            println!("{date}  {value}");
            printed += 1;
        }
    }
    if printed == 0 {
        println!("(no dates loaded)");
    } else if let Overlay::Index(_) = overlay {
        let points = chart_points(&series, overlay);
        if points.is_empty() {
            println!("(no data for {} on any date)", overlay.label());
        }
    }
    Ok(())
}

fn describe_command(index: &str) -> Result<()> {
    let overlay = parse_overlay(index)?;
    println!("{}: {}", overlay.label(), overlay.description());
    Ok(())
}

// ─── Helpers ────────────────────────────────────────────────────────────

/// Read every relevant file under `dir` and run one ingestion batch.
fn load_directory(scene: &mut Scene, dir: &Path) -> Result<()> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)
        .with_context(|| format!("cannot read directory {}", dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".json") || name.ends_with(".tif") || name.ends_with(".tiff") {
            names.push((name, entry.path()));
        }
    }
    if names.is_empty() {
        bail!("no sidecar or raster files in {}", dir.display());
    }

    let bar = ProgressBar::new(names.len() as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40} {pos}/{len} {msg}")
            .context("invalid progress template")?,
    );

    let mut files = Vec::new();
    let mut masks = Vec::new();
    for (name, path) in names {
        bar.set_message(name.clone());
        let bytes =
            fs::read(&path).with_context(|| format!("cannot read {}", path.display()))?;
        // usability masks are shipped alongside the scenes, tagged "udm"
        if name.contains("udm") {
            masks.push(InputFile::new(name, bytes));
        } else {
            files.push(InputFile::new(name, bytes));
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let report = ingest_batch(scene, &files, &masks);
    info!("{report}");
    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    if !report.is_complete() {
        eprintln!("errors:");
        for error in &report.errors {
            eprintln!("  {error}");
        }
    }
    if report.loaded == 0 {
        bail!("no images loaded from {}", dir.display());
    }
    Ok(())
}

fn parse_overlay(name: &str) -> Result<Overlay> {
    if name.eq_ignore_ascii_case("none") || name.eq_ignore_ascii_case("rgb") {
        return Ok(Overlay::Rgb);
    }
    SpectralIndex::from_name(name)
        .map(Overlay::Index)
        .with_context(|| {
            let names: Vec<&str> = SpectralIndex::ALL.iter().map(|i| i.name()).collect();
            format!("unknown index {name:?}; expected one of {}", names.join(", "))
        })
}

fn parse_latlng(s: &str) -> Result<LatLng> {
    let (lat, lng) = s
        .split_once(',')
        .with_context(|| format!("expected \"lat,lng\", got {s:?}"))?;
    Ok(LatLng::new(
        lat.trim().parse().context("latitude is not a number")?,
        lng.trim().parse().context("longitude is not a number")?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_latlng() {
        let p = parse_latlng("-12.5, 30.25").unwrap();
        assert_eq!(p.lat, -12.5);
        assert_eq!(p.lng, 30.25);
        assert!(parse_latlng("12.5").is_err());
        assert!(parse_latlng("a,b").is_err());
    }

    #[test]
    fn test_load_directory_rejects_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = Scene::new();
        assert!(load_directory(&mut scene, dir.path()).is_err());
    }

    #[test]
    fn test_parse_overlay() {
        assert_eq!(parse_overlay("none").unwrap(), Overlay::Rgb);
        assert_eq!(
            parse_overlay("ndwi").unwrap(),
            Overlay::Index(SpectralIndex::Ndwi)
        );
        assert!(parse_overlay("PRI").is_err());
    }
}
