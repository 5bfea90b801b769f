//! Overlay rendering for the map widget
//!
//! Glue between the scene and the colormap crate: picks the planes an overlay
//! needs and hands back an RGBA buffer plus the extent to drape it over.

use crate::indices::Overlay;
use crate::scene::SceneImage;
use agrolens_colormap::{index_overlay, rgb_overlay};
use agrolens_core::bounds::LatLngBounds;
use agrolens_core::raster::BandRole;
use agrolens_core::{Error, Result};

/// A composed overlay ready for the map widget.
#[derive(Debug, Clone)]
pub struct OverlayImage {
    /// Row-major RGBA, 4 bytes per pixel.
    pub rgba: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub bounds: LatLngBounds,
}

/// Render one image's current overlay.
///
/// The RGB composite needs all three visible bands; a spectral index needs
/// its required bands. Either failure surfaces as [`Error::UnsupportedIndex`]
/// for the caller to treat as "nothing to display".
pub fn render_overlay(image: &mut SceneImage, overlay: Overlay) -> Result<OverlayImage> {
    let raster = image.raster();
    let (width, height) = (raster.width(), raster.height());
    let bounds = *raster.bounds();

    let rgba = match overlay {
        Overlay::Rgb => {
            let missing =
                raster.missing_bands(&[BandRole::Red, BandRole::Green, BandRole::Blue]);
            let (Some(red), Some(green), Some(blue)) = (
                raster.band(BandRole::Red),
                raster.band(BandRole::Green),
                raster.band(BandRole::Blue),
            ) else {
                return Err(Error::UnsupportedIndex {
                    index: "RGB",
                    missing,
                });
            };
            rgb_overlay(red, green, blue)
        }
        Overlay::Index(index) => index_overlay(image.index_values(index)?),
    };

    Ok(OverlayImage {
        rgba,
        width,
        height,
        bounds,
    })
}
