//! Geographic bounding box and pixel geocoding

use crate::error::{Error, Result};
use crate::geometry::LatLng;
use serde::{Deserialize, Serialize};

/// Geographic extent of a raster in WGS84 degrees.
///
/// Invariants: all coordinates finite, `south < north`, `west < east`,
/// latitudes within [-90, 90] and longitudes within [-180, 180]. Enforced at
/// construction; rasters with out-of-range extents are rejected at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl LatLngBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Result<Self> {
        let bounds = Self {
            south,
            west,
            north,
            east,
        };
        bounds.validate()?;
        Ok(bounds)
    }

    fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidBounds {
            reason: reason.to_string(),
        };

        if ![self.south, self.west, self.north, self.east]
            .iter()
            .all(|c| c.is_finite())
        {
            return Err(invalid("non-finite coordinate"));
        }
        if self.south < -90.0 || self.north > 90.0 {
            return Err(invalid("latitude outside [-90, 90]"));
        }
        if self.west < -180.0 || self.east > 180.0 {
            return Err(invalid("longitude outside [-180, 180]"));
        }
        if self.south >= self.north {
            return Err(invalid("south must lie below north"));
        }
        if self.west >= self.east {
            return Err(invalid("west must lie left of east"));
        }
        Ok(())
    }

    /// Whether a coordinate falls within the extent (edges inclusive).
    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    /// Project a geographic coordinate onto the pixel grid of a raster with
    /// this extent.
    ///
    /// Returns `None` when the coordinate lands outside the grid; an
    /// out-of-raster sample is not an error, it is simply excluded from
    /// aggregation.
    pub fn to_pixel(&self, p: LatLng, width: usize, height: usize) -> Option<(usize, usize)> {
        let x = ((p.lng - self.west) / (self.east - self.west) * width as f64).floor();
        let y = ((self.north - p.lat) / (self.north - self.south) * height as f64).floor();

        if x >= 0.0 && x < width as f64 && y >= 0.0 && y < height as f64 {
            Some((x as usize, y as usize))
        } else {
            None
        }
    }

    /// Geographic coordinate of a pixel's center.
    ///
    /// Inverse of [`to_pixel`](Self::to_pixel): for any in-bounds pixel the
    /// center re-projects to the same (x, y).
    pub fn pixel_center(&self, x: usize, y: usize, width: usize, height: usize) -> LatLng {
        LatLng {
            lat: self.north - (y as f64 + 0.5) / height as f64 * (self.north - self.south),
            lng: self.west + (x as f64 + 0.5) / width as f64 * (self.east - self.west),
        }
    }

    /// Smallest extent covering both boxes, for fitting multi-image dates.
    pub fn union(&self, other: &LatLngBounds) -> LatLngBounds {
        LatLngBounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.south + self.north) / 2.0,
            lng: (self.west + self.east) / 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> LatLngBounds {
        LatLngBounds::new(0.0, 0.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_validation() {
        assert!(LatLngBounds::new(-10.0, -10.0, 10.0, 10.0).is_ok());
        assert!(LatLngBounds::new(-91.0, 0.0, 1.0, 1.0).is_err());
        assert!(LatLngBounds::new(0.0, 0.0, 91.0, 1.0).is_err());
        assert!(LatLngBounds::new(0.0, -181.0, 1.0, 1.0).is_err());
        assert!(LatLngBounds::new(0.0, 0.0, 1.0, 181.0).is_err());
        assert!(LatLngBounds::new(1.0, 0.0, 0.0, 1.0).is_err());
        assert!(LatLngBounds::new(0.0, 1.0, 1.0, 0.0).is_err());
        assert!(LatLngBounds::new(f64::NAN, 0.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn test_to_pixel() {
        let b = unit();
        assert_eq!(b.to_pixel(LatLng::new(0.995, 0.005), 100, 100), Some((0, 0)));
        assert_eq!(b.to_pixel(LatLng::new(0.5, 0.5), 100, 100), Some((50, 50)));
        assert_eq!(
            b.to_pixel(LatLng::new(0.005, 0.995), 100, 100),
            Some((99, 99))
        );
    }

    #[test]
    fn test_to_pixel_out_of_raster() {
        let b = unit();
        assert_eq!(b.to_pixel(LatLng::new(1.5, 0.5), 100, 100), None);
        assert_eq!(b.to_pixel(LatLng::new(0.5, -0.1), 100, 100), None);
        // The north/west edges themselves map onto the grid, the south/east
        // edges floor one past the last pixel.
        assert_eq!(b.to_pixel(LatLng::new(1.0, 0.0), 100, 100), Some((0, 0)));
        assert_eq!(b.to_pixel(LatLng::new(0.0, 1.0), 100, 100), None);
    }

    #[test]
    fn test_pixel_center_roundtrip() {
        let b = LatLngBounds::new(-12.5, 30.0, -10.0, 34.0).unwrap();
        let (width, height) = (37, 53);
        for y in (0..height).step_by(7) {
            for x in (0..width).step_by(5) {
                let center = b.pixel_center(x, y, width, height);
                assert_eq!(b.to_pixel(center, width, height), Some((x, y)));
            }
        }
    }

    #[test]
    fn test_union() {
        let a = LatLngBounds::new(0.0, 0.0, 1.0, 1.0).unwrap();
        let b = LatLngBounds::new(-1.0, 0.5, 0.5, 2.0).unwrap();
        let u = a.union(&b);
        assert_relative_eq!(u.south, -1.0);
        assert_relative_eq!(u.west, 0.0);
        assert_relative_eq!(u.north, 1.0);
        assert_relative_eq!(u.east, 2.0);
    }
}
