//! Geographic geometry primitives used by the aggregator

use serde::{Deserialize, Serialize};

/// A geographic coordinate in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Ray-casting parity test over a closed (lat, lng) vertex ring.
///
/// The ring is implicitly closed: the edge from the last vertex back to the
/// first is always tested. Degenerate rings with fewer than three vertices
/// contain nothing.
pub fn point_in_polygon(point: LatLng, vertices: &[LatLng]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (xi, yi) = (vertices[i].lat, vertices[i].lng);
        let (xj, yj) = (vertices[j].lat, vertices[j].lng);

        let crosses = (yi > point.lng) != (yj > point.lng)
            && point.lat < (xj - xi) * (point.lng - yi) / (yj - yi) + xi;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(0.0, 10.0),
            LatLng::new(10.0, 10.0),
            LatLng::new(10.0, 0.0),
        ]
    }

    #[test]
    fn test_point_inside_square() {
        assert!(point_in_polygon(LatLng::new(5.0, 5.0), &square()));
    }

    #[test]
    fn test_point_outside_square() {
        assert!(!point_in_polygon(LatLng::new(15.0, 5.0), &square()));
        assert!(!point_in_polygon(LatLng::new(5.0, -1.0), &square()));
    }

    #[test]
    fn test_degenerate_rings() {
        assert!(!point_in_polygon(LatLng::new(0.0, 0.0), &[]));
        assert!(!point_in_polygon(
            LatLng::new(0.0, 0.0),
            &[LatLng::new(0.0, 0.0)]
        ));
        assert!(!point_in_polygon(
            LatLng::new(0.5, 0.5),
            &[LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)]
        ));
    }

    #[test]
    fn test_rotation_invariance() {
        let ring = square();
        let inside = LatLng::new(3.0, 7.0);
        let outside = LatLng::new(-3.0, 7.0);

        for shift in 0..ring.len() {
            let mut rotated = ring.clone();
            rotated.rotate_left(shift);
            assert!(point_in_polygon(inside, &rotated), "shift {}", shift);
            assert!(!point_in_polygon(outside, &rotated), "shift {}", shift);
        }
    }

    #[test]
    fn test_concave_polygon() {
        // A "C" shape: the notch on the right side is outside.
        let ring = vec![
            LatLng::new(0.0, 0.0),
            LatLng::new(10.0, 0.0),
            LatLng::new(10.0, 10.0),
            LatLng::new(8.0, 10.0),
            LatLng::new(8.0, 2.0),
            LatLng::new(2.0, 2.0),
            LatLng::new(2.0, 10.0),
            LatLng::new(0.0, 10.0),
        ];
        assert!(point_in_polygon(LatLng::new(1.0, 5.0), &ring));
        assert!(!point_in_polygon(LatLng::new(5.0, 5.0), &ring));
    }
}
