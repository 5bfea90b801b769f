//! Display rescaling to [0, 1]

use ndarray::Array2;

/// Rescale a plane to `[0, 1]` for display.
///
/// Non-finite samples are excluded from the min/max scan and map to 0 in the
/// output ("no signal", not transparency; the overlay compositor derives
/// alpha from the original plane). A plane with no valid samples, or where
/// every valid sample is equal, normalizes to all zeros; the degenerate case
/// is not an error.
pub fn normalize(values: &Array2<f32>) -> Array2<f32> {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in values.iter() {
        if v.is_finite() {
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
        }
    }

    if !min.is_finite() || !max.is_finite() || min == max {
        return Array2::zeros(values.raw_dim());
    }

    let range = max - min;
    values.mapv(|v| if v.is_finite() { (v - min) / range } else { 0.0 })
}
