//! RGBA overlay composition

use crate::normalize::normalize;
use ndarray::Array2;

/// RGB color with channel values in 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// A color stop: position in [0, 1] mapped to an RGB color.
#[derive(Debug, Clone, Copy)]
pub struct ColorStop {
    pub t: f32,
    pub color: Rgb,
}

impl ColorStop {
    pub const fn new(t: f32, r: u8, g: u8, b: u8) -> Self {
        Self {
            t,
            color: Rgb::new(r, g, b),
        }
    }
}

/// Red -> pale yellow -> green ramp used for every spectral-index overlay.
const INDEX_STOPS: &[ColorStop] = &[
    ColorStop::new(0.0, 165, 0, 38),
    ColorStop::new(0.5, 255, 255, 191),
    ColorStop::new(1.0, 0, 104, 55),
];

/// Evaluate the index ramp at `t` (clamped to [0, 1]).
pub fn index_color(t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    for pair in INDEX_STOPS.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if t <= b.t {
            let span = b.t - a.t;
            let local = if span > 0.0 { (t - a.t) / span } else { 0.0 };
            return Rgb {
                r: lerp(a.color.r, b.color.r, local),
                g: lerp(a.color.g, b.color.g, local),
                b: lerp(a.color.b, b.color.b, local),
            };
        }
    }
    INDEX_STOPS[INDEX_STOPS.len() - 1].color
}

fn lerp(a: u8, b: u8, t: f32) -> u8 {
    (f32::from(a) + (f32::from(b) - f32::from(a)) * t).round() as u8
}

/// Compose an index plane into an RGBA buffer (row-major, 4 bytes per pixel).
///
/// Values are normalized to [0, 1] and run through the index ramp. Alpha is
/// derived from the plane itself: pixels that are NaN or infinite stay fully
/// transparent, regardless of the 0 they normalize to.
pub fn index_overlay(values: &Array2<f32>) -> Vec<u8> {
    let normalized = normalize(values);
    let mut rgba = vec![0u8; values.len() * 4];

    for (i, (&raw, &t)) in values.iter().zip(normalized.iter()).enumerate() {
        if !raw.is_finite() {
            continue; // transparent
        }
        let color = index_color(t);
        let offset = i * 4;
        rgba[offset] = color.r;
        rgba[offset + 1] = color.g;
        rgba[offset + 2] = color.b;
        rgba[offset + 3] = 255;
    }
    rgba
}

/// Compose three band planes into a true-color RGBA buffer.
///
/// Each channel is normalized independently. A pixel is transparent when any
/// of its source samples is NaN or infinite.
pub fn rgb_overlay(red: &Array2<f32>, green: &Array2<f32>, blue: &Array2<f32>) -> Vec<u8> {
    debug_assert_eq!(red.dim(), green.dim());
    debug_assert_eq!(red.dim(), blue.dim());

    let rn = normalize(red);
    let gn = normalize(green);
    let bn = normalize(blue);
    let mut rgba = vec![0u8; red.len() * 4];

    for (i, ((&r, &g), &b)) in red.iter().zip(green.iter()).zip(blue.iter()).enumerate() {
        if !(r.is_finite() && g.is_finite() && b.is_finite()) {
            continue; // transparent
        }
        let offset = i * 4;
        rgba[offset] = channel(&rn, i);
        rgba[offset + 1] = channel(&gn, i);
        rgba[offset + 2] = channel(&bn, i);
        rgba[offset + 3] = 255;
    }
    rgba
}

fn channel(normalized: &Array2<f32>, i: usize) -> u8 {
    let cols = normalized.ncols();
    (normalized[(i / cols, i % cols)] * 255.0).round() as u8
}
