//! Spectral band roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// The spectral role a raster band plays.
///
/// Only these five roles are recognized in band-mapping sidecars; any other
/// layer name is ignored during ingestion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum BandRole {
    Blue,
    Green,
    Red,
    RedEdge,
    Nir,
}

impl BandRole {
    pub const ALL: [BandRole; 5] = [
        BandRole::Blue,
        BandRole::Green,
        BandRole::Red,
        BandRole::RedEdge,
        BandRole::Nir,
    ];

    /// Parse a sidecar layer name, case-insensitively.
    pub fn from_sidecar_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "blue" => Some(Self::Blue),
            "green" => Some(Self::Green),
            "red" => Some(Self::Red),
            "red edge" => Some(Self::RedEdge),
            "near infrared" => Some(Self::Nir),
            _ => None,
        }
    }

    /// Human-readable name, matching the sidecar spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Blue => "Blue",
            Self::Green => "Green",
            Self::Red => "Red",
            Self::RedEdge => "Red edge",
            Self::Nir => "Near infrared",
        }
    }
}

impl fmt::Display for BandRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
