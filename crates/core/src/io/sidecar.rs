//! Band-mapping sidecar documents
//!
//! Each scene ships a JSON sidecar whose `productMetadata.layerConfiguration`
//! section maps `layer<N>` keys to human band names. Only the five roles in
//! [`BandRole`] are recognized; anything else is ignored.

use crate::error::{Error, Result};
use crate::raster::BandRole;
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidecarDoc {
    product_metadata: Option<ProductMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductMetadata {
    layer_configuration: Option<BTreeMap<String, String>>,
}

/// Mapping from recognized band roles to 1-based band numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BandMapping(BTreeMap<BandRole, usize>);

impl BandMapping {
    pub fn get(&self, role: BandRole) -> Option<usize> {
        self.0.get(&role).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BandRole, usize)> + '_ {
        self.0.iter().map(|(role, number)| (*role, *number))
    }

    pub fn roles(&self) -> impl Iterator<Item = BandRole> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Parse the band mapping out of a sidecar document.
///
/// `name` is the sidecar file name, used in error values. Fails when the JSON
/// is malformed, the `layerConfiguration` section is absent, or no recognized
/// band name appears. When two layers claim the same role, the
/// highest-numbered layer wins.
pub fn parse_band_mapping(name: &str, json: &[u8]) -> Result<BandMapping> {
    let doc: SidecarDoc = serde_json::from_slice(json)?;
    let layers = doc
        .product_metadata
        .and_then(|m| m.layer_configuration)
        .ok_or_else(|| Error::MissingLayerConfiguration {
            name: name.to_string(),
        })?;

    let mut mapping: BTreeMap<BandRole, usize> = BTreeMap::new();
    for (layer, band_name) in &layers {
        let Some(number) = layer
            .strip_prefix("layer")
            .and_then(|n| n.parse::<usize>().ok())
        else {
            continue;
        };
        if number == 0 {
            continue;
        }
        if let Some(role) = BandRole::from_sidecar_name(band_name) {
            mapping
                .entry(role)
                .and_modify(|n| *n = (*n).max(number))
                .or_insert(number);
        }
    }

    if mapping.is_empty() {
        return Err(Error::NoRecognizedBands {
            name: name.to_string(),
        });
    }
    Ok(BandMapping(mapping))
}
