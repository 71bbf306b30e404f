//! Building metadata as consumed from the buildings endpoint.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One building-floor unit from the buildings GeoJSON. `layer_key` uniquely
/// identifies the unit; in aggregated mode a whole building collapses into a
/// single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerFeature {
    pub layer_key: String,
    pub lon: f64,
    pub lat: f64,
    pub height: f64,
    pub area: f64,
    pub floor: i32,
    #[serde(default)]
    pub description: String,
}

/// Geospatial anchor for a layer key: `[lon, lat, height]`.
pub type Coordinates = [f64; 3];

/// Building metadata for one layering mode, with a coordinate index derived
/// from the features for trajectory building and trail rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildingData {
    pub features: Vec<LayerFeature>,
    pub coordinates: BTreeMap<String, Coordinates>,
}

impl BuildingData {
    /// Index features by layer key.
    pub fn from_features(features: Vec<LayerFeature>) -> Self {
        let coordinates = features
            .iter()
            .map(|f| (f.layer_key.clone(), [f.lon, f.lat, f.height]))
            .collect();
        Self {
            features,
            coordinates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{BuildingData, LayerFeature};

    #[test]
    fn test_coordinate_index() {
        let data = BuildingData::from_features(vec![LayerFeature {
            layer_key: "E2_F3".into(),
            lon: 103.77,
            lat: 1.30,
            height: 12.0,
            area: 640.0,
            floor: 3,
            description: "Engineering Block 2".into(),
        }]);
        assert_eq!(data.coordinates["E2_F3"], [103.77, 1.30, 12.0]);
    }
}
