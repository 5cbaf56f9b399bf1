//! Portable feature types shared by the engine and the HTTP layer.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::AttrValue;

/// Which of the two datasets a record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetKind {
    /// Land parcels (lotes)
    #[serde(rename = "lotes")]
    Parcels,
    /// Real-estate listings (imóveis)
    #[serde(rename = "imoveis")]
    Properties,
}

impl DatasetKind {
    pub fn all() -> [DatasetKind; 2] {
        [DatasetKind::Parcels, DatasetKind::Properties]
    }

    /// Name used in routes and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Parcels => "lotes",
            DatasetKind::Properties => "imoveis",
        }
    }
}

impl std::fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Geographic point (lat/lon)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Attribute map of a feature, in the column order of its collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<(String, AttrValue)>);

impl Properties {
    pub fn new(entries: Vec<(String, AttrValue)>) -> Self {
        Self(entries)
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A record rendered as a GeoJSON-style feature
#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub properties: Properties,
    pub geometry: Option<geojson::Geometry>,
}

impl Feature {
    pub fn new(properties: Properties, geometry: Option<geojson::Geometry>) -> Self {
        Self {
            feature_type: "Feature",
            properties,
            geometry,
        }
    }
}

/// Export envelope: `{ "type": "FeatureCollection", "features": [...] }`
#[derive(Debug, Clone, Serialize)]
pub struct FeatureCollectionExport {
    #[serde(rename = "type")]
    pub collection_type: &'static str,
    pub features: Vec<Feature>,
}

impl FeatureCollectionExport {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            collection_type: "FeatureCollection",
            features,
        }
    }
}

/// Records matched by a radius query, per collection
#[derive(Debug, Clone, Default, Serialize)]
pub struct MatchSet {
    #[serde(rename = "lotes")]
    pub parcels: Vec<Feature>,
    #[serde(rename = "imoveis")]
    pub properties: Vec<Feature>,
}

/// Bounding box in angular coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    #[serde(rename = "minLng")]
    pub min_lon: f64,
    #[serde(rename = "minLat")]
    pub min_lat: f64,
    #[serde(rename = "maxLng")]
    pub max_lon: f64,
    #[serde(rename = "maxLat")]
    pub max_lat: f64,
}

impl GeoBounds {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Smallest box covering both `self` and `other`
    pub fn union(&self, other: &GeoBounds) -> GeoBounds {
        GeoBounds {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}
