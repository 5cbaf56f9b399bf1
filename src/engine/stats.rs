//! Summary statistics over the records matched by a radius query.
//!
//! Every metric is optional: when the values it is computed from are all
//! missing, the key is left out of the output entirely rather than emitted
//! as null or zero. Callers branch on key presence.

use hashbrown::HashMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::config::AttributeConfig;
use crate::models::{AttrValue, Feature, MatchSet, ValueKey};

/// Statistics for both collections of a match set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AnalysisStats {
    #[serde(rename = "lotes")]
    pub parcels: ParcelStats,
    #[serde(rename = "imoveis")]
    pub properties: PropertyStats,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParcelStats {
    #[serde(rename = "area_media", skip_serializing_if = "Option::is_none")]
    pub area_mean: Option<f64>,
    #[serde(rename = "area_total", skip_serializing_if = "Option::is_none")]
    pub area_total: Option<f64>,
    #[serde(rename = "area_min", skip_serializing_if = "Option::is_none")]
    pub area_min: Option<f64>,
    #[serde(rename = "area_max", skip_serializing_if = "Option::is_none")]
    pub area_max: Option<f64>,
    #[serde(rename = "bairros_unicos", skip_serializing_if = "Option::is_none")]
    pub distinct_neighborhoods: Option<usize>,
    #[serde(rename = "distribuicao_bairros", skip_serializing_if = "Option::is_none")]
    pub neighborhoods: Option<Histogram>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PropertyStats {
    #[serde(rename = "preco_medio", skip_serializing_if = "Option::is_none")]
    pub price_mean: Option<f64>,
    #[serde(rename = "preco_min", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(rename = "preco_max", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(rename = "metragem_media", skip_serializing_if = "Option::is_none")]
    pub private_area_mean: Option<f64>,
    #[serde(rename = "distribuicao_dormitorios", skip_serializing_if = "Option::is_none")]
    pub bedrooms: Option<Histogram>,
}

/// Value → occurrence count, most frequent first.
///
/// Buckets are keyed by [`ValueKey`], so `2` and `2.0` share a bucket while
/// `"2"` gets its own. Ties keep the order in which values were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Histogram(Vec<(String, usize)>);

impl Histogram {
    /// Count the non-null values of `values`
    pub fn from_values<'a, I>(values: I) -> Self
    where
        I: IntoIterator<Item = &'a AttrValue>,
    {
        let mut positions: HashMap<ValueKey, usize> = HashMap::new();
        let mut buckets: Vec<(String, usize)> = Vec::new();

        for value in values {
            let Some(key) = value.key() else { continue };
            match positions.get(&key) {
                Some(&pos) => buckets[pos].1 += 1,
                None => {
                    positions.insert(key, buckets.len());
                    buckets.push((value.to_string(), 1));
                }
            }
        }

        // Stable sort keeps first-seen order among equal counts
        buckets.sort_by(|a, b| b.1.cmp(&a.1));
        Self(buckets)
    }

    /// Number of distinct values
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Count of the first bucket rendered as `label`
    pub fn get(&self, label: &str) -> Option<usize> {
        self.0.iter().find(|(l, _)| l == label).map(|(_, c)| *c)
    }

    pub fn entries(&self) -> &[(String, usize)] {
        &self.0
    }

    /// Label → count pairs for output. Distinct values that render to the
    /// same label share one entry, since a JSON object cannot repeat a key.
    fn rendered(&self) -> Vec<(&str, usize)> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        let mut merged: Vec<(&str, usize)> = Vec::with_capacity(self.0.len());
        for (label, count) in &self.0 {
            match positions.get(label.as_str()) {
                Some(&pos) => merged[pos].1 += count,
                None => {
                    positions.insert(label.as_str(), merged.len());
                    merged.push((label.as_str(), *count));
                }
            }
        }
        merged.sort_by(|a, b| b.1.cmp(&a.1));
        merged
    }
}

impl Serialize for Histogram {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = self.rendered();
        let mut map = serializer.serialize_map(Some(rendered.len()))?;
        for (label, count) in rendered {
            map.serialize_entry(label, &count)?;
        }
        map.end()
    }
}

/// Basic descriptive numbers over a non-empty sample
#[derive(Debug, Clone, Copy, PartialEq)]
struct Summary {
    mean: f64,
    sum: f64,
    min: f64,
    max: f64,
}

impl Summary {
    fn of(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let sum: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            mean: sum / values.len() as f64,
            sum,
            min,
            max,
        })
    }
}

/// Non-null numeric values of `key`
fn numeric_values(features: &[Feature], key: &str) -> Vec<f64> {
    features
        .iter()
        .filter_map(|f| f.properties.get(key)?.as_f64())
        .collect()
}

/// Histogram of the non-null values of `key`
fn histogram(features: &[Feature], key: &str) -> Option<Histogram> {
    let values = features.iter().filter_map(|f| f.properties.get(key));
    let histogram = Histogram::from_values(values);
    (!histogram.is_empty()).then_some(histogram)
}

pub fn parcel_stats(features: &[Feature], attributes: &AttributeConfig) -> ParcelStats {
    let area = Summary::of(&numeric_values(features, &attributes.terrain_area));
    let neighborhoods = histogram(features, &attributes.neighborhood);

    ParcelStats {
        area_mean: area.map(|s| s.mean),
        area_total: area.map(|s| s.sum),
        area_min: area.map(|s| s.min),
        area_max: area.map(|s| s.max),
        distinct_neighborhoods: neighborhoods.as_ref().map(Histogram::len),
        neighborhoods,
    }
}

pub fn property_stats(features: &[Feature], attributes: &AttributeConfig) -> PropertyStats {
    let price = Summary::of(&numeric_values(features, &attributes.total_price));
    let private_area = Summary::of(&numeric_values(features, &attributes.private_area));
    let bedrooms = histogram(features, &attributes.bedrooms);

    PropertyStats {
        price_mean: price.map(|s| s.mean),
        price_min: price.map(|s| s.min),
        price_max: price.map(|s| s.max),
        private_area_mean: private_area.map(|s| s.mean),
        bedrooms,
    }
}

/// Summarize a match set
pub fn aggregate(matches: &MatchSet, attributes: &AttributeConfig) -> AnalysisStats {
    AnalysisStats {
        parcels: parcel_stats(&matches.parcels, attributes),
        properties: property_stats(&matches.properties, attributes),
    }
}
