//! Radius queries, exports and summaries over the feature store.

mod filter;
mod region;
mod stats;

pub use filter::{AttributeFilter, BoundFilter};
pub use region::{radius_degrees, SearchRegion, CIRCLE_SEGMENTS, METERS_PER_DEGREE};
pub use stats::{aggregate, AnalysisStats, Histogram, ParcelStats, PropertyStats};

use serde::Serialize;
use tracing::debug;

use crate::config::AttributeConfig;
use crate::models::{DatasetKind, Feature, FeatureCollectionExport, GeoBounds, GeoPoint, MatchSet};
use crate::store::{FeatureCollection, FeatureStore};

/// Record counts for one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub total: usize,
    #[serde(rename = "com_geometria")]
    pub with_geometry: usize,
    #[serde(rename = "bairros_unicos")]
    pub distinct_neighborhoods: usize,
}

/// Summaries of both collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    #[serde(rename = "lotes")]
    pub parcels: CollectionSummary,
    #[serde(rename = "imoveis")]
    pub properties: CollectionSummary,
}

/// The process-wide analysis engine
pub struct SpatialEngine {
    store: FeatureStore,
    attributes: AttributeConfig,
}

impl SpatialEngine {
    pub fn new(attributes: AttributeConfig) -> Self {
        Self {
            store: FeatureStore::new(),
            attributes,
        }
    }

    pub fn store(&self) -> &FeatureStore {
        &self.store
    }

    pub fn attributes(&self) -> &AttributeConfig {
        &self.attributes
    }

    /// Records of both collections intersecting the circle around `center`
    /// that pass `filters`, in collection order
    pub fn query_radius(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        filters: &AttributeFilter,
    ) -> MatchSet {
        let region = SearchRegion::circle(center, radius_meters);
        let snapshot = self.store.snapshot();

        let matches = MatchSet {
            parcels: select(snapshot.collection(DatasetKind::Parcels), &region, filters),
            properties: select(
                snapshot.collection(DatasetKind::Properties),
                &region,
                filters,
            ),
        };

        debug!(
            "Radius query at ({}, {}) r={}m: {} parcels, {} properties",
            center.lat,
            center.lon,
            radius_meters,
            matches.parcels.len(),
            matches.properties.len()
        );

        matches
    }

    /// Statistics over a match set
    pub fn aggregate(&self, matches: &MatchSet) -> AnalysisStats {
        aggregate(matches, &self.attributes)
    }

    /// Whole collection as a FeatureCollection, optionally restricted to one
    /// neighborhood and truncated to `limit` features (`0` means no cap)
    pub fn export(
        &self,
        kind: DatasetKind,
        neighborhood: Option<&str>,
        limit: usize,
    ) -> FeatureCollectionExport {
        let collection = self.store.collection(kind);
        let column = collection.column_index(&self.attributes.neighborhood);

        let rows = (0..collection.len()).filter(|&row| match neighborhood {
            Some(wanted) => column
                .and_then(|col| collection.value(row, col).as_str())
                .is_some_and(|v| v == wanted),
            None => true,
        });

        let features: Vec<Feature> = if limit == 0 {
            rows.map(|row| collection.feature(row)).collect()
        } else {
            rows.take(limit).map(|row| collection.feature(row)).collect()
        };

        FeatureCollectionExport::new(features)
    }

    /// Combined bounding box of all loaded geometries
    pub fn bounds(&self) -> Option<GeoBounds> {
        self.store.snapshot().bounds()
    }

    /// Record counts for both collections
    pub fn summary(&self) -> StoreSummary {
        let snapshot = self.store.snapshot();
        let summarize = |kind| {
            let collection = snapshot.collection(kind);
            CollectionSummary {
                total: collection.len(),
                with_geometry: collection.with_geometry(),
                distinct_neighborhoods: collection.distinct_values(&self.attributes.neighborhood),
            }
        };
        StoreSummary {
            parcels: summarize(DatasetKind::Parcels),
            properties: summarize(DatasetKind::Properties),
        }
    }
}

/// Exact region test over index candidates, then the attribute filter
fn select(
    collection: &FeatureCollection,
    region: &SearchRegion,
    filters: &AttributeFilter,
) -> Vec<Feature> {
    let filter = filters.bind(collection);
    collection
        .candidates(region.envelope())
        .into_iter()
        .filter(|&row| {
            collection
                .geometry(row)
                .is_some_and(|geometry| region.intersects(geometry))
        })
        .filter(|&row| filter.accepts(row))
        .map(|row| collection.feature(row))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Cell, Column, ColumnTable};
    use crate::models::AttrValue;
    use serde_json::json;

    const CENTER: GeoPoint = GeoPoint {
        lat: -20.3155,
        lon: -40.3128,
    };

    fn square(lon: f64, lat: f64, half: f64) -> Cell {
        Cell::Nested(json!({
            "type": "Polygon",
            "coordinates": [[
                [lon - half, lat - half],
                [lon + half, lat - half],
                [lon + half, lat + half],
                [lon - half, lat + half],
                [lon - half, lat - half]
            ]]
        }))
    }

    fn point(lon: f64, lat: f64) -> Cell {
        Cell::Str(json!({"type": "Point", "coordinates": [lon, lat]}).to_string())
    }

    fn text(s: &str) -> Cell {
        Cell::Str(s.to_string())
    }

    /// Two parcels inside a 500 m circle around CENTER, one outside
    fn engine_with_parcels() -> SpatialEngine {
        let engine = SpatialEngine::new(AttributeConfig::default());
        let table = ColumnTable::new(vec![
            Column::new("codLote", vec![text("L1"), text("L2"), text("L3")]),
            Column::new(
                "bairro",
                vec![text("Centro"), text("Centro"), text("Praia do Canto")],
            ),
            Column::new(
                "area_terreno",
                vec![Cell::Float(200.0), Cell::Float(300.0), Cell::Float(999.0)],
            ),
            Column::new(
                "geometry",
                vec![
                    square(CENTER.lon + 0.001, CENTER.lat, 0.0002),
                    square(CENTER.lon - 0.002, CENTER.lat + 0.001, 0.0002),
                    square(CENTER.lon + 0.05, CENTER.lat + 0.05, 0.0002),
                ],
            ),
        ])
        .unwrap();
        engine.store().load(DatasetKind::Parcels, table).unwrap();
        engine
    }

    fn codes(features: &[Feature]) -> Vec<String> {
        features
            .iter()
            .map(|f| f.properties.get("codLote").unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_radius_scenario() {
        let engine = engine_with_parcels();
        let matches = engine.query_radius(CENTER, 500.0, &AttributeFilter::new());
        assert_eq!(codes(&matches.parcels), vec!["L1", "L2"]);
        assert!(matches.properties.is_empty());

        let stats = engine.aggregate(&matches);
        assert_eq!(stats.parcels.area_mean, Some(250.0));
        assert_eq!(stats.parcels.area_total, Some(500.0));
        assert_eq!(stats.parcels.area_min, Some(200.0));
        assert_eq!(stats.parcels.area_max, Some(300.0));
        assert_eq!(stats.parcels.distinct_neighborhoods, Some(1));
    }

    #[test]
    fn test_empty_wkb_point_does_not_hide_matches() {
        use geo::point;

        let wkb = |x: f64, y: f64| {
            Cell::Bytes(wkb::geom_to_wkb(&geo::Geometry::Point(point!(x: x, y: y))).unwrap())
        };
        let engine = SpatialEngine::new(AttributeConfig::default());
        let table = ColumnTable::new(vec![
            Column::new(
                "codLote",
                vec![text("L1"), text("L2"), text("L3"), text("L4")],
            ),
            Column::new(
                "geometry",
                vec![
                    wkb(1.0, 1.0),
                    wkb(f64::NAN, f64::NAN),
                    wkb(2.0, 2.0),
                    wkb(3.0, 3.0),
                ],
            ),
        ])
        .unwrap();
        assert_eq!(engine.store().load(DatasetKind::Parcels, table).unwrap(), 4);

        let none = AttributeFilter::new();
        let matches = engine.query_radius(GeoPoint::new(1.0, 1.0), 1000.0, &none);
        assert_eq!(codes(&matches.parcels), vec!["L1"]);

        let matches = engine.query_radius(GeoPoint::new(3.0, 3.0), 0.0, &none);
        assert_eq!(codes(&matches.parcels), vec!["L4"]);

        assert_eq!(engine.bounds(), Some(GeoBounds::new(1.0, 1.0, 3.0, 3.0)));
        assert_eq!(engine.summary().parcels.with_geometry, 3);

        let export = engine.export(DatasetKind::Parcels, None, 0);
        assert!(export.features[1].geometry.is_none());
    }

    #[test]
    fn test_empty_store_yields_empty_matches() {
        let engine = SpatialEngine::new(AttributeConfig::default());
        let matches = engine.query_radius(CENTER, 1000.0, &AttributeFilter::new());
        assert!(matches.parcels.is_empty());
        assert!(matches.properties.is_empty());
    }

    #[test]
    fn test_no_parcels_matched_omits_area_keys() {
        let engine = engine_with_parcels();
        let far = GeoPoint::new(10.0, 10.0);
        let matches = engine.query_radius(far, 500.0, &AttributeFilter::new());
        let json = serde_json::to_value(engine.aggregate(&matches)).unwrap();
        assert_eq!(json["lotes"], json!({}));
    }

    #[test]
    fn test_filter_conjunction() {
        let engine = engine_with_parcels();

        let filters = AttributeFilter::new().with("bairro", "Centro");
        let matches = engine.query_radius(CENTER, 500.0, &filters);
        assert_eq!(codes(&matches.parcels), vec!["L1", "L2"]);

        let filters = AttributeFilter::new()
            .with("bairro", "Centro")
            .with("codLote", "L2");
        let matches = engine.query_radius(CENTER, 500.0, &filters);
        assert_eq!(codes(&matches.parcels), vec!["L2"]);
    }

    #[test]
    fn test_filter_cannot_pull_in_outside_records() {
        let engine = engine_with_parcels();
        let filters = AttributeFilter::new().with("bairro", "Praia do Canto");
        let matches = engine.query_radius(CENTER, 500.0, &filters);
        assert!(matches.parcels.is_empty());
    }

    #[test]
    fn test_properties_without_geometry_never_match() {
        let engine = SpatialEngine::new(AttributeConfig::default());
        let table = ColumnTable::new(vec![
            Column::new("empreendimento", vec![text("A"), text("B"), text("C")]),
            Column::new(
                "geometry",
                vec![point(CENTER.lon, CENTER.lat), Cell::Null, point(0.0, 0.0)],
            ),
        ])
        .unwrap();
        engine.store().load(DatasetKind::Properties, table).unwrap();

        let matches = engine.query_radius(CENTER, 0.0, &AttributeFilter::new());
        assert_eq!(matches.properties.len(), 1);
        assert_eq!(
            matches.properties[0].properties.get("empreendimento"),
            Some(&AttrValue::from("A"))
        );
    }

    #[test]
    fn test_results_keep_collection_order_across_loads() {
        let engine = SpatialEngine::new(AttributeConfig::default());
        for code in ["P1", "P2", "P3"] {
            let table = ColumnTable::new(vec![
                Column::new("codLote", vec![text(code)]),
                Column::new("geometry", vec![point(CENTER.lon, CENTER.lat)]),
            ])
            .unwrap();
            engine.store().load(DatasetKind::Parcels, table).unwrap();
        }
        let matches = engine.query_radius(CENTER, 10.0, &AttributeFilter::new());
        assert_eq!(codes(&matches.parcels), vec!["P1", "P2", "P3"]);
    }

    #[test]
    fn test_export_filter_and_limit() {
        let engine = engine_with_parcels();

        let all = engine.export(DatasetKind::Parcels, None, 1000);
        assert_eq!(all.features.len(), 3);

        let centro = engine.export(DatasetKind::Parcels, Some("Centro"), 1000);
        assert_eq!(codes(&centro.features), vec!["L1", "L2"]);

        let capped = engine.export(DatasetKind::Parcels, None, 2);
        assert_eq!(codes(&capped.features), vec!["L1", "L2"]);

        let uncapped = engine.export(DatasetKind::Parcels, None, 0);
        assert_eq!(uncapped.features.len(), 3);

        let json = serde_json::to_value(&engine.export(DatasetKind::Properties, None, 10)).unwrap();
        assert_eq!(json, json!({"type": "FeatureCollection", "features": []}));
    }

    #[test]
    fn test_export_round_trips_geometry() {
        let engine = SpatialEngine::new(AttributeConfig::default());
        let polygon = json!({
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]]
        });
        let table = ColumnTable::new(vec![Column::new(
            "geometry",
            vec![Cell::Str(polygon.to_string()), point(10.0, 20.0)],
        )])
        .unwrap();
        engine.store().load(DatasetKind::Parcels, table).unwrap();

        let export = serde_json::to_value(engine.export(DatasetKind::Parcels, None, 0)).unwrap();
        assert_eq!(export["features"][0]["geometry"], polygon);
        assert_eq!(
            export["features"][1]["geometry"],
            json!({"type": "Point", "coordinates": [10.0, 20.0]})
        );
    }

    #[test]
    fn test_bounds_and_summary() {
        let engine = SpatialEngine::new(AttributeConfig::default());
        assert!(engine.bounds().is_none());

        let table = ColumnTable::new(vec![
            Column::new("bairro", vec![text("Centro"), Cell::Null]),
            Column::new("geometry", vec![point(10.0, 20.0), Cell::Null]),
        ])
        .unwrap();
        engine.store().load(DatasetKind::Properties, table).unwrap();

        assert_eq!(engine.bounds(), Some(GeoBounds::new(10.0, 20.0, 10.0, 20.0)));

        let summary = engine.summary();
        assert_eq!(
            summary.properties,
            CollectionSummary {
                total: 2,
                with_geometry: 1,
                distinct_neighborhoods: 1,
            }
        );
        assert_eq!(summary.parcels.total, 0);
        assert_eq!(summary.parcels.distinct_neighborhoods, 0);
    }
}
