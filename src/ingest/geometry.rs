//! Geometry normalization for ingested rows.
//!
//! A geometry cell can arrive in three encodings. Each cell is tagged once
//! as a [`RawGeometry`] and resolved into a single `geo_types::Geometry<f64>`, so
//! nothing downstream ever branches on the source encoding again.

use geo::{BoundingRect, CoordsIter};
use geo_types::Geometry;

use super::table::Cell;

/// Name of the column holding record geometries
pub const GEOMETRY_COLUMN: &str = "geometry";

/// A geometry cell tagged by its encoding
#[derive(Debug, Clone, Copy)]
pub enum RawGeometry<'a> {
    /// Native binary geometry (WKB)
    Native(&'a [u8]),
    /// JSON-encoded GeoJSON geometry
    Json(&'a str),
    /// Mapping already shaped like a GeoJSON geometry
    Mapping(&'a serde_json::Value),
}

impl<'a> RawGeometry<'a> {
    /// Tag a cell. `Ok(None)` means the record has no geometry.
    pub fn from_cell(cell: &'a Cell) -> Result<Option<Self>, String> {
        match cell {
            Cell::Null | Cell::Nested(serde_json::Value::Null) => Ok(None),
            Cell::Bytes(b) => Ok(Some(RawGeometry::Native(b))),
            Cell::Str(s) => Ok(Some(RawGeometry::Json(s))),
            Cell::Nested(v) => Ok(Some(RawGeometry::Mapping(v))),
            Cell::Bool(_) | Cell::Int(_) | Cell::Float(_) => {
                Err("unexpected scalar in geometry column".to_string())
            }
        }
    }

    /// Decode into the canonical geometry representation
    pub fn resolve(self) -> Result<Geometry<f64>, String> {
        match self {
            RawGeometry::Native(mut bytes) => {
                wkb::wkb_to_geom(&mut bytes).map_err(|e| format!("invalid WKB: {:?}", e))
            }
            RawGeometry::Json(text) => {
                let geometry: geojson::Geometry = serde_json::from_str(text)
                    .map_err(|e| format!("invalid GeoJSON string: {}", e))?;
                from_geojson(geometry)
            }
            RawGeometry::Mapping(value) => {
                let geometry: geojson::Geometry = serde_json::from_value(value.clone())
                    .map_err(|e| format!("invalid GeoJSON mapping: {}", e))?;
                from_geojson(geometry)
            }
        }
    }
}

fn from_geojson(geometry: geojson::Geometry) -> Result<Geometry<f64>, String> {
    Geometry::<f64>::try_from(geometry).map_err(|e| format!("unsupported geometry: {}", e))
}

/// True when the geometry has at least one coordinate and all are finite.
///
/// Empty points are commonly written to WKB as `POINT(NaN NaN)`.
pub fn has_extent(geometry: &Geometry<f64>) -> bool {
    geometry.bounding_rect().is_some()
        && geometry
            .coords_iter()
            .all(|c| c.x.is_finite() && c.y.is_finite())
}

/// Resolve one cell of the geometry column. Empty geometries resolve to
/// absent.
pub fn resolve_cell(cell: &Cell) -> Result<Option<Geometry<f64>>, String> {
    match RawGeometry::from_cell(cell)? {
        Some(raw) => Ok(Some(raw.resolve()?).filter(has_extent)),
        None => Ok(None),
    }
}

/// Render a stored geometry in portable (GeoJSON) form
pub fn to_geojson(geometry: &Geometry<f64>) -> geojson::Geometry {
    geojson::Geometry::new(geojson::Value::from(geometry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};
    use serde_json::json;

    fn square() -> Geometry<f64> {
        Geometry::Polygon(polygon![
            (x: -40.31, y: -20.31),
            (x: -40.30, y: -20.31),
            (x: -40.30, y: -20.30),
            (x: -40.31, y: -20.30),
            (x: -40.31, y: -20.31),
        ])
    }

    #[test]
    fn test_three_encodings_agree() {
        let mapping = json!({
            "type": "Polygon",
            "coordinates": [[
                [-40.31, -20.31], [-40.30, -20.31], [-40.30, -20.30],
                [-40.31, -20.30], [-40.31, -20.31]
            ]]
        });
        let wkb = wkb::geom_to_wkb(&square()).unwrap();

        let from_json = resolve_cell(&Cell::Str(mapping.to_string())).unwrap();
        let from_mapping = resolve_cell(&Cell::Nested(mapping)).unwrap();
        let from_wkb = resolve_cell(&Cell::Bytes(wkb)).unwrap();

        assert_eq!(from_json, Some(square()));
        assert_eq!(from_mapping, Some(square()));
        assert_eq!(from_wkb, Some(square()));
    }

    #[test]
    fn test_null_cell_has_no_geometry() {
        assert_eq!(resolve_cell(&Cell::Null).unwrap(), None);
        assert_eq!(
            resolve_cell(&Cell::Nested(serde_json::Value::Null)).unwrap(),
            None
        );
    }

    #[test]
    fn test_empty_geometries_are_absent() {
        let nan_point = Geometry::Point(point!(x: f64::NAN, y: f64::NAN));
        let wkb = wkb::geom_to_wkb(&nan_point).unwrap();
        assert_eq!(resolve_cell(&Cell::Bytes(wkb)).unwrap(), None);

        let empty = json!({"type": "MultiPoint", "coordinates": []});
        assert_eq!(resolve_cell(&Cell::Nested(empty)).unwrap(), None);

        assert!(!has_extent(&nan_point));
        assert!(has_extent(&square()));
    }

    #[test]
    fn test_malformed_payloads_fail() {
        assert!(resolve_cell(&Cell::Str("not json".into())).is_err());
        assert!(resolve_cell(&Cell::Str(r#"{"type":"Point"}"#.into())).is_err());
        assert!(resolve_cell(&Cell::Bytes(vec![0x01, 0x02])).is_err());
        assert!(resolve_cell(&Cell::Float(1.0)).is_err());
    }

    #[test]
    fn test_point_round_trip() {
        let point = Geometry::Point(point!(x: 10.0, y: 20.0));
        let rendered = to_geojson(&point);
        assert_eq!(
            serde_json::to_value(&rendered).unwrap(),
            json!({"type": "Point", "coordinates": [10.0, 20.0]})
        );
        let back = resolve_cell(&Cell::Nested(serde_json::to_value(&rendered).unwrap())).unwrap();
        assert_eq!(back, Some(point));
    }
}
