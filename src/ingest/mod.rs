//! Dataset ingestion: columnar input to feature records.
//!
//! Decoding and validation happen entirely here, before the store is
//! touched, so a failed load never leaves a half-appended collection.

mod columnar;
mod geometry;
mod table;

pub use geometry::{has_extent, resolve_cell, to_geojson, RawGeometry, GEOMETRY_COLUMN};
pub use columnar::read_parquet;
pub use table::{Cell, Column, ColumnTable};

#[cfg(test)]
pub(crate) use columnar::tests as parquet_fixtures;

use geo::Geometry;
use tracing::debug;

use crate::error::{IngestError, Result};
use crate::models::{AttrValue, DatasetKind};

/// A single decoded row
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    /// Values aligned with the owning collection's column list
    pub attributes: Vec<AttrValue>,
    pub geometry: Option<Geometry<f64>>,
}

/// Fully decoded rows, ready to be appended to a collection
#[derive(Debug, Clone, Default)]
pub struct LoadBatch {
    /// Attribute columns, in input order, without the geometry column
    pub columns: Vec<String>,
    pub records: Vec<FeatureRecord>,
}

impl LoadBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Turn a column table into records for `kind`.
///
/// Properties without a geometry column are simply uncoordinated; a
/// non-empty parcel dataset without one is rejected.
pub fn build_batch(kind: DatasetKind, table: ColumnTable) -> Result<LoadBatch> {
    let num_rows = table.num_rows();

    if kind == DatasetKind::Parcels && num_rows > 0 && !table.has_column(GEOMETRY_COLUMN) {
        return Err(IngestError::MissingGeometryColumn(
            GEOMETRY_COLUMN.to_string(),
        ));
    }

    let mut geometries: Vec<Option<Geometry<f64>>> = vec![None; num_rows];
    let mut columns = Vec::new();
    let mut attribute_cells = Vec::new();

    for column in table.into_columns() {
        if column.name == GEOMETRY_COLUMN {
            for (row, cell) in column.cells.iter().enumerate() {
                geometries[row] = resolve_cell(cell)
                    .map_err(|reason| IngestError::Geometry { row, reason })?;
            }
        } else {
            columns.push(column.name);
            attribute_cells.push(column.cells.into_iter());
        }
    }

    let records: Vec<FeatureRecord> = geometries
        .into_iter()
        .map(|geometry| FeatureRecord {
            attributes: attribute_cells
                .iter_mut()
                .map(|cells| cells.next().map(Cell::into_attr).unwrap_or_default())
                .collect(),
            geometry,
        })
        .collect();

    debug!(
        "Prepared {} {} records ({} with geometry)",
        records.len(),
        kind,
        records.iter().filter(|r| r.geometry.is_some()).count()
    );

    Ok(LoadBatch { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point_json(lon: f64, lat: f64) -> Cell {
        Cell::Str(json!({"type": "Point", "coordinates": [lon, lat]}).to_string())
    }

    #[test]
    fn test_geometry_column_split_from_attributes() {
        let table = ColumnTable::new(vec![
            Column::new("codLote", vec![Cell::Str("L1".into()), Cell::Str("L2".into())]),
            Column::new("geometry", vec![point_json(1.0, 2.0), Cell::Null]),
            Column::new("bairro", vec![Cell::Str("Centro".into()), Cell::Null]),
        ])
        .unwrap();

        let batch = build_batch(DatasetKind::Parcels, table).unwrap();
        assert_eq!(batch.columns, vec!["codLote", "bairro"]);
        assert_eq!(batch.len(), 2);
        assert!(batch.records[0].geometry.is_some());
        assert!(batch.records[1].geometry.is_none());
        assert_eq!(
            batch.records[0].attributes,
            vec![AttrValue::from("L1"), AttrValue::from("Centro")]
        );
        assert_eq!(batch.records[1].attributes[1], AttrValue::Null);
    }

    #[test]
    fn test_properties_without_geometry_column() {
        let table = ColumnTable::new(vec![Column::new(
            "empreendimento",
            vec![Cell::Str("Ed. Atlântico".into())],
        )])
        .unwrap();

        let batch = build_batch(DatasetKind::Properties, table).unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.records[0].geometry.is_none());
    }

    #[test]
    fn test_parcels_require_geometry_column() {
        let table = ColumnTable::new(vec![Column::new("codLote", vec![Cell::Str("L1".into())])])
            .unwrap();
        let result = build_batch(DatasetKind::Parcels, table);
        assert!(matches!(result, Err(IngestError::MissingGeometryColumn(_))));
    }

    #[test]
    fn test_empty_parcels_without_geometry_column() {
        let table = ColumnTable::new(vec![Column::new("codLote", vec![])]).unwrap();
        let batch = build_batch(DatasetKind::Parcels, table).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn test_bad_geometry_names_row() {
        let table = ColumnTable::new(vec![Column::new(
            "geometry",
            vec![point_json(0.0, 0.0), Cell::Str("{broken".into())],
        )])
        .unwrap();

        match build_batch(DatasetKind::Parcels, table) {
            Err(IngestError::Geometry { row, .. }) => assert_eq!(row, 1),
            other => panic!("expected geometry error, got {:?}", other),
        }
    }
}
