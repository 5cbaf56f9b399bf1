//! A single feature collection (parcels or properties).

use geo::Geometry;
use hashbrown::HashSet;
use rstar::AABB;

use super::index::{finite_rect, RecordIndex};
use crate::ingest::{to_geojson, FeatureRecord, LoadBatch};
use crate::models::{AttrValue, Feature, GeoBounds, Properties, ValueKey};

static NULL_VALUE: AttrValue = AttrValue::Null;

/// Ordered records sharing a growing attribute universe.
///
/// Records only keep values for the columns known when they were loaded;
/// columns introduced by later loads read as null for them.
#[derive(Clone, Default)]
pub struct FeatureCollection {
    columns: Vec<String>,
    records: Vec<FeatureRecord>,
    index: RecordIndex,
}

impl FeatureCollection {
    /// Append a batch, preserving row order. Returns the number of rows added.
    pub fn append(&mut self, batch: LoadBatch) -> usize {
        let positions: Vec<usize> = batch
            .columns
            .iter()
            .map(|name| match self.column_index(name) {
                Some(idx) => idx,
                None => {
                    self.columns.push(name.clone());
                    self.columns.len() - 1
                }
            })
            .collect();

        let width = self.columns.len();
        let first_row = self.records.len();
        let added = batch.records.len();

        for record in batch.records {
            let mut attributes = vec![AttrValue::Null; width];
            for (value, &pos) in record.attributes.into_iter().zip(&positions) {
                attributes[pos] = value;
            }
            self.records.push(FeatureRecord {
                attributes,
                geometry: record.geometry,
            });
        }

        self.index.extend(
            first_row,
            self.records[first_row..].iter().map(|r| r.geometry.as_ref()),
        );

        added
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Attribute value at (`row`, `column`), null when the record predates the column
    pub fn value(&self, row: usize, column: usize) -> &AttrValue {
        self.records
            .get(row)
            .and_then(|r| r.attributes.get(column))
            .unwrap_or(&NULL_VALUE)
    }

    pub fn geometry(&self, row: usize) -> Option<&Geometry<f64>> {
        self.records.get(row).and_then(|r| r.geometry.as_ref())
    }

    /// Rows whose geometry envelope intersects `envelope`, in collection order
    pub fn candidates(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        self.index.candidates(envelope)
    }

    /// Number of records carrying a geometry
    pub fn with_geometry(&self) -> usize {
        self.records.iter().filter(|r| r.geometry.is_some()).count()
    }

    /// Number of distinct non-null values of `column` (0 if the column is unknown)
    pub fn distinct_values(&self, column: &str) -> usize {
        let Some(idx) = self.column_index(column) else {
            return 0;
        };
        (0..self.records.len())
            .map(|row| self.value(row, idx))
            .filter_map(AttrValue::key)
            .collect::<HashSet<ValueKey>>()
            .len()
    }

    /// Bounding box of every present geometry
    pub fn bounds(&self) -> Option<GeoBounds> {
        self.records
            .iter()
            .filter_map(|r| finite_rect(r.geometry.as_ref()?))
            .map(|rect| GeoBounds::new(rect.min().x, rect.min().y, rect.max().x, rect.max().y))
            .reduce(|acc, b| acc.union(&b))
    }

    /// Render a record as a portable feature
    pub fn feature(&self, row: usize) -> Feature {
        let properties = Properties::new(
            self.columns
                .iter()
                .enumerate()
                .map(|(idx, name)| (name.clone(), self.value(row, idx).clone()))
                .collect(),
        );
        Feature::new(properties, self.geometry(row).map(to_geojson))
    }
}
