//! R-tree over record envelopes for fast candidate lookups.

use geo::{BoundingRect, Geometry, Rect};
use rstar::{RTree, RTreeObject, AABB};

/// Wrapper for R-tree indexing of a record geometry
#[derive(Clone, Debug)]
pub struct IndexedRecord {
    /// Position of the record in its collection
    pub row: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRecord {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Bounding rectangle of a geometry, `None` when empty or not finite
pub fn finite_rect(geometry: &Geometry<f64>) -> Option<Rect<f64>> {
    let rect = geometry.bounding_rect()?;
    let (min, max) = (rect.min(), rect.max());
    [min.x, min.y, max.x, max.y]
        .iter()
        .all(|v| v.is_finite())
        .then_some(rect)
}

impl IndexedRecord {
    /// Records whose geometry has no finite extent are not indexed
    pub fn new(row: usize, geometry: &Geometry<f64>) -> Option<Self> {
        let rect = finite_rect(geometry)?;
        Some(Self {
            row,
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        })
    }
}

/// Spatial index over the geometries of one collection
#[derive(Clone, Default)]
pub struct RecordIndex {
    tree: RTree<IndexedRecord>,
}

impl RecordIndex {
    /// Add records starting at `first_row`; bulk-loads when the index is empty
    pub fn extend<'a, I>(&mut self, first_row: usize, geometries: I)
    where
        I: IntoIterator<Item = Option<&'a Geometry<f64>>>,
    {
        let indexed: Vec<IndexedRecord> = geometries
            .into_iter()
            .enumerate()
            .filter_map(|(offset, geometry)| IndexedRecord::new(first_row + offset, geometry?))
            .collect();

        if self.tree.size() == 0 {
            self.tree = RTree::bulk_load(indexed);
        } else {
            for record in indexed {
                self.tree.insert(record);
            }
        }
    }

    /// Rows whose envelope intersects `envelope`, in collection order
    pub fn candidates(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut rows: Vec<usize> = self
            .tree
            .locate_in_envelope_intersecting(envelope)
            .map(|record| record.row)
            .collect();
        rows.sort_unstable();
        rows
    }

    /// Get total number of indexed records
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
