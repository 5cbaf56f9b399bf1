//! In-memory feature store for the parcel and property collections.
//!
//! Readers work on immutable snapshots: a query clones the current pair of
//! `Arc`s under a short shared lock and never blocks a load for its
//! duration. Loads decode outside the lock, then append copy-on-write under
//! exclusive access, so in-flight queries keep the snapshot they started with.

mod collection;
mod index;

pub use collection::FeatureCollection;
pub use index::{finite_rect, IndexedRecord, RecordIndex};

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use tracing::info;

use crate::error::{IngestError, Result};
use crate::ingest::{build_batch, read_parquet, ColumnTable, LoadBatch};
use crate::models::{DatasetKind, GeoBounds};

/// Point-in-time view of both collections
#[derive(Clone, Default)]
pub struct Snapshot {
    parcels: Arc<FeatureCollection>,
    properties: Arc<FeatureCollection>,
}

impl Snapshot {
    pub fn collection(&self, kind: DatasetKind) -> &FeatureCollection {
        match kind {
            DatasetKind::Parcels => &self.parcels,
            DatasetKind::Properties => &self.properties,
        }
    }

    /// Combined bounding box of every geometry in both collections
    pub fn bounds(&self) -> Option<GeoBounds> {
        DatasetKind::all()
            .iter()
            .filter_map(|kind| self.collection(*kind).bounds())
            .reduce(|acc, b| acc.union(&b))
    }

    fn collection_mut(&mut self, kind: DatasetKind) -> &mut FeatureCollection {
        match kind {
            DatasetKind::Parcels => Arc::make_mut(&mut self.parcels),
            DatasetKind::Properties => Arc::make_mut(&mut self.properties),
        }
    }
}

/// Outcome of a successful load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Rows added by this load (not the running total)
    pub records_count: usize,
    /// Column names of the dataset as given, geometry included
    pub columns: Vec<String>,
}

/// Holds both collections behind a read-write lock
#[derive(Default)]
pub struct FeatureStore {
    current: RwLock<Snapshot>,
}

impl FeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot of both collections
    pub fn snapshot(&self) -> Snapshot {
        self.current.read().clone()
    }

    /// Current state of one collection
    pub fn collection(&self, kind: DatasetKind) -> Arc<FeatureCollection> {
        let snapshot = self.current.read();
        match kind {
            DatasetKind::Parcels => Arc::clone(&snapshot.parcels),
            DatasetKind::Properties => Arc::clone(&snapshot.properties),
        }
    }

    /// Load a column table into `kind`. Returns the number of rows added.
    pub fn load(&self, kind: DatasetKind, table: ColumnTable) -> Result<usize> {
        let batch = build_batch(kind, table)?;
        Ok(self.append(kind, batch))
    }

    /// Append already-decoded rows to `kind`
    pub fn append(&self, kind: DatasetKind, batch: LoadBatch) -> usize {
        let mut current = self.current.write();
        let collection = current.collection_mut(kind);
        let added = collection.append(batch);
        info!(
            "Loaded {} {} records ({} total)",
            added,
            kind,
            collection.len()
        );
        added
    }

    /// Decode a Parquet file held in memory and load it into `kind`
    pub fn load_parquet(&self, kind: DatasetKind, data: Bytes) -> Result<LoadSummary> {
        let table = read_parquet(data)?;
        let columns = table.column_names();
        let records_count = self.load(kind, table)?;
        Ok(LoadSummary {
            records_count,
            columns,
        })
    }

    /// Read a Parquet file from disk and load it into `kind`
    pub fn load_file(&self, kind: DatasetKind, path: &Path) -> Result<LoadSummary> {
        let data = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Read {} ({} bytes) for {}", path.display(), data.len(), kind);
        self.load_parquet(kind, Bytes::from(data))
    }
}
