//! Error types for dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while turning input data into a feature collection.
///
/// Any of these aborts the whole load; the store is left untouched.
#[derive(Error, Debug)]
pub enum IngestError {
    /// The input could not be decoded as Parquet
    #[error("failed to read Parquet data: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Columns of a table disagree on the number of rows
    #[error("column '{column}' has {found} rows, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        found: usize,
    },

    /// A geometry cell could not be decoded
    #[error("invalid geometry at row {row}: {reason}")]
    Geometry { row: usize, reason: String },

    /// A non-empty parcel dataset must carry geometries
    #[error("dataset has no '{0}' column")]
    MissingGeometryColumn(String),

    /// A dataset file could not be read from disk
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for ingestion
pub type Result<T> = std::result::Result<T, IngestError>;
